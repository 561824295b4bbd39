//! Task tracking core: a SQLite-backed store, an in-memory manager that
//! mirrors it, and the CLI/TUI front-ends that drive the manager.

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod models;
pub mod presentation;
pub mod storage;
pub mod tui;

pub use error::{Field, SelectionError, StorageError, TaskError, TaskResult, ValidationError};
pub use manager::{Search, TaskManager};
pub use models::{Task, TaskInput};
pub use presentation::{presentation_for, Highlight, Presentation, Reminder};
pub use storage::{SqliteTaskStore, TaskStore};
