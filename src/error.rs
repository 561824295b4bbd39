//! Error kinds surfaced by the store and the task manager.
//!
//! Each kind maps to a different user-facing outcome:
//! - [`ValidationError`]: bad input, nothing was applied.
//! - [`SelectionError`]: nothing (or nothing valid) was selected.
//! - [`StorageError`]: the database could not be read or written.

use thiserror::Error;

pub type TaskResult<T> = Result<T, TaskError>;

/// Input field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Category,
    Priority,
    Deadline,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Field::Title => "title",
            Field::Category => "category",
            Field::Priority => "priority",
            Field::Deadline => "deadline",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("please fill in the {0} field")]
    Missing(Field),
    #[error("priority must be 1, 2, or 3 (got '{0}')")]
    InvalidPriority(String),
    #[error("invalid deadline '{0}': use YYYY-MM-DD HH:MM")]
    InvalidDeadline(String),
    #[error("deadline {0} is not in the future")]
    PastDeadline(String),
}

impl ValidationError {
    /// The input field this error refers to.
    pub fn field(&self) -> Field {
        match self {
            Self::Missing(field) => *field,
            Self::InvalidPriority(_) => Field::Priority,
            Self::InvalidDeadline(_) | Self::PastDeadline(_) => Field::Deadline,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("please select a task")]
    NothingSelected,
    #[error("no task at position {index} (list has {len} tasks)")]
    OutOfRange { index: usize, len: usize },
    #[error("no task with id {0}")]
    UnknownId(i64),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt task record: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode tasks as JSON: {0}")]
    Encode(#[from] serde_json::Error),
}

impl TaskError {
    /// Short heading for dialogs and status lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Invalid input",
            Self::Selection(_) => "No selection",
            Self::Storage(_) => "Storage failure",
            Self::Io(_) => "Terminal failure",
            Self::Encode(_) => "Output failure",
        }
    }
}
