//! # duetask
//!
//! A personal task tracker with deadlines, priorities and reminders.
//! Quick entry from the CLI, interactive management in the TUI.
//!
//! ## Usage
//!
//! ```bash
//! # Open the interactive UI
//! duetask
//!
//! # Add a task
//! duetask add "Pay bills" --category Finance --priority 1 --due "2026-11-01 18:00"
//!
//! # List, sorted by deadline
//! duetask list --sort deadline
//!
//! # Search title, description and category
//! duetask search bills
//!
//! # Complete / remove by ID
//! duetask complete 3
//! duetask remove 3
//!
//! # Print reminders for tasks due within five minutes
//! duetask remind
//! ```
//!
//! ## Data Storage
//!
//! Tasks live in `tasks.db` (SQLite) in the working directory. Set `TASKS_DB`
//! to use another file. Logs are written under the local data directory
//! (`DUETASK_LOG_DIR` overrides it, `DUETASK_LOG` sets the level).
//!
//! ## Highlights
//!
//! *   **done**: completed, shown green.
//! *   **overdue**: deadline passed, shown grey.
//! *   **due-soon**: due within the hour, shown red.

use std::io;
use std::process::ExitCode;

use chrono::Local;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use log::error;

use duetask::commands::*;
use duetask::config::Config;
use duetask::logging::init_logging;
use duetask::tui::run_tui;
use duetask::{SqliteTaskStore, TaskError, TaskInput, TaskManager};

#[derive(Parser)]
#[command(name = "duetask")]
#[command(about = "Personal task tracker with reminders", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task title (quoted if it has spaces)
        title: String,
        /// Category, e.g. Work or Finance
        #[arg(short, long)]
        category: String,
        /// Priority: 1 = high, 2 = medium, 3 = low
        #[arg(short, long)]
        priority: String,
        /// Deadline in "YYYY-MM-DD HH:MM"
        #[arg(short, long)]
        due: String,
        /// Optional description
        #[arg(short = 'D', long, default_value = "")]
        description: String,
    },
    /// List tasks
    List {
        /// Sort before listing
        #[arg(short, long, value_enum)]
        sort: Option<SortKey>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Search title, description and category (case-insensitive)
    Search {
        query: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Mark a task as complete
    Complete {
        id: i64,
    },
    /// Remove a task
    Remove {
        id: i64,
    },
    /// Print reminders for tasks that are due within five minutes
    Remind,
    /// Show information about this program
    About,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Open interactive TUI
    Ui,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::from_env();

    // Completions and about need neither logging nor the database.
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "duetask", &mut io::stdout());
            return ExitCode::SUCCESS;
        }
        Some(Commands::About) => {
            cmd_about();
            return ExitCode::SUCCESS;
        }
        _ => {}
    }

    let _logger = match init_logging(&config.log_level, &config.log_dir) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Logging disabled: {}", e);
            None
        }
    };

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("event=command module=cli status=error error={}", e);
            eprintln!("{}: {}", e.kind(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Option<Commands>, config: &Config) -> Result<(), TaskError> {
    let store = SqliteTaskStore::open(&config.db_path)?;
    let mut manager = TaskManager::load(store)?;
    let now = Local::now().naive_local();

    match command {
        Some(Commands::Add { title, category, priority, due, description }) => {
            let input = TaskInput {
                title,
                description,
                deadline: due,
                category,
                priority,
            };
            cmd_add(&mut manager, input, now, false)?;
        }
        Some(Commands::List { sort, json }) => cmd_list(&mut manager, sort, json, now)?,
        Some(Commands::Search { query, json }) => cmd_search(&manager, &query, json, now)?,
        Some(Commands::Complete { id }) => cmd_complete(&mut manager, id, false)?,
        Some(Commands::Remove { id }) => cmd_remove(&mut manager, id, false)?,
        Some(Commands::Remind) => {
            cmd_remind(&mut manager, now);
        }
        Some(Commands::Ui) | None => run_tui(manager)?,
        Some(Commands::About) | Some(Commands::Completions { .. }) => {}
    }
    Ok(())
}
