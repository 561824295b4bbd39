use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;

/// Default database file, relative to the working directory.
pub const DEFAULT_DB_FILE: &str = "tasks.db";
/// Default log level spec handed to `flexi_logger`.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// A task due within this window (and not overdue) is highlighted as due soon.
pub fn due_soon_window() -> TimeDelta {
    TimeDelta::hours(1)
}

/// A reminder fires once a task is due within this window.
pub fn reminder_window() -> TimeDelta {
    TimeDelta::minutes(5)
}

/// How often interactive front-ends run the reminder scan.
pub const REMINDER_SCAN_INTERVAL: Duration = Duration::from_secs(60);

/// Runtime settings resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl Config {
    /// Resolves settings from the environment.
    ///
    /// 1. `TASKS_DB` overrides the database path (default `./tasks.db`).
    /// 2. `DUETASK_LOG_DIR` overrides the log directory
    ///    (default `<data dir>/duetask/logs`, or `./logs`).
    /// 3. `DUETASK_LOG` overrides the log level (default `info`).
    pub fn from_env() -> Self {
        Config {
            db_path: std::env::var("TASKS_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_FILE)),
            log_dir: std::env::var("DUETASK_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_log_dir()),
            log_level: std::env::var("DUETASK_LOG")
                .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string()),
        }
    }
}

fn default_log_dir() -> PathBuf {
    match dirs::data_local_dir() {
        Some(mut p) => {
            p.push("duetask");
            p.push("logs");
            p
        }
        None => PathBuf::from("logs"),
    }
}
