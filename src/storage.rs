//! Durable task storage.
//!
//! The on-disk shape is one SQLite table without a declared key:
//! `tasks(title, description, deadline, category, priority, completed)`.
//! Rows are addressed either by `(title, deadline)` or by SQLite's implicit
//! `rowid`, which is surfaced as [`Task::id`].

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDateTime;
use log::{debug, error, info};
use rusqlite::{params, Connection, Row};

use crate::error::StorageError;
use crate::models::{format_deadline, parse_deadline, Task, PRIORITY_HIGH, PRIORITY_LOW};

pub type StoreResult<T> = Result<T, StorageError>;

const SCHEMA_TASKS: &str = "CREATE TABLE IF NOT EXISTS tasks (
    title TEXT,
    description TEXT,
    deadline TEXT,
    category TEXT,
    priority INTEGER,
    completed INTEGER
)";
const SELECT_TASKS: &str =
    "SELECT rowid, title, description, deadline, category, priority, completed FROM tasks ORDER BY rowid";
const INSERT_TASK: &str = "INSERT INTO tasks (title, description, deadline, category, priority, completed)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
const DELETE_BY_IDENTITY: &str = "DELETE FROM tasks WHERE title = ?1 AND deadline = ?2";
const DELETE_BY_ID: &str = "DELETE FROM tasks WHERE rowid = ?1";
const COMPLETE_BY_IDENTITY: &str = "UPDATE tasks SET completed = 1 WHERE title = ?1 AND deadline = ?2";
const COMPLETE_BY_ID: &str = "UPDATE tasks SET completed = 1 WHERE rowid = ?1";

/// Persistence contract used by [`crate::manager::TaskManager`].
///
/// Every call commits on its own; there are no multi-call transactions.
pub trait TaskStore {
    /// Creates the backing table if it is missing. Safe to call repeatedly.
    fn initialize(&mut self) -> StoreResult<()>;
    /// Returns every stored task in insertion order.
    ///
    /// Stores without row ids leave `Task::id` as `None`; the manager then
    /// addresses those tasks by `(title, deadline)`.
    fn load_all(&self) -> StoreResult<Vec<Task>>;
    /// Appends one task and returns its row id.
    fn insert(&mut self, task: &Task) -> StoreResult<i64>;
    /// Removes every row with this identity. Returns how many went away.
    fn delete_by_identity(&mut self, title: &str, deadline: &NaiveDateTime) -> StoreResult<usize>;
    /// Sets `completed = 1` on every row with this identity.
    fn mark_completed(&mut self, title: &str, deadline: &NaiveDateTime) -> StoreResult<usize>;
    /// Removes the row with this id, if any.
    fn delete_by_id(&mut self, id: i64) -> StoreResult<usize>;
    /// Sets `completed = 1` on the row with this id, if any.
    fn mark_completed_by_id(&mut self, id: i64) -> StoreResult<usize>;
}

/// SQLite-backed task store.
pub struct SqliteTaskStore {
    conn: Connection,
}

impl SqliteTaskStore {
    /// Opens (or creates) the database file. Call [`TaskStore::initialize`]
    /// before use; [`crate::manager::TaskManager::load`] does so.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|err| {
            error!(
                "event=db_open module=storage status=error path={} error={}",
                path.display(),
                err
            );
            err
        })?;
        conn.busy_timeout(Duration::from_secs(5))?;
        info!("event=db_open module=storage status=ok path={}", path.display());
        Ok(Self { conn })
    }

    /// Opens a throwaway in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        debug!("event=db_open module=storage status=ok mode=memory");
        Ok(Self { conn })
    }
}

impl TaskStore for SqliteTaskStore {
    fn initialize(&mut self) -> StoreResult<()> {
        self.conn.execute(SCHEMA_TASKS, [])?;
        Ok(())
    }

    fn load_all(&self) -> StoreResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(SELECT_TASKS)?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(task_from_row(row)?);
        }
        debug!("event=load_all module=storage status=ok count={}", tasks.len());
        Ok(tasks)
    }

    fn insert(&mut self, task: &Task) -> StoreResult<i64> {
        self.conn.execute(
            INSERT_TASK,
            params![
                task.title,
                task.description,
                format_deadline(&task.deadline),
                task.category,
                task.priority,
                task.completed as i64,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn delete_by_identity(&mut self, title: &str, deadline: &NaiveDateTime) -> StoreResult<usize> {
        let n = self
            .conn
            .execute(DELETE_BY_IDENTITY, params![title, format_deadline(deadline)])?;
        Ok(n)
    }

    fn mark_completed(&mut self, title: &str, deadline: &NaiveDateTime) -> StoreResult<usize> {
        let n = self
            .conn
            .execute(COMPLETE_BY_IDENTITY, params![title, format_deadline(deadline)])?;
        Ok(n)
    }

    fn delete_by_id(&mut self, id: i64) -> StoreResult<usize> {
        Ok(self.conn.execute(DELETE_BY_ID, params![id])?)
    }

    fn mark_completed_by_id(&mut self, id: i64) -> StoreResult<usize> {
        Ok(self.conn.execute(COMPLETE_BY_ID, params![id])?)
    }
}

fn task_from_row(row: &Row<'_>) -> StoreResult<Task> {
    let id: i64 = row.get(0)?;
    let title: Option<String> = row.get(1)?;
    let description: Option<String> = row.get(2)?;
    let deadline_text: Option<String> = row.get(3)?;
    let category: Option<String> = row.get(4)?;
    let priority: Option<i64> = row.get(5)?;
    let completed: Option<i64> = row.get(6)?;

    let title = required_text(id, "title", title)?;
    let category = required_text(id, "category", category)?;
    let deadline_text = deadline_text
        .ok_or_else(|| StorageError::Corrupt(format!("row {id} has no deadline")))?;
    let deadline = parse_deadline(&deadline_text).map_err(|err| {
        StorageError::Corrupt(format!("row {id} has deadline '{deadline_text}': {err}"))
    })?;
    let priority = match priority {
        Some(p) if (PRIORITY_HIGH as i64..=PRIORITY_LOW as i64).contains(&p) => p as u8,
        other => {
            return Err(StorageError::Corrupt(format!(
                "row {id} has priority {other:?}"
            )))
        }
    };

    Ok(Task {
        id: Some(id),
        title,
        description: description.unwrap_or_default(),
        deadline,
        category,
        priority,
        completed: completed.unwrap_or(0) != 0,
        reminder_shown: false,
    })
}

/// Title and category are mandatory; a NULL or blank value is corruption.
fn required_text(id: i64, column: &str, value: Option<String>) -> StoreResult<String> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        other => Err(StorageError::Corrupt(format!("row {id} has {column} {other:?}"))),
    }
}
