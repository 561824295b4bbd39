//! In-memory task list kept in step with a [`TaskStore`].
//!
//! Every mutation writes to the store first and only touches the list once
//! the write succeeded, so a storage failure leaves the session unchanged.

use chrono::NaiveDateTime;
use log::{error, info};

use crate::error::{Field, SelectionError, TaskError, TaskResult, ValidationError};
use crate::models::{format_deadline, parse_deadline, Task, TaskInput, PRIORITY_HIGH, PRIORITY_LOW};
use crate::presentation::{presentation_for, reminder_due, Presentation, Reminder};
use crate::storage::TaskStore;

/// Owns the session's ordered task list and the store handle.
pub struct TaskManager<S: TaskStore> {
    store: S,
    tasks: Vec<Task>,
}

impl<S: TaskStore> TaskManager<S> {
    /// Initializes the store and loads every persisted task.
    pub fn load(mut store: S) -> TaskResult<Self> {
        store.initialize().map_err(|err| log_storage("initialize", err))?;
        let tasks = store.load_all().map_err(|err| log_storage("load_all", err))?;
        info!("event=load module=manager status=ok count={}", tasks.len());
        Ok(Self { store, tasks })
    }

    /// Tasks in the current display order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Current position of the task with this storage id.
    pub fn position_of(&self, id: i64) -> Result<usize, SelectionError> {
        self.tasks
            .iter()
            .position(|t| t.id == Some(id))
            .ok_or(SelectionError::UnknownId(id))
    }

    /// Validates `input`, persists the new task and appends it.
    ///
    /// `now` is the validation moment; the deadline must be strictly after it.
    pub fn add_task(&mut self, input: TaskInput, now: NaiveDateTime) -> TaskResult<&Task> {
        let mut task = validate(input, now)?;
        let id = self
            .store
            .insert(&task)
            .map_err(|err| log_storage("insert", err))?;
        task.id = Some(id);
        info!(
            "event=add_task module=manager status=ok id={} priority={} deadline={}",
            id,
            task.priority,
            task.deadline_text()
        );
        self.tasks.push(task);
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Removes the task at `index` from the store and the list.
    pub fn remove_task(&mut self, index: Option<usize>) -> TaskResult<Task> {
        let index = self.select(index)?;
        let task = &self.tasks[index];
        let deleted = match task.id {
            Some(id) => self.store.delete_by_id(id),
            None => self.store.delete_by_identity(&task.title, &task.deadline),
        };
        deleted.map_err(|err| log_storage("delete", err))?;
        let removed = self.tasks.remove(index);
        info!("event=remove_task module=manager status=ok id={:?}", removed.id);
        Ok(removed)
    }

    /// Marks the task at `index` completed. Calling it again is harmless.
    pub fn mark_completed(&mut self, index: Option<usize>) -> TaskResult<&Task> {
        let index = self.select(index)?;
        let task = &self.tasks[index];
        let updated = match task.id {
            Some(id) => self.store.mark_completed_by_id(id),
            None => self.store.mark_completed(&task.title, &task.deadline),
        };
        updated.map_err(|err| log_storage("mark_completed", err))?;
        let task = &mut self.tasks[index];
        task.completed = true;
        info!("event=complete_task module=manager status=ok id={:?}", task.id);
        Ok(&*task)
    }

    /// Stable sort, priority 1 first.
    pub fn sort_by_priority(&mut self) {
        self.tasks.sort_by_key(|t| t.priority);
    }

    /// Stable sort, earliest deadline first.
    pub fn sort_by_deadline(&mut self) {
        self.tasks.sort_by_key(|t| t.deadline);
    }

    /// Lazily yields tasks matching `query` in title, description or category,
    /// ignoring case. An empty query matches everything.
    pub fn search(&self, query: &str) -> Search<'_> {
        Search {
            inner: self.tasks.iter().enumerate(),
            needle: query.to_lowercase(),
        }
    }

    pub fn presentation_for(&self, task: &Task, now: NaiveDateTime) -> Presentation {
        presentation_for(task, now)
    }

    /// Collects reminders owed at `now` and flags each task so it never
    /// fires again. The caller decides how often to scan.
    pub fn scan_reminders(&mut self, now: NaiveDateTime) -> Vec<Reminder> {
        let mut fired = Vec::new();
        for task in self.tasks.iter_mut().filter(|t| reminder_due(t, now)) {
            task.reminder_shown = true;
            fired.push(Reminder { task: task.clone() });
        }
        if !fired.is_empty() {
            info!("event=scan_reminders module=manager status=ok fired={}", fired.len());
        }
        fired
    }

    fn select(&self, index: Option<usize>) -> Result<usize, SelectionError> {
        let index = index.ok_or(SelectionError::NothingSelected)?;
        if index >= self.tasks.len() {
            return Err(SelectionError::OutOfRange {
                index,
                len: self.tasks.len(),
            });
        }
        Ok(index)
    }
}

/// Iterator returned by [`TaskManager::search`]. Clone it to restart.
#[derive(Clone)]
pub struct Search<'a> {
    inner: std::iter::Enumerate<std::slice::Iter<'a, Task>>,
    needle: String,
}

impl<'a> Search<'a> {
    /// Yields each match together with its position in the task list.
    pub fn with_positions(self) -> impl Iterator<Item = (usize, &'a Task)> + Clone {
        let Search { inner, needle } = self;
        inner.filter(move |(_, t)| t.matches_lowercase(&needle))
    }
}

impl<'a> Iterator for Search<'a> {
    type Item = &'a Task;

    fn next(&mut self) -> Option<Self::Item> {
        let needle = &self.needle;
        self.inner
            .by_ref()
            .find(|(_, t)| t.matches_lowercase(needle))
            .map(|(_, t)| t)
    }
}

fn validate(input: TaskInput, now: NaiveDateTime) -> Result<Task, ValidationError> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(ValidationError::Missing(Field::Title));
    }
    let category = input.category.trim();
    if category.is_empty() {
        return Err(ValidationError::Missing(Field::Category));
    }
    let priority_text = input.priority.trim();
    if priority_text.is_empty() {
        return Err(ValidationError::Missing(Field::Priority));
    }
    let priority = match priority_text.parse::<u8>() {
        Ok(p) if (PRIORITY_HIGH..=PRIORITY_LOW).contains(&p) => p,
        _ => return Err(ValidationError::InvalidPriority(priority_text.to_string())),
    };
    if input.deadline.trim().is_empty() {
        return Err(ValidationError::Missing(Field::Deadline));
    }
    let deadline = parse_deadline(&input.deadline)
        .map_err(|_| ValidationError::InvalidDeadline(input.deadline.trim().to_string()))?;
    if deadline <= now {
        return Err(ValidationError::PastDeadline(format_deadline(&deadline)));
    }

    Ok(Task::new(
        title,
        input.description.trim(),
        deadline,
        category,
        priority,
    ))
}

fn log_storage(op: &str, err: crate::error::StorageError) -> TaskError {
    error!("event={} module=manager status=error error={}", op, err);
    TaskError::Storage(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        parse_deadline("2030-06-01 12:00").unwrap()
    }

    fn input(title: &str, deadline: &str, category: &str, priority: &str) -> TaskInput {
        TaskInput {
            title: title.into(),
            description: String::new(),
            deadline: deadline.into(),
            category: category.into(),
            priority: priority.into(),
        }
    }

    #[test]
    fn validation_reports_failing_field() {
        let cases = [
            (input("", "2030-06-02 12:00", "Home", "1"), Field::Title),
            (input("  ", "2030-06-02 12:00", "Home", "1"), Field::Title),
            (input("T", "2030-06-02 12:00", "", "1"), Field::Category),
            (input("T", "2030-06-02 12:00", "Home", ""), Field::Priority),
            (input("T", "2030-06-02 12:00", "Home", "4"), Field::Priority),
            (input("T", "2030-06-02 12:00", "Home", "high"), Field::Priority),
            (input("T", "", "Home", "2"), Field::Deadline),
            (input("T", "2030-06-02", "Home", "2"), Field::Deadline),
            (input("T", "2030-06-01 12:00", "Home", "2"), Field::Deadline),
        ];
        for (case, field) in cases {
            assert_eq!(validate(case, now()).unwrap_err().field(), field);
        }
    }

    #[test]
    fn deadline_equal_to_now_is_past() {
        let err = validate(input("T", "2030-06-01 12:00", "Home", "2"), now()).unwrap_err();
        assert!(matches!(err, ValidationError::PastDeadline(_)));
    }

    #[test]
    fn validation_trims_fields() {
        let t = validate(input(" Pay bills ", "2030-06-01 12:01", " Finance ", " 1 "), now()).unwrap();
        assert_eq!(t.title, "Pay bills");
        assert_eq!(t.category, "Finance");
        assert_eq!(t.priority, 1);
        assert!(!t.completed);
        assert!(!t.reminder_shown);
    }
}
