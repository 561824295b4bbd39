use chrono::{Duration, NaiveDateTime};
use duetask::models::{format_deadline, parse_deadline};
use duetask::storage::StoreResult;
use duetask::{
    Highlight, SelectionError, SqliteTaskStore, StorageError, Task, TaskError, TaskInput,
    TaskManager, TaskStore, ValidationError,
};
use std::cell::Cell;
use std::rc::Rc;

fn now() -> NaiveDateTime {
    parse_deadline("2030-06-01 12:00").unwrap()
}

fn input(title: &str, category: &str, priority: u8, deadline: NaiveDateTime) -> TaskInput {
    TaskInput {
        title: title.into(),
        description: format!("{} notes", title),
        deadline: format_deadline(&deadline),
        category: category.into(),
        priority: priority.to_string(),
    }
}

fn fresh() -> TaskManager<SqliteTaskStore> {
    TaskManager::load(SqliteTaskStore::open_in_memory().unwrap()).unwrap()
}

fn titles<S: TaskStore>(m: &TaskManager<S>) -> Vec<&str> {
    m.tasks().iter().map(|t| t.title.as_str()).collect()
}

#[test]
fn added_task_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");

    let created = {
        let mut m = TaskManager::load(SqliteTaskStore::open(&path).unwrap()).unwrap();
        m.add_task(input("Write report", "Work", 2, now() + Duration::days(2)), now())
            .unwrap()
            .clone()
    };

    let reloaded = TaskManager::load(SqliteTaskStore::open(&path).unwrap()).unwrap();
    assert_eq!(reloaded.tasks(), &[created.clone()]);
    assert_eq!(created.description, "Write report notes");
    assert!(!created.completed);
}

#[test]
fn removed_task_is_gone_after_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");
    {
        let mut m = TaskManager::load(SqliteTaskStore::open(&path).unwrap()).unwrap();
        m.add_task(input("Keep", "Home", 3, now() + Duration::hours(3)), now()).unwrap();
        m.add_task(input("Drop", "Home", 3, now() + Duration::hours(4)), now()).unwrap();
        let removed = m.remove_task(Some(1)).unwrap();
        assert_eq!(removed.title, "Drop");
        assert_eq!(titles(&m), vec!["Keep"]);
    }

    let store = SqliteTaskStore::open(&path).unwrap();
    let all = store.load_all().unwrap();
    assert_eq!(all.len(), 1);
    assert!(all.iter().all(|t| t.title != "Drop"));
}

#[test]
fn remove_and_complete_need_a_valid_selection() {
    let mut m = fresh();
    assert!(matches!(
        m.remove_task(Some(0)),
        Err(TaskError::Selection(SelectionError::OutOfRange { index: 0, len: 0 }))
    ));
    assert!(matches!(
        m.mark_completed(None),
        Err(TaskError::Selection(SelectionError::NothingSelected))
    ));

    m.add_task(input("One", "Home", 1, now() + Duration::hours(2)), now()).unwrap();
    assert!(matches!(
        m.mark_completed(Some(5)),
        Err(TaskError::Selection(SelectionError::OutOfRange { index: 5, len: 1 }))
    ));
    assert!(!m.tasks()[0].completed);
}

#[test]
fn mark_completed_is_idempotent_and_keeps_order() {
    let mut m = fresh();
    m.add_task(input("A", "Home", 1, now() + Duration::hours(2)), now()).unwrap();
    m.add_task(input("B", "Home", 2, now() + Duration::hours(3)), now()).unwrap();

    m.mark_completed(Some(1)).unwrap();
    let again = m.mark_completed(Some(1)).unwrap();
    assert!(again.completed);
    assert_eq!(titles(&m), vec!["A", "B"]);
    assert!(!m.tasks()[0].completed);
}

#[test]
fn completion_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");
    {
        let mut m = TaskManager::load(SqliteTaskStore::open(&path).unwrap()).unwrap();
        m.add_task(input("Finish", "Work", 1, now() + Duration::hours(2)), now()).unwrap();
        m.mark_completed(Some(0)).unwrap();
    }
    let m = TaskManager::load(SqliteTaskStore::open(&path).unwrap()).unwrap();
    assert!(m.tasks()[0].completed);
}

#[test]
fn sorts_are_stable() {
    let mut m = fresh();
    let base = now() + Duration::days(1);
    m.add_task(input("p2-late", "X", 2, base + Duration::hours(5)), now()).unwrap();
    m.add_task(input("p1-late", "X", 1, base + Duration::hours(4)), now()).unwrap();
    m.add_task(input("p2-early", "X", 2, base + Duration::hours(1)), now()).unwrap();
    m.add_task(input("p1-early", "X", 1, base + Duration::hours(2)), now()).unwrap();
    m.add_task(input("p3", "X", 3, base), now()).unwrap();

    m.sort_by_priority();
    assert_eq!(titles(&m), vec!["p1-late", "p1-early", "p2-late", "p2-early", "p3"]);

    m.sort_by_deadline();
    assert_eq!(titles(&m), vec!["p3", "p2-early", "p1-early", "p1-late", "p2-late"]);

    m.sort_by_priority();
    assert_eq!(titles(&m), vec!["p1-early", "p1-late", "p2-early", "p2-late", "p3"]);
}

#[test]
fn sort_by_priority_puts_high_first() {
    let mut m = fresh();
    m.add_task(input("medium", "X", 2, now() + Duration::hours(2)), now()).unwrap();
    m.add_task(input("high", "X", 1, now() + Duration::hours(2)), now()).unwrap();
    m.sort_by_priority();
    let priorities: Vec<u8> = m.tasks().iter().map(|t| t.priority).collect();
    assert_eq!(priorities, vec![1, 2]);
}

#[test]
fn equal_deadlines_keep_relative_order() {
    let mut m = fresh();
    let due = now() + Duration::hours(6);
    m.add_task(input("first", "X", 3, due), now()).unwrap();
    m.add_task(input("second", "X", 1, due), now()).unwrap();
    m.sort_by_deadline();
    assert_eq!(titles(&m), vec!["first", "second"]);
}

#[test]
fn search_is_case_insensitive_over_three_fields() {
    let mut m = fresh();
    let due = now() + Duration::days(1);
    m.add_task(input("Pay bills", "Finance", 1, due), now()).unwrap();
    m.add_task(input("Gym", "Health", 2, due), now()).unwrap();
    let mut with_desc = input("Call mom", "Family", 3, due);
    with_desc.description = "Ask about the BILLS".into();
    m.add_task(with_desc, now()).unwrap();

    assert_eq!(m.search("").count(), 3);

    let hits: Vec<&str> = m.search("bIlL").map(|t| t.title.as_str()).collect();
    assert_eq!(hits, vec!["Pay bills", "Call mom"]);

    let hits: Vec<&str> = m.search("ealt").map(|t| t.title.as_str()).collect();
    assert_eq!(hits, vec!["Gym"]);

    assert_eq!(m.search("nothing like this").count(), 0);
    assert_eq!(m.len(), 3);
}

#[test]
fn search_can_be_restarted() {
    let mut m = fresh();
    m.add_task(input("alpha", "X", 1, now() + Duration::hours(2)), now()).unwrap();
    m.add_task(input("beta", "X", 1, now() + Duration::hours(2)), now()).unwrap();

    let search = m.search("a");
    let first: Vec<_> = search.clone().collect();
    let second: Vec<_> = search.collect();
    assert_eq!(first, second);

    let positions: Vec<usize> = m.search("beta").with_positions().map(|(i, _)| i).collect();
    assert_eq!(positions, vec![1]);
}

#[test]
fn pay_bills_scenario() {
    let mut m = fresh();
    m.add_task(input("Pay bills", "Finance", 1, now() + Duration::minutes(10)), now())
        .unwrap();

    let task = m.tasks()[0].clone();
    assert_eq!(m.presentation_for(&task, now()).highlight, Highlight::DueSoon);

    m.mark_completed(Some(0)).unwrap();
    let task = m.tasks()[0].clone();
    let p = m.presentation_for(&task, now());
    assert_eq!(p.highlight, Highlight::Done);
    assert!(p.text.starts_with("[✓] Pay bills (Finance, Priority: 1)"));
}

#[test]
fn past_deadline_is_rejected_and_nothing_stored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");
    let mut m = TaskManager::load(SqliteTaskStore::open(&path).unwrap()).unwrap();

    let err = m
        .add_task(input("Late", "Work", 1, now() - Duration::minutes(1)), now())
        .unwrap_err();
    assert!(matches!(err, TaskError::Validation(ValidationError::PastDeadline(_))));
    assert!(m.is_empty());

    let store = SqliteTaskStore::open(&path).unwrap();
    assert!(store.load_all().unwrap().is_empty());
}

#[test]
fn invalid_priority_is_rejected() {
    let mut m = fresh();
    let mut bad = input("T", "Work", 1, now() + Duration::hours(1));
    bad.priority = "0".into();
    assert!(matches!(
        m.add_task(bad, now()),
        Err(TaskError::Validation(ValidationError::InvalidPriority(p))) if p == "0"
    ));
    assert!(m.is_empty());
}

#[test]
fn reminders_fire_once_and_skip_completed() {
    let mut m = fresh();
    m.add_task(input("soon", "X", 1, now() + Duration::minutes(4)), now()).unwrap();
    m.add_task(input("later", "X", 1, now() + Duration::minutes(30)), now()).unwrap();
    m.add_task(input("done", "X", 1, now() + Duration::minutes(2)), now()).unwrap();
    m.mark_completed(Some(2)).unwrap();

    let fired = m.scan_reminders(now());
    let names: Vec<&str> = fired.iter().map(|r| r.task.title.as_str()).collect();
    assert_eq!(names, vec!["soon"]);
    assert_eq!(fired[0].message(), "Reminder: Task 'soon' is due soon!");
    assert!(m.tasks()[0].reminder_shown);

    assert!(m.scan_reminders(now()).is_empty());

    // "later" enters the window 25 minutes on, and is already overdue an hour on.
    let fired = m.scan_reminders(now() + Duration::minutes(25));
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].task.title, "later");
    assert!(m.scan_reminders(now() + Duration::hours(1)).is_empty());
}

#[test]
fn overdue_tasks_still_get_a_reminder() {
    let mut m = fresh();
    m.add_task(input("missed", "X", 2, now() + Duration::minutes(1)), now()).unwrap();
    let fired = m.scan_reminders(now() + Duration::hours(2));
    assert_eq!(fired.len(), 1);
}

#[test]
fn reminder_flag_is_not_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");
    {
        let mut m = TaskManager::load(SqliteTaskStore::open(&path).unwrap()).unwrap();
        m.add_task(input("soon", "X", 1, now() + Duration::minutes(3)), now()).unwrap();
        assert_eq!(m.scan_reminders(now()).len(), 1);
    }
    let mut m = TaskManager::load(SqliteTaskStore::open(&path).unwrap()).unwrap();
    assert!(!m.tasks()[0].reminder_shown);
    assert_eq!(m.scan_reminders(now()).len(), 1);
}

#[test]
fn duplicate_identities_are_handled_per_task() {
    let mut m = fresh();
    let due = now() + Duration::hours(2);
    m.add_task(input("Same", "X", 1, due), now()).unwrap();
    m.add_task(input("Same", "X", 2, due), now()).unwrap();

    m.mark_completed(Some(0)).unwrap();
    m.remove_task(Some(0)).unwrap();

    assert_eq!(m.len(), 1);
    assert_eq!(m.tasks()[0].priority, 2);
    assert!(!m.tasks()[0].completed);
}

/// Delegates to SQLite but can be told to fail every write.
struct FlakyStore {
    inner: SqliteTaskStore,
    fail: Rc<Cell<bool>>,
}

impl FlakyStore {
    fn check(&self) -> StoreResult<()> {
        if self.fail.get() {
            Err(StorageError::Corrupt("disk full".into()))
        } else {
            Ok(())
        }
    }
}

impl TaskStore for FlakyStore {
    fn initialize(&mut self) -> StoreResult<()> {
        self.inner.initialize()
    }
    fn load_all(&self) -> StoreResult<Vec<Task>> {
        self.inner.load_all()
    }
    fn insert(&mut self, task: &Task) -> StoreResult<i64> {
        self.check()?;
        self.inner.insert(task)
    }
    fn delete_by_identity(&mut self, title: &str, deadline: &NaiveDateTime) -> StoreResult<usize> {
        self.check()?;
        self.inner.delete_by_identity(title, deadline)
    }
    fn mark_completed(&mut self, title: &str, deadline: &NaiveDateTime) -> StoreResult<usize> {
        self.check()?;
        self.inner.mark_completed(title, deadline)
    }
    fn delete_by_id(&mut self, id: i64) -> StoreResult<usize> {
        self.check()?;
        self.inner.delete_by_id(id)
    }
    fn mark_completed_by_id(&mut self, id: i64) -> StoreResult<usize> {
        self.check()?;
        self.inner.mark_completed_by_id(id)
    }
}

#[test]
fn storage_failure_leaves_list_untouched() {
    let fail = Rc::new(Cell::new(false));
    let store = FlakyStore {
        inner: SqliteTaskStore::open_in_memory().unwrap(),
        fail: fail.clone(),
    };
    let mut m = TaskManager::load(store).unwrap();
    m.add_task(input("Stable", "X", 1, now() + Duration::hours(2)), now()).unwrap();

    fail.set(true);
    assert!(matches!(
        m.add_task(input("New", "X", 1, now() + Duration::hours(2)), now()),
        Err(TaskError::Storage(_))
    ));
    assert!(matches!(m.mark_completed(Some(0)), Err(TaskError::Storage(_))));
    assert!(matches!(m.remove_task(Some(0)), Err(TaskError::Storage(_))));

    assert_eq!(titles(&m), vec!["Stable"]);
    assert!(!m.tasks()[0].completed);
}

/// A store that hands out no row ids, so only identity operations apply.
struct IdentityOnlyStore {
    inner: SqliteTaskStore,
}

impl TaskStore for IdentityOnlyStore {
    fn initialize(&mut self) -> StoreResult<()> {
        self.inner.initialize()
    }
    fn load_all(&self) -> StoreResult<Vec<Task>> {
        let mut tasks = self.inner.load_all()?;
        for t in &mut tasks {
            t.id = None;
        }
        Ok(tasks)
    }
    fn insert(&mut self, task: &Task) -> StoreResult<i64> {
        self.inner.insert(task)
    }
    fn delete_by_identity(&mut self, title: &str, deadline: &NaiveDateTime) -> StoreResult<usize> {
        self.inner.delete_by_identity(title, deadline)
    }
    fn mark_completed(&mut self, title: &str, deadline: &NaiveDateTime) -> StoreResult<usize> {
        self.inner.mark_completed(title, deadline)
    }
    fn delete_by_id(&mut self, _id: i64) -> StoreResult<usize> {
        Err(StorageError::Corrupt("row ids are not supported".into()))
    }
    fn mark_completed_by_id(&mut self, _id: i64) -> StoreResult<usize> {
        Err(StorageError::Corrupt("row ids are not supported".into()))
    }
}

#[test]
fn tasks_without_ids_use_identity_operations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");
    {
        let mut m = TaskManager::load(SqliteTaskStore::open(&path).unwrap()).unwrap();
        m.add_task(input("Pay bills", "Finance", 1, now() + Duration::hours(2)), now()).unwrap();
        m.add_task(input("Gym", "Health", 2, now() + Duration::hours(3)), now()).unwrap();
    }

    let store = IdentityOnlyStore {
        inner: SqliteTaskStore::open(&path).unwrap(),
    };
    let mut m = TaskManager::load(store).unwrap();
    assert!(m.tasks().iter().all(|t| t.id.is_none()));

    m.mark_completed(Some(0)).unwrap();
    let removed = m.remove_task(Some(1)).unwrap();
    assert_eq!(removed.title, "Gym");

    let reloaded = TaskManager::load(SqliteTaskStore::open(&path).unwrap()).unwrap();
    assert_eq!(titles(&reloaded), vec!["Pay bills"]);
    assert!(reloaded.tasks()[0].completed);
}
