use std::io::{self, Write};

use chrono::NaiveDateTime;
use clap::ValueEnum;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use serde::Serialize;

use crate::error::TaskResult;
use crate::manager::TaskManager;
use crate::models::{Task, TaskInput};
use crate::presentation::{Highlight, Reminder};
use crate::storage::TaskStore;

pub const ABOUT_TEXT: &str = "This is a simple To-Do List application.\n\n\
You can add, remove, and manage your tasks efficiently.\n\
Developed to help you stay organized and productive!";

/// Order in which `list` shows tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    Priority,
    Deadline,
}

/// One row of JSON output: the task plus its highlight at render time.
#[derive(Serialize)]
struct TaskRow<'a> {
    #[serde(flatten)]
    task: &'a Task,
    highlight: Highlight,
}

/// Adds a new task and returns its id.
pub fn cmd_add<S: TaskStore>(
    manager: &mut TaskManager<S>,
    input: TaskInput,
    now: NaiveDateTime,
    silent: bool,
) -> TaskResult<i64> {
    let task = manager.add_task(input, now)?;
    let id = task.id.unwrap_or_default();
    if !silent {
        println!("Task added (id = {})", id);
    }
    Ok(id)
}

/// Prints all tasks, optionally sorted, as a table or JSON.
pub fn cmd_list<S: TaskStore>(
    manager: &mut TaskManager<S>,
    sort: Option<SortKey>,
    json: bool,
    now: NaiveDateTime,
) -> TaskResult<()> {
    match sort {
        Some(SortKey::Priority) => manager.sort_by_priority(),
        Some(SortKey::Deadline) => manager.sort_by_deadline(),
        None => {}
    }
    write_tasks(&mut io::stdout().lock(), manager.tasks().iter(), json, now)
}

/// Prints the tasks matching `query`.
pub fn cmd_search<S: TaskStore>(
    manager: &TaskManager<S>,
    query: &str,
    json: bool,
    now: NaiveDateTime,
) -> TaskResult<()> {
    write_tasks(&mut io::stdout().lock(), manager.search(query), json, now)
}

/// Marks the task with this id as completed.
pub fn cmd_complete<S: TaskStore>(manager: &mut TaskManager<S>, id: i64, silent: bool) -> TaskResult<()> {
    let index = manager.position_of(id)?;
    manager.mark_completed(Some(index))?;
    if !silent {
        println!("Task {} marked as complete.", id);
    }
    Ok(())
}

/// Removes the task with this id.
pub fn cmd_remove<S: TaskStore>(manager: &mut TaskManager<S>, id: i64, silent: bool) -> TaskResult<()> {
    let index = manager.position_of(id)?;
    manager.remove_task(Some(index))?;
    if !silent {
        println!("Task {} removed.", id);
    }
    Ok(())
}

/// Runs a single reminder scan and prints one line per reminder.
pub fn cmd_remind<S: TaskStore>(manager: &mut TaskManager<S>, now: NaiveDateTime) -> Vec<Reminder> {
    let reminders = manager.scan_reminders(now);
    if reminders.is_empty() {
        println!("No reminders.");
    }
    for r in &reminders {
        println!("{}", r.message());
    }
    reminders
}

pub fn cmd_about() {
    println!("{}", ABOUT_TEXT);
}

/// Writes tasks to `out` as a table or a JSON array. Encoding and write
/// failures are returned to the caller.
pub fn write_tasks<'a, W: Write>(
    out: &mut W,
    tasks: impl Iterator<Item = &'a Task>,
    json: bool,
    now: NaiveDateTime,
) -> TaskResult<()> {
    let tasks: Vec<&Task> = tasks.collect();
    if json {
        let rows: Vec<TaskRow> = tasks
            .into_iter()
            .map(|task| TaskRow {
                task,
                highlight: Highlight::classify(task, now),
            })
            .collect();
        serde_json::to_writer_pretty(&mut *out, &rows)?;
        writeln!(out)?;
        return Ok(());
    }

    if tasks.is_empty() {
        writeln!(out, "No tasks found.")?;
        return Ok(());
    }
    let table = task_table(tasks.into_iter(), now);
    writeln!(out, "{table}")?;
    Ok(())
}

/// Builds the table shown by `list` and `search`.
pub fn task_table<'a>(tasks: impl Iterator<Item = &'a Task>, now: NaiveDateTime) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Category").add_attribute(Attribute::Bold),
            Cell::new("Pri").add_attribute(Attribute::Bold),
            Cell::new("Deadline").add_attribute(Attribute::Bold),
            Cell::new("Description").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    for t in tasks {
        let highlight = Highlight::classify(t, now);
        let color = highlight_color(highlight);
        table.add_row(vec![
            Cell::new(t.id.map(|id| id.to_string()).unwrap_or_else(|| "-".into())),
            Cell::new(&t.title).fg(color),
            Cell::new(&t.category),
            Cell::new(t.priority),
            Cell::new(t.deadline_text()).fg(color),
            Cell::new(&t.description),
            Cell::new(highlight.as_str()).fg(color),
        ]);
    }
    table
}

fn highlight_color(highlight: Highlight) -> Color {
    match highlight {
        Highlight::Done => Color::Green,
        Highlight::Overdue => Color::DarkGrey,
        Highlight::DueSoon => Color::Red,
        Highlight::Normal => Color::Reset,
    }
}
