use chrono::NaiveDateTime;
use serde::Serialize;

use crate::config::{due_soon_window, reminder_window};
use crate::models::Task;

/// Display category for a task, evaluated against a reference time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Highlight {
    Done,
    Overdue,
    DueSoon,
    Normal,
}

impl Highlight {
    /// Picks the category for `task` at `now`.
    ///
    /// Precedence: done, then overdue, then due within the hour, then normal.
    pub fn classify(task: &Task, now: NaiveDateTime) -> Self {
        if task.completed {
            Highlight::Done
        } else if task.deadline < now {
            Highlight::Overdue
        } else if task.deadline - now <= due_soon_window() {
            Highlight::DueSoon
        } else {
            Highlight::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Highlight::Done => "done",
            Highlight::Overdue => "overdue",
            Highlight::DueSoon => "due-soon",
            Highlight::Normal => "normal",
        }
    }
}

impl std::fmt::Display for Highlight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a front-end needs to render one task row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    pub text: String,
    pub highlight: Highlight,
}

/// Derives the display string and highlight for `task` at `now`.
pub fn presentation_for(task: &Task, now: NaiveDateTime) -> Presentation {
    Presentation {
        text: task.to_string(),
        highlight: Highlight::classify(task, now),
    }
}

/// Whether a reminder is owed for `task` at `now`.
pub fn reminder_due(task: &Task, now: NaiveDateTime) -> bool {
    !task.completed && !task.reminder_shown && task.deadline - now <= reminder_window()
}

/// A reminder produced by a scan, one per task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub task: Task,
}

impl Reminder {
    /// Notification body shown to the user.
    pub fn message(&self) -> String {
        format!("Reminder: Task '{}' is due soon!", self.task.title)
    }
}
