use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Text format used for deadlines, both on disk and in user input.
pub const DEADLINE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Lowest (most urgent) priority value.
pub const PRIORITY_HIGH: u8 = 1;
/// Highest (least urgent) priority value.
pub const PRIORITY_LOW: u8 = 3;

/// Represents a single task in the tracker.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Storage row id, assigned once the task has been persisted.
    #[serde(default)]
    pub id: Option<i64>,
    /// Short title. Together with `deadline` it forms the store identity.
    pub title: String,
    /// Free-form notes; empty when the user left it out.
    #[serde(default)]
    pub description: String,
    /// When the task is due, in local time with minute precision.
    #[serde(with = "deadline_serde")]
    pub deadline: NaiveDateTime,
    /// User-chosen grouping such as "Work" or "Finance".
    pub category: String,
    /// 1 = high, 2 = medium, 3 = low.
    pub priority: u8,
    /// Whether the task has been completed.
    #[serde(default)]
    pub completed: bool,
    /// Set once a reminder fired for this task. Never persisted.
    #[serde(skip)]
    pub reminder_shown: bool,
}

impl Task {
    /// Creates an active task that has not been stored yet.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        deadline: NaiveDateTime,
        category: impl Into<String>,
        priority: u8,
    ) -> Self {
        Task {
            id: None,
            title: title.into(),
            description: description.into(),
            deadline,
            category: category.into(),
            priority,
            completed: false,
            reminder_shown: false,
        }
    }

    /// Deadline rendered in [`DEADLINE_FORMAT`].
    pub fn deadline_text(&self) -> String {
        format_deadline(&self.deadline)
    }

    /// Case-insensitive substring match over title, description and category.
    ///
    /// `needle` must already be lowercase.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.category.to_lowercase().contains(needle)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.completed { "✓" } else { "✗" };
        write!(
            f,
            "[{}] {} ({}, Priority: {}) - {} (Deadline: {})",
            status,
            self.title,
            self.category,
            self.priority,
            self.description,
            self.deadline_text()
        )
    }
}

/// Raw, unvalidated fields collected by a front-end for a new task.
///
/// Everything is kept as text so that validation (and its error messages)
/// lives in one place, [`crate::manager::TaskManager::add_task`].
#[derive(Debug, Clone, Default)]
pub struct TaskInput {
    pub title: String,
    pub description: String,
    /// Expected as `YYYY-MM-DD HH:MM`.
    pub deadline: String,
    pub category: String,
    pub priority: String,
}

/// Formats a deadline the way it is stored.
pub fn format_deadline(deadline: &NaiveDateTime) -> String {
    deadline.format(DEADLINE_FORMAT).to_string()
}

/// Parses a deadline in [`DEADLINE_FORMAT`], tolerating surrounding whitespace.
pub fn parse_deadline(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text.trim(), DEADLINE_FORMAT)
}

/// Serde adapter that reads and writes deadlines in [`DEADLINE_FORMAT`].
mod deadline_serde {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(deadline: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_deadline(deadline))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_deadline(&text).map_err(de::Error::custom)
    }
}
