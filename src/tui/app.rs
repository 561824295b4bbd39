use std::collections::VecDeque;

use chrono::NaiveDateTime;
use ratatui::widgets::TableState;

use crate::commands::ABOUT_TEXT;
use crate::error::{Field, TaskError};
use crate::manager::TaskManager;
use crate::models::{Task, TaskInput};
use crate::storage::TaskStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Adding,
    Searching,
}

/// Steps of the "Add Task" wizard, in prompt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddStep {
    #[default]
    Title,
    Description,
    Category,
    Priority,
    Deadline,
}

impl AddStep {
    fn next(self) -> Option<AddStep> {
        match self {
            AddStep::Title => Some(AddStep::Description),
            AddStep::Description => Some(AddStep::Category),
            AddStep::Category => Some(AddStep::Priority),
            AddStep::Priority => Some(AddStep::Deadline),
            AddStep::Deadline => None,
        }
    }

    fn for_field(field: Field) -> AddStep {
        match field {
            Field::Title => AddStep::Title,
            Field::Category => AddStep::Category,
            Field::Priority => AddStep::Priority,
            Field::Deadline => AddStep::Deadline,
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            AddStep::Title => "Add Task: Enter Title",
            AddStep::Description => "Add Task: Enter Description (Optional)",
            AddStep::Category => "Add Task: Enter Category",
            AddStep::Priority => "Add Task: Enter Priority (1=High, 2=Medium, 3=Low)",
            AddStep::Deadline => "Add Task: Enter Deadline (YYYY-MM-DD HH:MM)",
        }
    }
}

/// State for the multi-step "Add Task" wizard.
#[derive(Default)]
pub struct AddState {
    pub step: AddStep,
    pub input: TaskInput,
}

impl AddState {
    fn field_mut(&mut self) -> &mut String {
        match self.step {
            AddStep::Title => &mut self.input.title,
            AddStep::Description => &mut self.input.description,
            AddStep::Category => &mut self.input.category,
            AddStep::Priority => &mut self.input.priority,
            AddStep::Deadline => &mut self.input.deadline,
        }
    }
}

/// A modal message box: reminders, warnings, the about text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    pub title: String,
    pub body: String,
}

pub struct App<S: TaskStore> {
    pub manager: TaskManager<S>,
    /// Positions in `manager.tasks()` that are currently shown, in order.
    pub visible: Vec<usize>,
    pub state: TableState,
    pub input_mode: InputMode,
    pub input_buffer: String,
    pub search_query: String,
    pub add_state: AddState,
    pub popups: VecDeque<Popup>,
}

impl<S: TaskStore> App<S> {
    pub fn new(manager: TaskManager<S>) -> App<S> {
        let mut app = App {
            manager,
            visible: Vec::new(),
            state: TableState::default(),
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            search_query: String::new(),
            add_state: AddState::default(),
            popups: VecDeque::new(),
        };
        app.refresh();
        app
    }

    /// Recomputes the visible rows from the search filter and clamps the
    /// selection.
    pub fn refresh(&mut self) {
        self.visible = self
            .manager
            .search(&self.search_query)
            .with_positions()
            .map(|(i, _)| i)
            .collect();

        if self.visible.is_empty() {
            self.state.select(None);
        } else if let Some(i) = self.state.selected() {
            if i >= self.visible.len() {
                self.state.select(Some(self.visible.len() - 1));
            }
        } else {
            self.state.select(Some(0));
        }
    }

    /// Rows to draw, in display order.
    pub fn visible_tasks(&self) -> impl Iterator<Item = &Task> {
        self.visible.iter().filter_map(|&i| self.manager.get(i))
    }

    pub fn next(&mut self) {
        if self.visible.is_empty() { return; }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.visible.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.visible.is_empty() { return; }
        let i = match self.state.selected() {
            Some(0) | None => self.visible.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    /// Position in the manager's list of the highlighted row.
    fn selected_position(&self) -> Option<usize> {
        self.state
            .selected()
            .and_then(|row| self.visible.get(row).copied())
    }

    pub fn complete_selected(&mut self) {
        let selected = self.selected_position();
        let result = self.manager.mark_completed(selected).map(|_| ());
        if let Err(e) = result {
            self.report(e);
        }
        self.refresh();
    }

    pub fn delete_selected(&mut self) {
        let selected = self.selected_position();
        let result = self.manager.remove_task(selected).map(|_| ());
        if let Err(e) = result {
            self.report(e);
        }
        self.refresh();
    }

    pub fn sort_by_priority(&mut self) {
        self.manager.sort_by_priority();
        self.refresh();
    }

    pub fn sort_by_deadline(&mut self) {
        self.manager.sort_by_deadline();
        self.refresh();
    }

    pub fn start_add(&mut self) {
        self.input_mode = InputMode::Adding;
        self.add_state = AddState::default();
        self.input_buffer.clear();
    }

    pub fn start_search(&mut self) {
        self.input_mode = InputMode::Searching;
        self.input_buffer = self.search_query.clone();
    }

    pub fn push_char(&mut self, c: char) {
        self.input_buffer.push(c);
        self.sync_search();
    }

    pub fn pop_char(&mut self) {
        self.input_buffer.pop();
        self.sync_search();
    }

    /// Search filters live, on every keystroke.
    fn sync_search(&mut self) {
        if self.input_mode == InputMode::Searching {
            self.search_query = self.input_buffer.clone();
            self.refresh();
        }
    }

    pub fn cancel_input(&mut self) {
        if self.input_mode == InputMode::Searching {
            self.search_query.clear();
            self.refresh();
        }
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
    }

    /// Handles Enter in the current input mode.
    pub fn handle_input(&mut self, now: NaiveDateTime) {
        match self.input_mode {
            InputMode::Adding => self.handle_adding_input(now),
            InputMode::Searching => {
                self.input_mode = InputMode::Normal;
                self.input_buffer.clear();
            }
            InputMode::Normal => {}
        }
    }

    fn handle_adding_input(&mut self, now: NaiveDateTime) {
        *self.add_state.field_mut() = std::mem::take(&mut self.input_buffer);
        if let Some(step) = self.add_state.step.next() {
            self.add_state.step = step;
            self.input_buffer = self.add_state.field_mut().clone();
            return;
        }

        let result = self.manager.add_task(self.add_state.input.clone(), now).map(|_| ());
        match result {
            Ok(_) => {
                self.input_mode = InputMode::Normal;
                self.refresh();
            }
            Err(TaskError::Validation(e)) => {
                // Jump back to the offending field with its text prefilled.
                self.add_state.step = AddStep::for_field(e.field());
                self.input_buffer = self.add_state.field_mut().clone();
                self.report(TaskError::Validation(e));
            }
            Err(e) => {
                self.input_mode = InputMode::Normal;
                self.report(e);
            }
        }
    }

    /// Runs a reminder scan and queues one popup per reminder.
    pub fn scan_reminders(&mut self, now: NaiveDateTime) {
        for r in self.manager.scan_reminders(now) {
            self.popups.push_back(Popup {
                title: "Reminder".into(),
                body: r.message(),
            });
        }
    }

    pub fn show_about(&mut self) {
        self.popups.push_back(Popup {
            title: "About".into(),
            body: ABOUT_TEXT.into(),
        });
    }

    pub fn dismiss_popup(&mut self) {
        self.popups.pop_front();
    }

    fn report(&mut self, err: TaskError) {
        self.popups.push_back(Popup {
            title: err.kind().into(),
            body: err.to_string(),
        });
    }
}
