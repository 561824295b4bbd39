use chrono::NaiveDateTime;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::presentation::Highlight;
use crate::storage::TaskStore;
use super::app::{App, InputMode};

pub fn ui<S: TaskStore>(f: &mut Frame, app: &mut App<S>, now: NaiveDateTime) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Table
            Constraint::Length(3)  // Help
        ].as_ref())
        .split(f.area());

    let rows: Vec<Row> = app
        .visible_tasks()
        .map(|t| {
            let highlight = app.manager.presentation_for(t, now).highlight;
            Row::new(vec![
                Cell::from(t.id.map(|id| id.to_string()).unwrap_or_default()),
                Cell::from(t.title.clone()),
                Cell::from(t.category.clone()),
                Cell::from(t.priority.to_string()),
                Cell::from(t.deadline_text()),
                Cell::from(t.description.clone()),
                Cell::from(highlight.as_str()),
            ]).style(row_style(highlight))
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Min(20),
        Constraint::Length(12),
        Constraint::Length(4),
        Constraint::Length(17),
        Constraint::Min(20),
        Constraint::Length(9),
    ];

    let title = if app.search_query.is_empty() {
        "To-Do List".to_string()
    } else {
        format!("To-Do List - search: '{}'", app.search_query)
    };

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["ID", "Title", "Category", "Pri", "Deadline", "Description", "Status"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .bottom_margin(1))
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, chunks[0], &mut app.state);

    let help_text = match app.input_mode {
        InputMode::Normal => "q: Quit | a: Add | Space: Done | d: Remove | p: Sort Priority | t: Sort Deadline | /: Search | ?: About",
        InputMode::Adding => "Enter: Next Step | Esc: Cancel",
        InputMode::Searching => "Type to filter | Enter: Keep Filter | Esc: Clear",
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, chunks[1]);

    if app.input_mode != InputMode::Normal {
        let area = centered_rect(60, 3, f.area());
        f.render_widget(Clear, area);

        let prompt = match app.input_mode {
            InputMode::Adding => app.add_state.step.prompt(),
            _ => "Search",
        };
        let input = Paragraph::new(app.input_buffer.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(prompt));

        f.render_widget(input, area);
    }

    // Popups sit above everything, oldest first.
    if let Some(popup) = app.popups.front() {
        let text = format!("{}\n\n[Enter] OK", popup.body);
        let inner_width = centered_rect(50, 0, f.area()).width.saturating_sub(2);
        let height = wrapped_height(&text, inner_width).saturating_add(2).min(f.area().height);
        let area = centered_rect(50, height, f.area());
        f.render_widget(Clear, area);
        let body = Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(popup.title.as_str()));
        f.render_widget(body, area);
    }
}

fn row_style(highlight: Highlight) -> Style {
    match highlight {
        Highlight::Done => Style::default().fg(Color::Black).bg(Color::Rgb(196, 225, 196)),
        Highlight::Overdue => Style::default().fg(Color::Black).bg(Color::Rgb(211, 211, 211)),
        Highlight::DueSoon => Style::default().fg(Color::Black).bg(Color::Rgb(255, 204, 203)),
        Highlight::Normal => Style::default(),
    }
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let margin = r.height.saturating_sub(height) / 2;
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(height),
            Constraint::Length(margin),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}

/// Rows `text` takes when word-wrapped to `width` columns.
fn wrapped_height(text: &str, width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = text
        .split('\n')
        .map(|line| {
            let mut rows = 1;
            let mut used = 0;
            for word in line.split(' ') {
                let len = word.chars().count();
                if used > 0 && used + 1 + len <= width {
                    used += 1 + len;
                } else if used == 0 && len <= width {
                    used = len;
                } else {
                    if used > 0 {
                        rows += 1;
                    }
                    rows += len.saturating_sub(1) / width;
                    used = match len % width {
                        0 if len > 0 => width,
                        r => r,
                    };
                }
            }
            rows
        })
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}
