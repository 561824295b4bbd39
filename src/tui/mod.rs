pub mod app;
pub mod ui;

use std::time::Instant;
use std::io;

use chrono::Local;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::config::REMINDER_SCAN_INTERVAL;
use crate::manager::TaskManager;
use crate::storage::TaskStore;
use app::{App, InputMode};
use ui::ui;

pub fn run_tui<S: TaskStore>(manager: TaskManager<S>) -> io::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(manager);
    info!("event=tui_start module=tui status=ok tasks={}", app.manager.len());

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("event=tui_exit module=tui status=error error={}", err);
        return Err(err);
    }
    Ok(())
}

/// Event loop. Input is polled with a timeout so the reminder scan runs
/// every [`REMINDER_SCAN_INTERVAL`] on this same thread, between key presses.
fn run_app<B: Backend, S: TaskStore>(terminal: &mut Terminal<B>, app: &mut App<S>) -> io::Result<()> {
    let mut last_scan = Instant::now();
    loop {
        terminal.draw(|f| ui(f, app, Local::now().naive_local()))?;

        let timeout = REMINDER_SCAN_INTERVAL.saturating_sub(last_scan.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if !app.popups.is_empty() {
                    if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                        app.dismiss_popup();
                    }
                    continue;
                }
                match app.input_mode {
                    InputMode::Normal => match key.code {
                        KeyCode::Char('q') => return Ok(()),
                        KeyCode::Down | KeyCode::Char('j') => app.next(),
                        KeyCode::Up | KeyCode::Char('k') => app.previous(),
                        KeyCode::Char(' ') => app.complete_selected(),
                        KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
                        KeyCode::Char('a') => app.start_add(),
                        KeyCode::Char('/') => app.start_search(),
                        KeyCode::Char('p') => app.sort_by_priority(),
                        KeyCode::Char('t') => app.sort_by_deadline(),
                        KeyCode::Char('?') => app.show_about(),
                        _ => {}
                    },
                    InputMode::Adding | InputMode::Searching => match key.code {
                        KeyCode::Enter => app.handle_input(Local::now().naive_local()),
                        KeyCode::Esc => app.cancel_input(),
                        KeyCode::Char(c) => app.push_char(c),
                        KeyCode::Backspace => app.pop_char(),
                        _ => {}
                    },
                }
            }
        }

        if last_scan.elapsed() >= REMINDER_SCAN_INTERVAL {
            app.scan_reminders(Local::now().naive_local());
            last_scan = Instant::now();
        }
    }
}
