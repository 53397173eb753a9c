//! mozbot-tui: Terminal presentation layer for the mozbot chat widget
//!
//! This crate renders a [`Session`] in a terminal:
//! - Launcher button anchored to the configured corner
//! - Chat panel with header, message log, typing indicator and input
//! - Key handling that drives the session's control surface
//!
//! The session never knows it is being drawn. The UI subscribes to its
//! events and redraws from snapshots.

mod app;
mod event;
pub mod input;
pub mod text;
pub mod theme;
#[cfg(test)]
pub mod test_utils;
pub mod widget;

pub use app::App;
pub use event::{key_to_action, Action, Event, EventHandler};
pub use mozbot_engine;
pub use widget::ChatWidget;

use crossterm::{
    cursor::Show as ShowCursor,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use mozbot_engine::Session;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use tokio::sync::broadcast::error::RecvError;

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), LeaveAlternateScreen, ShowCursor);
    }
}

/// Run the widget in the terminal until the user quits.
///
/// Must be called from within a tokio runtime.
pub async fn run_tui(session: Session) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session);

    // 4 Hz tick keeps the screen fresh after resizes
    let mut events = EventHandler::new(250);

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session_events = app.session().subscribe();

    loop {
        terminal.draw(|frame| {
            let area = frame.area();
            app.render(area, frame.buffer_mut());
        })?;

        if app.should_quit() {
            return Ok(());
        }

        tokio::select! {
            event = events.next() => match event {
                Some(Event::Key(key)) => app.handle_action(key_to_action(key)),
                Some(Event::Tick | Event::Resize(..)) => {}
                None => return Ok(()),
            },
            event = session_events.recv() => match event {
                Ok(event) => app.handle_session_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "session events lagged, resyncing");
                    app.refresh();
                }
                Err(RecvError::Closed) => return Ok(()),
            },
        }
    }
}
