//! Application state for the mozbot TUI.
//!
//! [`App`] is the presentation side of a [`Session`]: it owns the input field
//! and focus, forwards key actions to the session, and keeps a snapshot that
//! is refreshed whenever the session publishes an event.

use crate::event::Action;
use crate::input::TextInputState;
use crate::widget::ChatWidget;
use mozbot_engine::{Session, SessionEvent, SessionSnapshot, SubmitOutcome};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

/// Presentation state for one widget session.
#[derive(Debug)]
pub struct App {
    session: Session,
    snapshot: SessionSnapshot,
    input: TextInputState,
    input_focused: bool,
    should_quit: bool,
}

impl App {
    pub fn new(session: Session) -> Self {
        let snapshot = session.snapshot();
        Self {
            session,
            snapshot,
            input: TextInputState::new(),
            input_focused: false,
            should_quit: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }

    pub fn input(&self) -> &TextInputState {
        &self.input
    }

    pub fn input_focused(&self) -> bool {
        self.input_focused
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Whether the send control is enabled.
    pub fn can_send(&self) -> bool {
        self.snapshot.is_open() && !self.snapshot.is_typing()
    }

    /// Re-read the session state.
    pub fn refresh(&mut self) {
        self.snapshot = self.session.snapshot();
    }

    pub fn handle_session_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::FocusInput => self.input_focused = true,
            SessionEvent::Closed => self.input_focused = false,
            SessionEvent::Opened
            | SessionEvent::MessageAppended(_)
            | SessionEvent::TypingChanged(_) => {}
        }
        self.refresh();
    }

    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Toggle => self.session.toggle(),
            Action::Close => self.session.close(),
            Action::Submit => self.submit(),
            _ if !self.snapshot.is_open() => {}
            Action::Insert(ch) => self.input.insert(ch),
            Action::Backspace => self.input.backspace(),
            Action::Delete => self.input.delete(),
            Action::Left => self.input.move_left(),
            Action::Right => self.input.move_right(),
            Action::Home => self.input.move_home(),
            Action::End => self.input.move_end(),
            Action::HistoryPrev => self.input.history_prev(),
            Action::HistoryNext => self.input.history_next(),
            Action::None => {}
        }
        self.refresh();
    }

    /// Send the input field. The field is cleared only if the session
    /// accepted the message.
    fn submit(&mut self) {
        if !self.can_send() {
            return;
        }
        match self.session.send_message(self.input.content()) {
            SubmitOutcome::Accepted(_) => {
                self.input.submit();
            }
            SubmitOutcome::Empty | SubmitOutcome::Busy => {}
        }
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        ChatWidget::new(self.session.config(), &self.snapshot, &self.input)
            .input_focused(self.input_focused)
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::buffer_to_string;
    use mozbot_engine::{CannedReplies, ReplyKind, WidgetConfig};
    use std::time::Duration;

    fn app_with_delay(delay: Duration) -> App {
        let session =
            Session::with_provider(WidgetConfig::default(), CannedReplies::new(delay)).unwrap();
        App::new(session)
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_action(Action::Insert(ch));
        }
    }

    #[tokio::test]
    async fn test_keys_ignored_while_closed() {
        let mut app = app_with_delay(Duration::ZERO);
        type_text(&mut app, "hi");
        assert!(app.input().is_empty());

        app.handle_action(Action::Toggle);
        assert!(app.snapshot().is_open());
        type_text(&mut app, "hi");
        assert_eq!(app.input().content(), "hi");
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_clears_input_and_disables_send() {
        let mut app = app_with_delay(Duration::from_millis(1500));
        let mut events = app.session().subscribe();
        app.handle_action(Action::Toggle);
        type_text(&mut app, "I need support");

        app.handle_action(Action::Submit);
        assert!(app.input().is_empty());
        assert!(app.snapshot().is_typing());
        assert!(!app.can_send());
        assert_eq!(app.snapshot().messages.len(), 2);

        // Send is disabled until the reply lands.
        type_text(&mut app, "again");
        app.handle_action(Action::Submit);
        assert_eq!(app.input().content(), "again");

        loop {
            let event = events.recv().await.unwrap();
            app.handle_session_event(&event);
            if event == SessionEvent::TypingChanged(false) {
                let event = events.recv().await.unwrap();
                app.handle_session_event(&event);
                break;
            }
        }
        assert!(app.can_send());
        let messages = &app.snapshot().messages;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].text, ReplyKind::Support.text());
    }

    #[tokio::test]
    async fn test_blank_submit_keeps_input() {
        let mut app = app_with_delay(Duration::ZERO);
        app.handle_action(Action::Toggle);
        type_text(&mut app, "   ");
        app.handle_action(Action::Submit);
        assert_eq!(app.input().content(), "   ");
        assert_eq!(app.snapshot().messages.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_follows_session_events() {
        let mut app = app_with_delay(Duration::ZERO);
        let mut events = app.session().subscribe();
        app.handle_action(Action::Toggle);
        assert!(!app.input_focused());

        let opened = events.recv().await.unwrap();
        app.handle_session_event(&opened);
        let focus = events.recv().await.unwrap();
        assert_eq!(focus, SessionEvent::FocusInput);
        app.handle_session_event(&focus);
        assert!(app.input_focused());

        app.handle_action(Action::Close);
        let closed = events.recv().await.unwrap();
        app.handle_session_event(&closed);
        assert!(!app.input_focused());
    }

    #[tokio::test]
    async fn test_quit_and_render() {
        let mut app = app_with_delay(Duration::ZERO);
        app.handle_action(Action::Toggle);

        let area = Rect::new(0, 0, 80, 30);
        let mut buf = Buffer::empty(area);
        app.render(area, &mut buf);
        let screen = buffer_to_string(&buf);
        assert!(screen.contains("Hello! How can I help you today?"));

        app.handle_action(Action::Quit);
        assert!(app.should_quit());
    }
}
