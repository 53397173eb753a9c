//! Session state machine.
//!
//! The widget state is two independent axes: the panel is [`Visibility::Open`]
//! or [`Visibility::Closed`], and the conversation is [`ReplyPhase::Idle`] or
//! [`ReplyPhase::AwaitingReply`]. Open/close only move the first axis,
//! submissions only move the second. [`SessionState`] is the synchronous core;
//! [`crate::session::Session`] wraps it with timers and notifications.

use crate::chat::{IdClock, Message, Sender};
use serde::{Deserialize, Serialize};

/// Whether the chat panel is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Closed,
    Open,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
        }
    }
}

/// Whether a bot reply is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReplyPhase {
    #[default]
    Idle,
    /// A reply is pending; the typing indicator is shown and sending is disabled.
    AwaitingReply,
}

impl std::fmt::Display for ReplyPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AwaitingReply => write!(f, "awaiting_reply"),
        }
    }
}

/// Why a submission was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Nothing left after trimming whitespace.
    Empty,
    /// A previous reply has not landed yet.
    Busy,
}

/// Point-in-time copy of a session, for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub visibility: Visibility,
    pub phase: ReplyPhase,
    pub messages: Vec<Message>,
}

impl SessionSnapshot {
    pub fn is_open(&self) -> bool {
        self.visibility == Visibility::Open
    }

    pub fn is_typing(&self) -> bool {
        self.phase == ReplyPhase::AwaitingReply
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Mutable state owned by one session.
///
/// The message log only ever grows.
#[derive(Debug)]
pub struct SessionState {
    visibility: Visibility,
    phase: ReplyPhase,
    messages: Vec<Message>,
    clock: IdClock,
}

impl SessionState {
    /// Create a closed, idle state whose log holds the welcome message.
    pub fn new(welcome_message: &str) -> Self {
        let mut clock = IdClock::new();
        let welcome = clock.message(Sender::Bot, welcome_message);
        Self {
            visibility: Visibility::Closed,
            phase: ReplyPhase::Idle,
            messages: vec![welcome],
            clock,
        }
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn phase(&self) -> ReplyPhase {
        self.phase
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_open(&self) -> bool {
        self.visibility == Visibility::Open
    }

    pub fn is_typing(&self) -> bool {
        self.phase == ReplyPhase::AwaitingReply
    }

    /// Show the panel. Returns `false` if it was already open.
    pub fn open(&mut self) -> bool {
        if self.is_open() {
            return false;
        }
        self.visibility = Visibility::Open;
        true
    }

    /// Hide the panel. Returns `false` if it was already closed.
    pub fn close(&mut self) -> bool {
        if !self.is_open() {
            return false;
        }
        self.visibility = Visibility::Closed;
        true
    }

    /// Accept a user message and enter [`ReplyPhase::AwaitingReply`].
    ///
    /// The appended message carries the trimmed text.
    pub fn submit(&mut self, text: &str) -> Result<Message, Rejection> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Rejection::Empty);
        }
        if self.is_typing() {
            return Err(Rejection::Busy);
        }
        let message = self.clock.message(Sender::User, text);
        self.messages.push(message.clone());
        self.phase = ReplyPhase::AwaitingReply;
        Ok(message)
    }

    /// Append the bot reply and return to [`ReplyPhase::Idle`].
    pub fn complete_reply(&mut self, reply: impl Into<String>) -> Message {
        let message = self.clock.message(Sender::Bot, reply);
        self.messages.push(message.clone());
        self.phase = ReplyPhase::Idle;
        message
    }

    /// Return to [`ReplyPhase::Idle`] without a bot message, for a reply that
    /// will never land. Returns `false` if no reply was pending.
    pub fn abandon_reply(&mut self) -> bool {
        if !self.is_typing() {
            return false;
        }
        self.phase = ReplyPhase::Idle;
        true
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            visibility: self.visibility,
            phase: self.phase,
            messages: self.messages.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_seeded() {
        let state = SessionState::new("Welcome!");
        assert_eq!(state.visibility(), Visibility::Closed);
        assert_eq!(state.phase(), ReplyPhase::Idle);
        assert_eq!(state.messages().len(), 1);
        assert!(state.messages()[0].is_bot());
        assert_eq!(state.messages()[0].text, "Welcome!");
    }

    #[test]
    fn test_open_close_lifecycle() {
        let mut state = SessionState::new("hi");
        assert!(state.open());
        assert!(!state.open());
        assert!(state.is_open());

        assert!(state.close());
        assert!(!state.close());
        assert!(!state.is_open());
    }

    #[test]
    fn test_submit_and_complete() {
        let mut state = SessionState::new("hi");
        let user = state.submit("  What is the price?  ").unwrap();
        assert!(user.is_user());
        assert_eq!(user.text, "What is the price?");
        assert!(state.is_typing());

        let bot = state.complete_reply("Talk to sales");
        assert!(bot.is_bot());
        assert!(bot.id > user.id);
        assert!(!state.is_typing());
        assert_eq!(state.messages().len(), 3);
    }

    #[test]
    fn test_submit_rejections() {
        let mut state = SessionState::new("hi");
        assert_eq!(state.submit(""), Err(Rejection::Empty));
        assert_eq!(state.submit(" \t\n "), Err(Rejection::Empty));
        assert_eq!(state.messages().len(), 1);
        assert!(!state.is_typing());

        state.submit("first").unwrap();
        assert_eq!(state.submit("second"), Err(Rejection::Busy));
        assert_eq!(state.messages().len(), 2);
    }

    #[test]
    fn test_abandon_reply_unblocks_submissions() {
        let mut state = SessionState::new("hi");
        assert!(!state.abandon_reply());

        state.submit("first").unwrap();
        assert!(state.abandon_reply());
        assert!(!state.is_typing());
        assert_eq!(state.messages().len(), 2);

        assert!(state.submit("second").is_ok());
        assert_eq!(state.messages().len(), 3);
    }

    #[test]
    fn test_axes_are_independent() {
        let mut state = SessionState::new("hi");
        state.submit("hello").unwrap();
        state.open();
        assert!(state.is_typing());
        state.close();
        assert!(state.is_typing());
        state.complete_reply("reply");
        assert!(!state.is_open());
        assert_eq!(state.phase(), ReplyPhase::Idle);
    }

    #[test]
    fn test_snapshot_copies_state() {
        let mut state = SessionState::new("hi");
        state.open();
        let snapshot = state.snapshot();
        assert!(snapshot.is_open());
        assert!(!snapshot.is_typing());
        assert_eq!(snapshot.last_message().map(|m| m.text.as_str()), Some("hi"));
        assert_eq!(ReplyPhase::AwaitingReply.to_string(), "awaiting_reply");
        assert_eq!(Visibility::Open.to_string(), "open");
    }
}
