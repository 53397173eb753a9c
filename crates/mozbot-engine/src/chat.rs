//! Message types for widget conversations.
//!
//! Messages are immutable once created. Identifiers are derived from the
//! creation timestamp and kept strictly increasing by [`IdClock`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Visitor typing into the widget.
    User,
    /// Canned responder.
    Bot,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Bot => write!(f, "bot"),
        }
    }
}

/// Message identifier: creation time in Unix milliseconds, bumped forward on
/// collision so that ids within a session are strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single message in the widget log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_bot(&self) -> bool {
        self.sender == Sender::Bot
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// Hands out monotonic message ids derived from the wall clock.
#[derive(Debug, Default)]
pub struct IdClock {
    last: Option<i64>,
}

impl IdClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a message stamped with the current time.
    pub fn message(&mut self, sender: Sender, text: impl Into<String>) -> Message {
        self.message_at(sender, text, Utc::now())
    }

    /// Create a message stamped with `now`.
    ///
    /// The id is `now` in milliseconds unless that would not exceed the last
    /// id handed out, in which case it is the last id plus one.
    pub fn message_at(
        &mut self,
        sender: Sender,
        text: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Message {
        let millis = now.timestamp_millis();
        let id = match self.last {
            Some(last) if millis <= last => last + 1,
            _ => millis,
        };
        self.last = Some(id);
        Message {
            id: MessageId(id),
            text: text.into(),
            sender,
            created_at: now,
        }
    }
}
