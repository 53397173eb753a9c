//! mozbot-engine: Conversation engine for the mozbot chat widget
//!
//! This crate provides the widget core, independent of any rendering:
//! - Widget configuration and the persisted site settings record
//! - The append-only message log and its state machine
//! - Canned keyword replies behind an injectable reply provider
//! - The [`Session`] handle with its event channel

pub mod chat;
pub mod config;
pub mod responder;
pub mod session;
pub mod settings;
pub mod state;

// Re-export commonly used types
pub use chat::{Message, MessageId, Sender};
pub use config::{ConfigError, Position, WidgetConfig};
pub use responder::{
    classify, classify_and_respond, reply_fn, CannedReplies, ReplyKind, ReplyProvider,
};
pub use session::{PendingReply, Session, SessionEvent, SubmitOutcome};
pub use settings::{SettingsError, SiteSettings};
pub use state::{ReplyPhase, SessionSnapshot, Visibility};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_version() {
        let version = engine_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }
}
