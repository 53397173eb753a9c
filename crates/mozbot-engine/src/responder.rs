//! Canned replies and the reply-provider seam.
//!
//! [`classify_and_respond`] is the keyword lookup the widget answers with.
//! Sessions do not call it directly: they go through a [`ReplyProvider`], so
//! the fixed thinking delay can be swapped for an instant or gated stub.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Which canned reply a message maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Greeting,
    Help,
    Pricing,
    Support,
    Generic,
}

impl ReplyKind {
    /// The fixed reply text.
    pub fn text(self) -> &'static str {
        match self {
            Self::Greeting => "Hello! I'm here to help you. What can I assist you with today?",
            Self::Help => {
                "I'd be happy to help! You can ask me about our products, services, or any questions you might have."
            }
            Self::Pricing => {
                "For pricing information, I'd recommend speaking with our sales team. Would you like me to connect you with them?"
            }
            Self::Support => {
                "I can help with basic support questions. For complex technical issues, I can escalate you to our support team."
            }
            Self::Generic => {
                "Thank you for your message! I'm processing your request. Is there anything specific I can help you with?"
            }
        }
    }
}

impl std::fmt::Display for ReplyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Greeting => write!(f, "greeting"),
            Self::Help => write!(f, "help"),
            Self::Pricing => write!(f, "pricing"),
            Self::Support => write!(f, "support"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// Keyword rules, checked in order. First match wins.
const RULES: [(ReplyKind, &[&str]); 4] = [
    (ReplyKind::Greeting, &["hello", "hi"]),
    (ReplyKind::Help, &["help"]),
    (ReplyKind::Pricing, &["price", "cost"]),
    (ReplyKind::Support, &["support"]),
];

/// Classify a message by case-insensitive substring match.
///
/// Plain substring matching means "this" counts as a greeting. That is the
/// widget's long-standing behavior and is kept as is.
pub fn classify(text: &str) -> ReplyKind {
    let lowered = text.to_lowercase();
    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map_or(ReplyKind::Generic, |(kind, _)| *kind)
}

/// The canned reply for a message.
pub fn classify_and_respond(text: &str) -> &'static str {
    classify(text).text()
}

/// Asynchronous source of bot replies.
#[async_trait]
pub trait ReplyProvider: Send + Sync {
    /// Produce the reply for an accepted user message.
    async fn reply(&self, text: &str) -> String;
}

/// Canned replies after a fixed thinking delay.
#[derive(Debug, Clone, Copy)]
pub struct CannedReplies {
    delay: Duration,
}

impl CannedReplies {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Canned replies with no delay.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl ReplyProvider for CannedReplies {
    async fn reply(&self, text: &str) -> String {
        let kind = classify(text);
        tracing::debug!(%kind, delay = ?self.delay, "canned reply scheduled");
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        kind.text().to_string()
    }
}

/// Provider backed by a closure, see [`reply_fn`].
pub struct FnReplies<F> {
    f: F,
}

impl<F> std::fmt::Debug for FnReplies<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnReplies").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> ReplyProvider for FnReplies<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = String> + Send + 'static,
{
    async fn reply(&self, text: &str) -> String {
        (self.f)(text.to_string()).await
    }
}

/// Wrap a closure returning a future as a [`ReplyProvider`].
pub fn reply_fn<F, Fut>(f: F) -> FnReplies<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = String> + Send + 'static,
{
    FnReplies { f }
}
