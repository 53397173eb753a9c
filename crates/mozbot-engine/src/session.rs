//! Widget conversation session.
//!
//! A [`Session`] is the runtime state of one embedded widget: the open flag,
//! the append-only message log and the typing flag. It is a cheap, clonable
//! handle, so the host and any presentation layer can each hold one.
//!
//! Replies come from an injected [`ReplyProvider`] and run on a spawned tokio
//! task, or on a dedicated thread when no runtime is current. Nothing cancels
//! them: closing the panel or dropping every handle still lets the pending
//! reply land in the log. A reply task that dies without an answer (a
//! panicking provider, a runtime shutting down) returns the session to idle.
//!
//! Observers subscribe to [`SessionEvent`]s and pull a [`SessionSnapshot`]
//! when they need to redraw.

use crate::chat::Message;
use crate::config::{ConfigError, WidgetConfig};
use crate::responder::{CannedReplies, ReplyProvider};
use crate::state::{Rejection, SessionSnapshot, SessionState};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Capacity of the event channel. Slow observers see `Lagged` and should
/// resync from a snapshot.
const EVENT_CAPACITY: usize = 64;

/// Notifications published by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The panel was shown.
    Opened,
    /// The panel was hidden.
    Closed,
    /// A message was appended to the log.
    MessageAppended(Message),
    /// The typing indicator was shown or hidden.
    TypingChanged(bool),
    /// The entrance animation settled; focus the input field.
    FocusInput,
}

/// Result of [`Session::send_message`].
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The user message was appended and a reply is on its way.
    Accepted(PendingReply),
    /// The text was empty after trimming. Nothing changed.
    Empty,
    /// A reply is still pending. Nothing changed.
    Busy,
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// The pending reply, if the submission was accepted.
    pub fn into_pending(self) -> Option<PendingReply> {
        match self {
            Self::Accepted(pending) => Some(pending),
            Self::Empty | Self::Busy => None,
        }
    }
}

/// Handle to a reply that has been scheduled.
///
/// Dropping it does not cancel the reply.
#[derive(Debug)]
pub struct PendingReply {
    user_message: Message,
    reply_rx: oneshot::Receiver<Message>,
}

impl PendingReply {
    /// The user message that triggered this reply.
    pub fn user_message(&self) -> &Message {
        &self.user_message
    }

    /// Wait for the bot message to be appended.
    ///
    /// Returns `None` if the reply task died without an answer. The session
    /// is back to idle by then.
    pub async fn wait(self) -> Option<Message> {
        self.reply_rx.await.ok()
    }
}

/// Owned by a reply task. Dropped without [`ReplyGuard::complete`], it takes
/// the session out of `AwaitingReply`.
struct ReplyGuard {
    session: Session,
    reply_tx: Option<oneshot::Sender<Message>>,
}

impl ReplyGuard {
    fn complete(mut self, text: String) {
        let message = self.session.complete_reply(text);
        if let Some(tx) = self.reply_tx.take() {
            // The pending handle may have been dropped.
            let _ = tx.send(message);
        }
    }
}

impl Drop for ReplyGuard {
    fn drop(&mut self) {
        if self.reply_tx.is_some() {
            self.session.abandon_reply();
        }
    }
}

struct Inner {
    id: Uuid,
    config: WidgetConfig,
    provider: Arc<dyn ReplyProvider>,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

/// Runtime state of one embedded chat widget.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.inner.id)
            .field("state", &*self.state())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session that answers with canned replies after the
    /// configured thinking delay.
    pub fn new(config: WidgetConfig) -> Result<Self, ConfigError> {
        let provider = CannedReplies::new(config.reply_delay());
        Self::with_provider(config, provider)
    }

    /// Create a session with a custom reply provider.
    ///
    /// The configuration is validated here and never again.
    pub fn with_provider(
        config: WidgetConfig,
        provider: impl ReplyProvider + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let id = Uuid::new_v4();
        let state = SessionState::new(&config.welcome_message);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        info!(
            session_id = %id,
            bot = %config.bot_name,
            position = %config.position,
            "widget session created"
        );
        Ok(Self {
            inner: Arc::new(Inner {
                id,
                config,
                provider: Arc::new(provider),
                state: Mutex::new(state),
                events,
            }),
        })
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.inner.config
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state().snapshot()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state().messages().to_vec()
    }

    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// Whether a reply is in flight (typing indicator shown, send disabled).
    pub fn is_typing(&self) -> bool {
        self.state().is_typing()
    }

    /// Show the panel. Does nothing if it is already open.
    ///
    /// Once the focus delay has passed, a [`SessionEvent::FocusInput`] is
    /// published if the panel is still open. Outside a tokio runtime the
    /// focus request is published immediately.
    pub fn open(&self) {
        {
            let mut state = self.state();
            if !state.open() {
                return;
            }
            self.emit(SessionEvent::Opened);
        }
        debug!(session_id = %self.inner.id, "widget opened");

        let delay = self.inner.config.focus_delay();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) if !delay.is_zero() => {
                let session = self.clone();
                runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    session.request_focus();
                });
            }
            _ => self.request_focus(),
        }
    }

    /// Hide the panel. Idempotent.
    pub fn close(&self) {
        let mut state = self.state();
        if state.close() {
            self.emit(SessionEvent::Closed);
            debug!(session_id = %self.inner.id, "widget closed");
        }
    }

    pub fn toggle(&self) {
        if self.is_open() {
            self.close();
        } else {
            self.open();
        }
    }

    /// Submit a user message.
    ///
    /// Empty or whitespace-only text is ignored, as is any submission while a
    /// reply is still pending. Otherwise the trimmed text is appended as a
    /// user message at once and the bot reply is scheduled.
    pub fn send_message(&self, text: &str) -> SubmitOutcome {
        let user_message = {
            let mut state = self.state();
            match state.submit(text) {
                Ok(message) => {
                    self.emit(SessionEvent::MessageAppended(message.clone()));
                    self.emit(SessionEvent::TypingChanged(true));
                    message
                }
                Err(Rejection::Empty) => return SubmitOutcome::Empty,
                Err(Rejection::Busy) => {
                    debug!(session_id = %self.inner.id, "submission ignored while awaiting reply");
                    return SubmitOutcome::Busy;
                }
            }
        };
        debug!(session_id = %self.inner.id, message_id = %user_message.id, "user message accepted");

        let (reply_tx, reply_rx) = oneshot::channel();
        let guard = ReplyGuard {
            session: self.clone(),
            reply_tx: Some(reply_tx),
        };
        let provider = Arc::clone(&self.inner.provider);
        let text = user_message.text.clone();
        self.spawn_reply(async move {
            let reply = provider.reply(&text).await;
            guard.complete(reply);
        });

        SubmitOutcome::Accepted(PendingReply {
            user_message,
            reply_rx,
        })
    }

    /// Run a reply task on the current runtime, or on its own thread when
    /// there is none. A task that cannot be started is dropped, which
    /// releases its guard.
    fn spawn_reply(&self, task: impl Future<Output = ()> + Send + 'static) {
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(task);
            return;
        }

        let session_id = self.inner.id;
        let spawned = std::thread::Builder::new()
            .name("mozbot-reply".into())
            .spawn(move || {
                match tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                {
                    Ok(runtime) => runtime.block_on(task),
                    Err(e) => warn!(%session_id, error = %e, "failed to start reply runtime"),
                }
            });
        if let Err(e) = spawned {
            warn!(%session_id, error = %e, "failed to spawn reply thread");
        }
    }

    fn complete_reply(&self, text: String) -> Message {
        let message = {
            let mut state = self.state();
            let message = state.complete_reply(text);
            self.emit(SessionEvent::TypingChanged(false));
            self.emit(SessionEvent::MessageAppended(message.clone()));
            message
        };
        debug!(session_id = %self.inner.id, message_id = %message.id, "bot reply appended");
        message
    }

    fn abandon_reply(&self) {
        let mut state = self.state();
        if state.abandon_reply() {
            self.emit(SessionEvent::TypingChanged(false));
            warn!(session_id = %self.inner.id, "reply task ended without an answer");
        }
    }

    fn request_focus(&self) {
        // Hold the lock so a concurrent close cannot slip in between the
        // check and the event.
        let state = self.state();
        if state.is_open() {
            self.emit(SessionEvent::FocusInput);
        }
    }

    /// Publish an event. Callers hold the state lock so events are seen in
    /// the same order as the state changes they describe.
    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
