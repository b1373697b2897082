use super::client::{GenerationClient, GenerationFailure};
use super::state::{SessionState, SubmitOutcome};
use super::turn::{Transcript, Turn};
use crate::config::ChatConfig;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Mutable part of a session, guarded by one lock.
///
/// Every state transition happens while this lock is held for writing.
struct SessionInner {
    transcript: Transcript,
    closed: bool,
}

/// One conversation between a visitor and the assistant.
///
/// `ChatSession` is responsible for:
/// - Seeding the transcript with the greeting
/// - Appending user turns and starting the generation call
/// - Appending the reply (or fallback) when the call settles
/// - Rejecting input while a call is outstanding
///
/// At most one generation call is in flight per session. Closing or dropping
/// the session cancels an outstanding call and discards its result.
pub struct ChatSession {
    /// Session ID for this instance
    id: String,
    inner: Arc<RwLock<SessionInner>>,
    /// Current state, broadcast to rendering surfaces
    state_tx: Arc<watch::Sender<SessionState>>,
    client: Arc<dyn GenerationClient>,
    config: Arc<ChatConfig>,
    cancel: CancellationToken,
}

impl ChatSession {
    /// Creates a session with a fresh UUID.
    pub fn new(client: Arc<dyn GenerationClient>, config: ChatConfig) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), client, config)
    }

    /// Creates a session with the given ID.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identifier used in log records
    /// * `client` - Generation endpoint
    /// * `config` - Greeting, fallback texts and request timeout
    pub fn with_id(
        id: impl Into<String>,
        client: Arc<dyn GenerationClient>,
        config: ChatConfig,
    ) -> Self {
        let id = id.into();
        let (state_tx, _) = watch::channel(SessionState::Idle);
        info!(session_id = %id, "chat session created");

        Self {
            inner: Arc::new(RwLock::new(SessionInner {
                transcript: Transcript::seeded(config.effective_greeting()),
                closed: false,
            })),
            state_tx: Arc::new(state_tx),
            client,
            config: Arc::new(config),
            cancel: CancellationToken::new(),
            id,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    /// Receiver notified on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Snapshot of the transcript.
    pub async fn transcript(&self) -> Transcript {
        self.inner.read().await.transcript.clone()
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.read().await.closed
    }

    /// Submits a user turn.
    ///
    /// Empty input, a busy session and a closed session are silent no-ops;
    /// the returned outcome only says which one applied.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            debug!(session_id = %self.id, "ignoring empty input");
            return SubmitOutcome::EmptyInput;
        }

        let history = {
            let mut inner = self.inner.write().await;
            if inner.closed {
                debug!(session_id = %self.id, "ignoring input for closed session");
                return SubmitOutcome::Closed;
            }
            if !self.state_tx.borrow().is_idle() {
                debug!(session_id = %self.id, "ignoring input while awaiting response");
                return SubmitOutcome::Busy;
            }

            let history = inner.transcript.turns().to_vec();
            inner.transcript.push(Turn::user(text));
            self.state_tx.send_replace(SessionState::AwaitingResponse);
            history
        };

        debug!(
            session_id = %self.id,
            history_len = history.len(),
            "state -> AwaitingResponse"
        );
        self.spawn_generation(text.to_string(), history);
        SubmitOutcome::Accepted
    }

    /// Waits until no generation call is outstanding.
    pub async fn wait_idle(&self) {
        let mut rx = self.state_tx.subscribe();
        // The sender lives as long as `self`, so this only returns once idle.
        let _ = rx.wait_for(SessionState::is_idle).await;
    }

    /// Closes the session.
    ///
    /// An outstanding call is cancelled; later `submit` calls return
    /// [`SubmitOutcome::Closed`].
    pub async fn close(&self) {
        let mut inner = self.inner.write().await;
        if inner.closed {
            return;
        }
        inner.closed = true;
        self.cancel.cancel();
        self.state_tx.send_replace(SessionState::Idle);
        info!(session_id = %self.id, turns = inner.transcript.len(), "chat session closed");
    }

    fn spawn_generation(&self, message: String, history: Vec<Turn>) {
        let inner = Arc::downgrade(&self.inner);
        let state_tx = Arc::clone(&self.state_tx);
        let client = Arc::clone(&self.client);
        let config = Arc::clone(&self.config);
        let cancel = self.cancel.child_token();
        let session_id = self.id.clone();

        tokio::spawn(async move {
            let limit = config.request_timeout();
            let call = tokio::spawn(async move {
                generate_with_timeout(client.as_ref(), &message, &history, limit).await
            });
            let abort = call.abort_handle();

            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    abort.abort();
                    debug!(session_id = %session_id, "generation cancelled, discarding result");
                    return;
                }
                joined = call => joined
                    .unwrap_or_else(|err| Err(GenerationFailure::Aborted(err.to_string()))),
            };

            let reply = reply_text(result, &config, &session_id);
            resolve(&inner, &state_tx, reply, &session_id).await;
        });
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

async fn generate_with_timeout(
    client: &dyn GenerationClient,
    message: &str,
    history: &[Turn],
    limit: Option<Duration>,
) -> Result<String, GenerationFailure> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, client.generate(message, history))
            .await
            .map_err(|_| GenerationFailure::Timeout(limit))?,
        None => client.generate(message, history).await,
    }
}

/// Maps the call outcome to the assistant text that will be appended.
fn reply_text(
    result: Result<String, GenerationFailure>,
    config: &ChatConfig,
    session_id: &str,
) -> String {
    match result {
        Ok(text) if text.trim().is_empty() => {
            warn!(session_id = %session_id, "generation returned blank text");
            config.empty_reply_message.clone()
        }
        Ok(text) => text,
        Err(err) => {
            warn!(session_id = %session_id, error = %err, "generation failed, using fallback reply");
            config.fallback_message.clone()
        }
    }
}

/// Appends the assistant turn and returns the session to `Idle`.
///
/// Does nothing once the session has been dropped or closed.
async fn resolve(
    inner: &Weak<RwLock<SessionInner>>,
    state_tx: &watch::Sender<SessionState>,
    text: String,
    session_id: &str,
) {
    let Some(inner) = inner.upgrade() else {
        debug!(session_id = %session_id, "session dropped before reply arrived");
        return;
    };

    let mut inner = inner.write().await;
    if inner.closed {
        debug!(session_id = %session_id, "session closed before reply arrived");
        return;
    }
    let position = inner.transcript.push(Turn::assistant(text));
    state_tx.send_replace(SessionState::Idle);
    debug!(session_id = %session_id, position, "state -> Idle");
}
