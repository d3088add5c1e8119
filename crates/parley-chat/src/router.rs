//! Routes one chat message to the backend selected by the session.

use std::sync::Arc;

use chrono::Utc;
use parley_backend::{BackendError, ModelBackend};
use parley_core::prompt::{cloud_chat_prompt, local_chat_prompt};
use parley_core::{BackendDescriptor, ConversationHistory, ParleyConfig, Turn};
use serde::Serialize;
use tracing::{info, warn};

use crate::session::{ChatMode, ChatSession, SessionState};

/// Result of one submission.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub history: ConversationHistory,
    /// Always empty; the client resets its input box to this.
    pub input: String,
    /// Whether a turn was added.
    pub appended: bool,
}

/// Builds prompts, calls the backend and records the turn.
#[derive(Clone)]
pub struct ChatRouter {
    backend: Arc<dyn ModelBackend>,
    local: BackendDescriptor,
    cloud: BackendDescriptor,
    cloud_window: usize,
}

impl ChatRouter {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        local: BackendDescriptor,
        cloud: BackendDescriptor,
        cloud_window: usize,
    ) -> Self {
        Self {
            backend,
            local,
            cloud,
            cloud_window,
        }
    }

    pub fn from_config(backend: Arc<dyn ModelBackend>, config: &ParleyConfig) -> Self {
        Self::new(
            backend,
            config.local_chat_backend(&config.ollama.chat_model),
            config.cloud_chat_backend(),
            config.gemini.history_window,
        )
    }

    /// Default local model for new sessions.
    pub fn default_model(&self) -> &str {
        &self.local.model
    }

    pub fn local_backend(&self) -> &BackendDescriptor {
        &self.local
    }

    /// Send `message` on behalf of `session`.
    ///
    /// A whitespace-only message changes nothing. Anything else appends
    /// exactly one turn: the reply on success, a readable error string
    /// otherwise. The mode and model are read from the session at call time.
    pub async fn submit(&self, session: &mut ChatSession, message: &str) -> TurnOutcome {
        if message.trim().is_empty() {
            return TurnOutcome {
                history: session.history.clone(),
                input: String::new(),
                appended: false,
            };
        }

        let bot = {
            let pending = PendingReply::begin(session);
            match pending.session.mode {
                ChatMode::Local => self.ask_local(pending.session, message).await,
                ChatMode::Cloud => self.ask_cloud(pending.session, message).await,
            }
        };

        session.history.append(Turn::new(message, bot));
        session.last_message_at = Some(Utc::now());

        TurnOutcome {
            history: session.history.clone(),
            input: String::new(),
            appended: true,
        }
    }

    async fn ask_local(&self, session: &ChatSession, message: &str) -> String {
        let backend = self.local.with_model(session.model.as_str());
        let prompt = local_chat_prompt(session.history.turns(), message);
        info!(session_id = %session.id, model = %backend.model, "Sending local chat turn");

        match self.backend.send(&backend, &prompt, None).await {
            Ok(reply) => reply,
            Err(BackendError::Status { status, body, .. }) => {
                warn!(session_id = %session.id, status, "Local chat backend returned an error");
                format!("Error from Ollama: {}", body)
            }
            Err(BackendError::Transport { reason, .. }) => {
                warn!(session_id = %session.id, error = %reason, "Local chat backend unreachable");
                format!("Could not connect to Ollama: {}", reason)
            }
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "Local chat failed");
                format!("Could not connect to Ollama: {}", e)
            }
        }
    }

    async fn ask_cloud(&self, session: &ChatSession, message: &str) -> String {
        let prompt = cloud_chat_prompt(&session.history, message, self.cloud_window);
        info!(session_id = %session.id, model = %self.cloud.model, "Sending cloud chat turn");

        match self.backend.send(&self.cloud, &prompt, None).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "Cloud chat failed");
                format!("Gemini API error: {}", e)
            }
        }
    }
}

/// Marks a session as awaiting a reply until dropped, so a cancelled
/// submission leaves it idle.
struct PendingReply<'a> {
    session: &'a mut ChatSession,
}

impl<'a> PendingReply<'a> {
    fn begin(session: &'a mut ChatSession) -> Self {
        session.state = SessionState::AwaitingReply;
        Self { session }
    }
}

impl Drop for PendingReply<'_> {
    fn drop(&mut self) {
        self.session.state = SessionState::Idle;
    }
}
