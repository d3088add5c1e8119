//! Application state shared across all route handlers.
//!
//! Everything except the session map is read-only after startup.

use std::sync::Arc;
use std::time::Instant;

use parley_backend::ModelBackend;
use parley_chat::{ChatRouter, SessionStore};
use parley_core::ParleyConfig;
use parley_vision::SceneAnalyzer;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Process configuration, fixed at startup.
    pub config: Arc<ParleyConfig>,
    /// Vision flows (`/analyze`, `/chat`).
    pub analyzer: Arc<SceneAnalyzer>,
    /// Text chat turn routing.
    pub chat: Arc<ChatRouter>,
    /// Live text chat sessions.
    pub sessions: Arc<SessionStore>,
    /// Local models offered in the UI, captured once at startup.
    pub models: Arc<Vec<String>>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: ParleyConfig, backend: Arc<dyn ModelBackend>, models: Vec<String>) -> Self {
        let analyzer = SceneAnalyzer::new(Arc::clone(&backend), config.vision_backend());
        let chat = ChatRouter::from_config(backend, &config);
        let sessions = SessionStore::from_config(&config.sessions);
        let models = if models.is_empty() {
            vec![chat.default_model().to_string()]
        } else {
            models
        };

        Self {
            config: Arc::new(config),
            analyzer: Arc::new(analyzer),
            chat: Arc::new(chat),
            sessions: Arc::new(sessions),
            models: Arc::new(models),
            start_time: Instant::now(),
        }
    }
}
