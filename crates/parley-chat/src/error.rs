//! Error types for chat sessions.

use uuid::Uuid;

/// Errors from session management.
///
/// Backend failures are not errors at this level: they become the bot text
/// of the appended turn.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("session not found: {0}")]
    SessionNotFound(Uuid),
    #[error("session {0} is awaiting a reply")]
    Busy(Uuid),
    #[error("invalid chat mode: {0}")]
    InvalidMode(String),
    #[error("model name cannot be empty")]
    EmptyModel,
}
