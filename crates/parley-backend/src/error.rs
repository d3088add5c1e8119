//! Backend error types.
//!
//! Every failure a backend call can produce is one of these variants, grouped
//! into an [`ErrorCategory`] that decides how the HTTP layer reports it.

use thiserror::Error;

/// Coarse grouping of backend failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request itself was unusable (missing input, missing credentials).
    Validation,
    /// The backend could not be reached or answered with a non-success status.
    Transport,
    /// The backend answered, but not in the expected shape.
    Format,
    /// The uploaded image could not be decoded or re-encoded.
    Decode,
}

/// Errors from a model backend call.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{0}")]
    Validation(String),

    #[error("could not connect to {backend}: {reason}")]
    Transport { backend: String, reason: String },

    #[error("{backend} returned HTTP {status}: {body}")]
    Status {
        backend: String,
        status: u16,
        body: String,
    },

    #[error("API connection failed after {attempts} attempts")]
    ConnectionFailed { attempts: u32 },

    #[error("Invalid API response format: {0}")]
    UnexpectedContentType(String),

    #[error("Invalid JSON response from API: {0}")]
    InvalidJson(String),

    #[error("Empty response from API")]
    EmptyResponse,

    #[error("Failed to decode image file: {0}")]
    Decode(String),

    #[error("Image processing failed: {0}")]
    Encode(String),
}

impl BackendError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BackendError::Validation(_) => ErrorCategory::Validation,
            BackendError::Transport { .. }
            | BackendError::Status { .. }
            | BackendError::ConnectionFailed { .. } => ErrorCategory::Transport,
            BackendError::UnexpectedContentType(_)
            | BackendError::InvalidJson(_)
            | BackendError::EmptyResponse => ErrorCategory::Format,
            BackendError::Decode(_) | BackendError::Encode(_) => ErrorCategory::Decode,
        }
    }

    /// Whether the failure was caused by the caller's input rather than the
    /// backend or the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, BackendError::Validation(_) | BackendError::Decode(_))
    }
}

/// Truncate a body for logging without splitting a UTF-8 sequence.
pub(crate) fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
