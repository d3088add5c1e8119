//! Parley backend crate - HTTP clients for the model-serving backends.
//!
//! Provides the `ModelBackend` trait, the reqwest-based `HttpBackendClient`
//! (Ollama text, Ollama vision with retries, Gemini), the fixed image
//! normalization applied before upload, and the typed `BackendError`.

pub mod client;
pub mod error;
pub mod gemini;
pub mod imaging;
pub mod ollama;
pub mod retry;

pub use client::{HttpBackendClient, ModelBackend};
pub use error::{BackendError, ErrorCategory};
pub use imaging::{ImageInput, NORMALIZED_EDGE};
pub use retry::{FailureKind, RetryPolicy, TransportFailure};
