//! Bounded retry with a fixed delay between attempts.
//!
//! Only transport failures are retried. Once an attempt gets a success status
//! back, the caller validates the response itself and no further attempts are
//! made, whatever the outcome of that validation.

use std::future::Future;
use std::time::Duration;

use parley_core::config::RetryConfig;
use tracing::{error, info};

use crate::error::{truncate, BackendError};

/// Why a single attempt failed to get a success response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Connect,
    HttpStatus(u16),
    Request,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Connect => "connect",
            FailureKind::HttpStatus(_) => "http_status",
            FailureKind::Request => "request",
        }
    }
}

/// A failed attempt, kept only for logging.
#[derive(Debug, Clone)]
pub struct TransportFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl TransportFailure {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::HttpStatus(status),
            detail: body.into(),
        }
    }
}

impl From<reqwest::Error> for TransportFailure {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            FailureKind::Timeout
        } else if err.is_connect() {
            FailureKind::Connect
        } else if let Some(status) = err.status() {
            FailureKind::HttpStatus(status.as_u16())
        } else {
            FailureKind::Request
        };
        Self {
            kind,
            detail: err.to_string(),
        }
    }
}

/// Fixed-count, fixed-delay retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero is treated as one.
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Run `op` until it succeeds or the attempts are used up.
    ///
    /// `op` receives the 1-based attempt number. The delay is slept only
    /// between attempts, so the worst case adds `(attempts - 1) * delay`.
    pub async fn run<T, F, Fut>(&self, backend: &str, mut op: F) -> Result<T, BackendError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, TransportFailure>>,
    {
        let attempts = self.attempts.max(1);
        for attempt in 1..=attempts {
            info!(attempt, attempts, backend, "Attempting API call");
            match op(attempt).await {
                Ok(value) => {
                    info!(attempt, backend, "API call successful");
                    return Ok(value);
                }
                Err(failure) => {
                    error!(
                        attempt,
                        attempts,
                        backend,
                        kind = failure.kind.as_str(),
                        detail = %truncate(&failure.detail, 200),
                        "API call failed"
                    );
                }
            }
            if attempt < attempts {
                info!(delay_ms = self.delay.as_millis() as u64, "Waiting before retry");
                tokio::time::sleep(self.delay).await;
            }
        }
        error!(attempts, backend, "All API call attempts failed");
        Err(BackendError::ConnectionFailed { attempts })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.attempts, config.delay())
    }
}
