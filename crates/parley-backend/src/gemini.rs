//! Gemini cloud backend.
//!
//! One `generateContent` call per prompt; every failure is converted into a
//! [`BackendError`] and nothing is retried.

use std::time::Duration;

use parley_core::config::GeminiConfig;
use parley_core::BackendDescriptor;
use serde_json::json;
use tracing::warn;

use crate::error::BackendError;

/// Gemini REST client.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
    request_timeout: Duration,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn generate_url(backend: &BackendDescriptor) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            backend.base_url, backend.model
        )
    }

    pub async fn generate(
        &self,
        backend: &BackendDescriptor,
        prompt: &str,
    ) -> Result<String, BackendError> {
        if !self.has_api_key() {
            return Err(BackendError::Validation(
                "Gemini API key is not configured".to_string(),
            ));
        }

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http_client
            .post(Self::generate_url(backend))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| BackendError::Transport {
                backend: backend.name.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, model = %backend.model, "Gemini returned an error status");
            return Err(BackendError::Status {
                backend: backend.name.clone(),
                status,
                body,
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidJson(e.to_string()))?;

        extract_text(&data)
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(data: &serde_json::Value) -> Result<String, BackendError> {
    let parts = data
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or(BackendError::EmptyResponse)?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.trim().is_empty() {
        return Err(BackendError::EmptyResponse);
    }
    Ok(text.trim().to_string())
}
