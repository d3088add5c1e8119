//! Ollama backend implementation.
//!
//! Uses two endpoints of the local Ollama REST API:
//! - `/api/generate` - batch completions (`stream: false`), text or image
//! - `/api/tags` - list installed models
//!
//! Text generation makes a single attempt. Image generation goes through the
//! [`RetryPolicy`] and then validates the response shape without retrying.

use std::time::Duration;

use parley_core::config::OllamaConfig;
use parley_core::BackendDescriptor;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{truncate, BackendError};
use crate::imaging::ImageInput;
use crate::retry::{RetryPolicy, TransportFailure};

/// JSON body for `/api/generate`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,
}

/// Ollama REST client.
#[derive(Clone)]
pub struct OllamaClient {
    http_client: reqwest::Client,
    request_timeout: Duration,
    tags_timeout: Duration,
    probe_timeout: Duration,
    retry: RetryPolicy,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig, retry: RetryPolicy) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            tags_timeout: Duration::from_secs(config.tags_timeout_secs),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
            retry,
        }
    }

    fn generate_url(backend: &BackendDescriptor) -> String {
        format!("{}/api/generate", backend.base_url)
    }

    fn tags_url(backend: &BackendDescriptor) -> String {
        format!("{}/api/tags", backend.base_url)
    }

    /// Single-attempt generation for the text chat.
    ///
    /// Non-success statuses surface as [`BackendError::Status`] carrying the
    /// response body; network failures as [`BackendError::Transport`].
    pub async fn generate(
        &self,
        backend: &BackendDescriptor,
        prompt: &str,
        image: Option<&ImageInput>,
    ) -> Result<String, BackendError> {
        let images = image.map(|img| img.to_jpeg_base64()).transpose()?.map(|b64| vec![b64]);
        let request = GenerateRequest {
            model: &backend.model,
            prompt,
            stream: false,
            images,
        };

        let response = self
            .http_client
            .post(Self::generate_url(backend))
            .json(&request)
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
            warn!(status, model = %backend.model, "Ollama returned an error status");
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

        let reply = data
            .get("response")
            .and_then(|r| r.as_str())
            .ok_or_else(|| BackendError::InvalidJson("missing `response` field".to_string()))?;

        Ok(reply.trim().to_string())
    }

    /// Image generation for the vision flows, with retries on transport
    /// failure and strict validation of the successful response.
    pub async fn generate_with_image(
        &self,
        backend: &BackendDescriptor,
        prompt: &str,
        image: &ImageInput,
    ) -> Result<String, BackendError> {
        let encoded = image.to_jpeg_base64()?;
        info!(encoded_len = encoded.len(), "Image encoded to base64");

        let request = GenerateRequest {
            model: &backend.model,
            prompt,
            stream: false,
            images: Some(vec![encoded]),
        };
        let url = Self::generate_url(backend);

        info!(model = %backend.model, url = %url, "Sending vision request");
        let response = self
            .retry
            .run(&backend.name, |_attempt| {
                let pending = self
                    .http_client
                    .post(&url)
                    .json(&request)
                    .timeout(self.request_timeout)
                    .send();
                async move {
                    let response = pending.await?;
                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(TransportFailure::status(status.as_u16(), body));
                    }
                    Ok(response)
                }
            })
            .await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text().await.map_err(|e| BackendError::Transport {
            backend: backend.name.clone(),
            reason: e.to_string(),
        })?;

        let reply = validate_vision_response(&content_type, &body)?;
        info!(
            reply_len = reply.len(),
            preview = %truncate(&reply, 200),
            "Vision response received"
        );
        Ok(reply)
    }

    /// Names of installed models. Any failure, or an empty list, yields the
    /// descriptor's own model as the single entry.
    pub async fn list_models(&self, backend: &BackendDescriptor) -> Vec<String> {
        let fallback = || vec![backend.model.clone()];

        let response = match self
            .http_client
            .get(Self::tags_url(backend))
            .timeout(self.tags_timeout)
            .send()
            .await
        {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!(status = r.status().as_u16(), "Model listing failed");
                return fallback();
            }
            Err(e) => {
                warn!(error = %e, "Model listing failed");
                return fallback();
            }
        };

        let data: serde_json::Value = match response.json().await {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, "Model listing returned invalid JSON");
                return fallback();
            }
        };

        let models: Vec<String> = data
            .get("models")
            .and_then(|m| m.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| m.get("name")?.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        if models.is_empty() {
            fallback()
        } else {
            models
        }
    }

    /// Whether the tags endpoint answers with a success status.
    pub async fn probe(&self, backend: &BackendDescriptor) -> bool {
        match self
            .http_client
            .get(Self::tags_url(backend))
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(r) if r.status().is_success() => {
                info!(url = %backend.base_url, "Ollama API is reachable");
                true
            }
            Ok(r) => {
                error!(status = r.status().as_u16(), "Ollama API returned an error status");
                false
            }
            Err(e) => {
                error!(error = %e, "Cannot connect to Ollama API");
                false
            }
        }
    }
}

/// Check a successful vision response: JSON content type, parseable body and
/// a non-empty `response` string.
pub fn validate_vision_response(content_type: &str, body: &str) -> Result<String, BackendError> {
    if !content_type.contains("application/json") {
        error!(content_type, body = %truncate(body, 500), "Unexpected content type");
        return Err(BackendError::UnexpectedContentType(content_type.to_string()));
    }

    let data: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        error!(error = %e, body = %truncate(body, 500), "Error parsing JSON");
        BackendError::InvalidJson(e.to_string())
    })?;

    let reply = data.get("response").and_then(|r| r.as_str()).unwrap_or("");
    if reply.is_empty() {
        warn!("Empty response from API");
        return Err(BackendError::EmptyResponse);
    }
    Ok(reply.to_string())
}
