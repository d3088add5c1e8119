//! The backend seam: one trait, one HTTP implementation dispatching on the
//! descriptor's kind.

use async_trait::async_trait;
use parley_core::{BackendDescriptor, BackendKind, ParleyConfig};

use crate::error::BackendError;
use crate::gemini::GeminiClient;
use crate::imaging::ImageInput;
use crate::ollama::OllamaClient;
use crate::retry::RetryPolicy;

/// A model backend reachable over some transport.
///
/// `HttpBackendClient` is the production implementation; tests substitute
/// scripted doubles.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Send `prompt` (and optionally an image) to `backend` and return the
    /// reply text.
    async fn send(
        &self,
        backend: &BackendDescriptor,
        prompt: &str,
        image: Option<&ImageInput>,
    ) -> Result<String, BackendError>;

    /// Models available on `backend`. Never empty.
    async fn list_models(&self, backend: &BackendDescriptor) -> Vec<String> {
        vec![backend.model.clone()]
    }

    /// Whether `backend` is reachable.
    async fn probe(&self, _backend: &BackendDescriptor) -> bool {
        true
    }
}

/// reqwest-backed client for Ollama and Gemini.
#[derive(Clone)]
pub struct HttpBackendClient {
    ollama: OllamaClient,
    gemini: GeminiClient,
}

impl HttpBackendClient {
    pub fn new(ollama: OllamaClient, gemini: GeminiClient) -> Self {
        Self { ollama, gemini }
    }

    /// Build both clients from the process configuration.
    pub fn from_config(config: &ParleyConfig) -> Self {
        let retry = RetryPolicy::from(&config.retry);
        Self::new(
            OllamaClient::new(&config.ollama, retry),
            GeminiClient::new(&config.gemini),
        )
    }
}

#[async_trait]
impl ModelBackend for HttpBackendClient {
    async fn send(
        &self,
        backend: &BackendDescriptor,
        prompt: &str,
        image: Option<&ImageInput>,
    ) -> Result<String, BackendError> {
        match backend.kind {
            BackendKind::OllamaGenerate => self.ollama.generate(backend, prompt, image).await,
            BackendKind::OllamaVision => {
                let image = image.ok_or_else(|| {
                    BackendError::Validation("No image provided".to_string())
                })?;
                self.ollama.generate_with_image(backend, prompt, image).await
            }
            BackendKind::Gemini => {
                if image.is_some() {
                    return Err(BackendError::Validation(
                        "The cloud backend does not accept images".to_string(),
                    ));
                }
                self.gemini.generate(backend, prompt).await
            }
        }
    }

    async fn list_models(&self, backend: &BackendDescriptor) -> Vec<String> {
        match backend.kind {
            BackendKind::OllamaGenerate | BackendKind::OllamaVision => {
                self.ollama.list_models(backend).await
            }
            BackendKind::Gemini => vec![backend.model.clone()],
        }
    }

    async fn probe(&self, backend: &BackendDescriptor) -> bool {
        match backend.kind {
            BackendKind::OllamaGenerate | BackendKind::OllamaVision => {
                self.ollama.probe(backend).await
            }
            BackendKind::Gemini => self.gemini.has_api_key(),
        }
    }
}
