//! Image analysis and image-grounded chat against the vision backend.

use std::sync::Arc;

use parley_backend::{BackendError, ImageInput, ModelBackend};
use parley_core::prompt::{image_chat_prompt, ANALYSIS_PROMPT};
use parley_core::{AnalysisResult, BackendDescriptor, ChatReply};
use tracing::info;

use crate::interpreter::interpret;

/// Sends images with a prompt to the vision model.
///
/// Stateless apart from its configuration; one instance serves every request.
#[derive(Clone)]
pub struct SceneAnalyzer {
    backend: Arc<dyn ModelBackend>,
    descriptor: BackendDescriptor,
}

impl SceneAnalyzer {
    pub fn new(backend: Arc<dyn ModelBackend>, descriptor: BackendDescriptor) -> Self {
        Self {
            backend,
            descriptor,
        }
    }

    pub fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    /// Ask the model for a structured description and parse its reply.
    ///
    /// Parsing never fails; unparseable fields come back as `Unknown`.
    pub async fn analyze(&self, image: &ImageInput) -> Result<AnalysisResult, BackendError> {
        let (width, height) = image.dimensions();
        info!(width, height, model = %self.descriptor.model, "Analyzing image");

        let raw = self
            .backend
            .send(&self.descriptor, ANALYSIS_PROMPT, Some(image))
            .await?;
        Ok(interpret(&raw))
    }

    /// Answer a free-form question about an image.
    pub async fn chat_about(
        &self,
        image: &ImageInput,
        question: &str,
    ) -> Result<ChatReply, BackendError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(BackendError::Validation("No message provided".to_string()));
        }

        info!(question_len = question.len(), "Answering question about image");
        let response = self
            .backend
            .send(&self.descriptor, &image_chat_prompt(question), Some(image))
            .await?;
        Ok(ChatReply { response })
    }
}
