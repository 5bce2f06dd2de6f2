//! LLM provider abstraction
//!
//! Provides a common interface for talking to the generative-AI provider.

mod chat;
mod error;
mod gemini;
mod registry;
#[cfg(test)]
pub mod testing;
mod types;

pub use chat::ChatHandle;
pub use error::{ConfigurationError, LlmError};
pub use gemini::GeminiService;
pub use registry::{LlmConfig, ModelRegistry};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for LLM providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a one-shot completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Generate an image from a text prompt
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for LLM services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    messages = request.messages.len(),
                    search = request.search,
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "LLM request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    transient = e.kind.is_transient(),
                    "LLM request failed"
                );
            }
        }

        result
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.generate_image(prompt).await;
        let duration = start.elapsed();

        match &result {
            Ok(image) => tracing::info!(
                duration_ms = %duration.as_millis(),
                mime_type = %image.mime_type,
                "Image generation completed"
            ),
            Err(e) => tracing::error!(
                duration_ms = %duration.as_millis(),
                error = %e.message,
                "Image generation failed"
            ),
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
