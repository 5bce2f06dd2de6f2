//! Mock provider for testing
//!
//! Queues canned responses and records every request it sees.

use super::{GeneratedImage, LlmError, LlmRequest, LlmResponse, LlmService};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Mock LLM service that returns queued responses
pub struct MockLlmService {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    images: Mutex<VecDeque<Result<GeneratedImage, LlmError>>>,
    /// Returned when the response queue is empty
    fallback: Mutex<Option<LlmResponse>>,
    requests: Mutex<Vec<LlmRequest>>,
    image_prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl MockLlmService {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            images: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            image_prompts: Mutex::new(Vec::new()),
            delay: None,
            request_started: Arc::new(Notify::new()),
        }
    }

    /// Mock that sleeps before answering (for cancellation tests)
    pub fn delayed(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Answer every request with this response once the queue is drained
    pub fn respond_always(&self, response: LlmResponse) {
        *self.fallback.lock().unwrap() = Some(response);
    }

    /// Queue an image generation result
    pub fn queue_image(&self, result: Result<GeneratedImage, LlmError>) {
        self.images.lock().unwrap().push_back(result);
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn recorded_image_prompts(&self) -> Vec<String> {
        self.image_prompts.lock().unwrap().clone()
    }
}

impl Default for MockLlmService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.request_started.notify_one();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let queued = self.responses.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| {
            self.fallback
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| LlmError::network("No mock response queued"))
        })
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, LlmError> {
        self.image_prompts.lock().unwrap().push(prompt.to_string());
        self.request_started.notify_one();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.images
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock image queued")))
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}
