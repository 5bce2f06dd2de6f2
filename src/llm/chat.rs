//! Stateful chat handle over a stateless provider

use super::{
    ContentBlock, LlmError, LlmMessage, LlmRequest, LlmResponse, LlmService, ToolDefinition,
};
use std::sync::Arc;

/// A multi-turn chat bound to a system instruction and a tool set.
///
/// The handle owns the provider-side context: every exchange is recorded and
/// replayed on the next call. A failed call leaves the context untouched, so
/// the handle stays usable. Dropping the handle releases the context.
pub struct ChatHandle {
    service: Arc<dyn LlmService>,
    system: String,
    tools: Vec<ToolDefinition>,
    history: Vec<LlmMessage>,
}

impl ChatHandle {
    pub fn new(
        service: Arc<dyn LlmService>,
        system: impl Into<String>,
        tools: Vec<ToolDefinition>,
    ) -> Self {
        Self {
            service,
            system: system.into(),
            tools,
            history: Vec::new(),
        }
    }

    /// Send one user-side turn (text or tool results) and record the exchange
    pub async fn send(&mut self, content: Vec<ContentBlock>) -> Result<LlmResponse, LlmError> {
        let user = LlmMessage::user(content);

        let mut messages = self.history.clone();
        messages.push(user.clone());

        let request = LlmRequest::new(messages)
            .with_system(self.system.clone())
            .with_tools(self.tools.clone());

        let response = self.service.complete(&request).await?;

        self.history.push(user);
        self.history.push(LlmMessage::model(response.content.clone()));
        Ok(response)
    }

    /// Recorded exchanges, oldest first
    #[cfg(test)]
    pub fn history(&self) -> &[LlmMessage] {
        &self.history
    }

    /// Marker for `rollback`
    pub fn checkpoint(&self) -> usize {
        self.history.len()
    }

    /// Forget every exchange recorded after `checkpoint`
    pub fn rollback(&mut self, checkpoint: usize) {
        self.history.truncate(checkpoint);
    }
}
