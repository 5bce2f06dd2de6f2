//! Local tools the assistant can call mid-turn
//!
//! The provider asks for a tool by name; the registry maps the name to a
//! local executor and builds the payload sent back into the chat.

mod weather;

pub use weather::WeatherTool;

use crate::llm::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Result from tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub output: String,
}

impl ToolOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    #[cfg(test)]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: message.into(),
        }
    }
}

/// Trait for tools that can be executed by the assistant
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as declared to the provider
    fn name(&self) -> &str;

    /// Tool description for LLM
    fn description(&self) -> String;

    /// JSON schema for tool input
    fn input_schema(&self) -> Value;

    /// Key under which a successful output is reported back
    fn result_key(&self) -> &str {
        "result"
    }

    async fn run(&self, input: Value) -> ToolOutput;
}

/// Outcome of resolving a requested tool call
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The tool ran; this payload goes back to the provider
    Handled(Value),
    /// No such tool. Stops the tool loop, not an error
    Unhandled,
}

/// Static mapping from declared tool name to executor
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in tool
    pub fn builtin() -> Self {
        Self::new().with_tool(Arc::new(WeatherTool))
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
        self
    }

    /// Tool declarations for the provider, in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description(),
                input_schema: tool.input_schema(),
            })
            .collect()
    }

    pub async fn resolve(&self, name: &str, args: &Value) -> Resolution {
        let Some(tool) = self.tools.get(name) else {
            tracing::debug!(tool = %name, "No local executor for requested tool");
            return Resolution::Unhandled;
        };

        let output = tool.run(args.clone()).await;
        tracing::info!(tool = %name, success = output.success, "Tool call resolved");

        let key = if output.success { tool.result_key() } else { "error" };
        let mut payload = Map::new();
        payload.insert(key.to_string(), json!(output.output));
        Resolution::Handled(Value::Object(payload))
    }
}
