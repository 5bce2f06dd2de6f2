//! Common types for LLM interactions

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// LLM request
#[derive(Debug, Clone, Default)]
pub struct LlmRequest {
    pub system: Option<String>,
    pub messages: Vec<LlmMessage>,
    pub tools: Vec<ToolDefinition>,
    /// Ask the provider to ground the answer with web search
    pub search: bool,
}

impl LlmRequest {
    pub fn new(messages: Vec<LlmMessage>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_search(mut self) -> Self {
        self.search = true;
        self
    }
}

/// Message in conversation
#[derive(Debug, Clone, PartialEq)]
pub struct LlmMessage {
    pub role: MessageRole,
    pub content: Vec<ContentBlock>,
}

impl LlmMessage {
    pub fn user(content: Vec<ContentBlock>) -> Self {
        Self {
            role: MessageRole::User,
            content,
        }
    }

    pub fn model(content: Vec<ContentBlock>) -> Self {
        Self {
            role: MessageRole::Model,
            content,
        }
    }

    /// Concatenated text of the message
    #[cfg(test)]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Model,
}

/// Content block in a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        source: ImageSource,
    },
    FunctionCall {
        name: String,
        args: Value,
    },
    FunctionResponse {
        name: String,
        response: Value,
    },
}

impl ContentBlock {
    pub fn text(s: impl Into<String>) -> Self {
        ContentBlock::Text { text: s.into() }
    }

    pub fn image(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        ContentBlock::Image {
            source: ImageSource::Base64 {
                media_type: media_type.into(),
                data: data.into(),
            },
        }
    }

    #[cfg(test)]
    pub fn function_call(name: impl Into<String>, args: Value) -> Self {
        ContentBlock::FunctionCall {
            name: name.into(),
            args,
        }
    }

    pub fn function_response(name: impl Into<String>, response: Value) -> Self {
        ContentBlock::FunctionResponse {
            name: name.into(),
            response,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        }
    }
}

/// Image source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    Base64 { media_type: String, data: String },
}

/// Tool definition
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Web citation attached to a grounded response
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WebCitation {
    pub uri: String,
    pub title: Option<String>,
}

/// One grounding chunk; only web chunks carry a citation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroundingChunk {
    pub web: Option<WebCitation>,
}

/// Grounding metadata returned alongside search-grounded answers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroundingMetadata {
    pub chunks: Vec<GroundingChunk>,
}

/// LLM response
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub grounding: Option<GroundingMetadata>,
    pub usage: Usage,
}

impl LlmResponse {
    #[cfg(test)]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            ..Self::default()
        }
    }

    /// All function calls requested by the response, in order
    pub fn function_calls(&self) -> Vec<(&str, &Value)> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::FunctionCall { name, args } => Some((name.as_str(), args)),
                _ => None,
            })
            .collect()
    }

    /// The first pending function call, if any
    pub fn first_function_call(&self) -> Option<(&str, &Value)> {
        self.function_calls().into_iter().next()
    }

    /// Get text content from the response
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Usage statistics
#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Image produced by a text-to-image request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_joins_text_blocks_only() {
        let response = LlmResponse {
            content: vec![
                ContentBlock::text("Compost "),
                ContentBlock::function_call("getWeatherReport", json!({})),
                ContentBlock::text("needs air."),
            ],
            ..Default::default()
        };
        assert_eq!(response.text(), "Compost needs air.");
    }

    #[test]
    fn test_first_function_call_keeps_order() {
        let response = LlmResponse {
            content: vec![
                ContentBlock::function_call("first", json!({"a": 1})),
                ContentBlock::function_call("second", json!({})),
            ],
            ..Default::default()
        };
        let (name, args) = response.first_function_call().unwrap();
        assert_eq!(name, "first");
        assert_eq!(args, &json!({"a": 1}));
        assert_eq!(response.function_calls().len(), 2);
    }

    #[test]
    fn test_no_function_call_on_plain_text() {
        assert!(LlmResponse::from_text("hi").first_function_call().is_none());
    }
}
