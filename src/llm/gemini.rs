//! Google Gemini provider implementation

use super::types::{
    ContentBlock, GeneratedImage, GroundingChunk, GroundingMetadata, ImageSource, LlmMessage,
    LlmRequest, LlmResponse, MessageRole, Usage, WebCitation,
};
use super::{LlmConfig, LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DIRECT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini service implementation
pub struct GeminiService {
    client: Client,
    api_key: String,
    chat_model: String,
    image_model: String,
    base_url: String,
}

impl GeminiService {
    pub fn new(api_key: String, config: &LlmConfig) -> Result<Self, LlmError> {
        let base_url = match config.gateway.as_deref() {
            // Gateway proxies the Gemini API under /gemini
            Some(gw) => format!("{}/gemini/v1beta", gw.trim_end_matches('/')),
            None => DIRECT_BASE_URL.to_string(),
        };

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            chat_model: config.chat_model.clone(),
            image_model: config.image_model.clone(),
            base_url,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    fn translate_request(request: &LlmRequest) -> GeminiRequest {
        let system_instruction = request.system.as_ref().map(|text| GeminiContent {
            role: None,
            parts: vec![GeminiPart::Text { text: text.clone() }],
        });

        let contents = request
            .messages
            .iter()
            .filter_map(translate_message)
            .collect();

        let mut tools = Vec::new();
        if !request.tools.is_empty() {
            tools.push(GeminiTool {
                function_declarations: Some(
                    request
                        .tools
                        .iter()
                        .map(|t| GeminiFunctionDeclaration {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: t.input_schema.clone(),
                        })
                        .collect(),
                ),
                google_search: None,
            });
        }
        if request.search {
            tools.push(GeminiTool {
                function_declarations: None,
                google_search: Some(GeminiGoogleSearch {}),
            });
        }

        GeminiRequest {
            contents,
            system_instruction,
            tools: if tools.is_empty() { None } else { Some(tools) },
            generation_config: None,
        }
    }

    fn normalize_response(resp: GeminiResponse) -> Result<LlmResponse, LlmError> {
        let candidate = resp
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::unknown("No candidates in response"))?;

        let mut content = Vec::new();

        // A blocked candidate has no content at all
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            match part {
                GeminiPart::Text { text } => {
                    if !text.is_empty() {
                        content.push(ContentBlock::Text { text });
                    }
                }
                GeminiPart::InlineData { inline_data } => {
                    content.push(ContentBlock::image(inline_data.mime_type, inline_data.data));
                }
                GeminiPart::FunctionCall { function_call } => {
                    content.push(ContentBlock::FunctionCall {
                        name: function_call.name,
                        args: function_call.args,
                    });
                }
                GeminiPart::FunctionResponse { .. } | GeminiPart::Other(_) => {}
            }
        }

        let grounding = candidate.grounding_metadata.map(|meta| GroundingMetadata {
            chunks: meta
                .grounding_chunks
                .into_iter()
                .map(|chunk| GroundingChunk {
                    web: chunk.web.map(|web| WebCitation {
                        uri: web.uri,
                        title: web.title,
                    }),
                })
                .collect(),
        });

        let usage = resp.usage_metadata.unwrap_or_default();

        Ok(LlmResponse {
            content,
            grounding,
            usage: Usage {
                input_tokens: u64::from(usage.prompt_token_count),
                output_tokens: u64::from(usage.candidates_token_count),
            },
        })
    }

    async fn generate_content(
        &self,
        model: &str,
        body: &GeminiRequest,
    ) -> Result<GeminiResponse, LlmError> {
        let mut builder = self
            .client
            .post(self.endpoint(model))
            .header("Content-Type", "application/json")
            .json(body);

        // Gateway mode - the gateway injects credentials
        if !self.api_key.starts_with("implicit") {
            builder = builder.header("x-goog-api-key", &self.api_key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::network(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                LlmError::network(format!("Connection failed: {e}"))
            } else {
                LlmError::unknown(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            if let Ok(error_resp) = serde_json::from_str::<GeminiErrorResponse>(&body) {
                return Err(LlmError::from_status(
                    status.as_u16(),
                    &error_resp.error.message,
                ));
            }
            return Err(LlmError::unknown(format!("HTTP {status} error: {body}")));
        }

        serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })
    }
}

fn translate_message(msg: &LlmMessage) -> Option<GeminiContent> {
    let role = match msg.role {
        MessageRole::User => "user",
        MessageRole::Model => "model",
    };

    let parts: Vec<GeminiPart> = msg
        .content
        .iter()
        .map(|block| match block {
            ContentBlock::Text { text } => GeminiPart::Text { text: text.clone() },
            ContentBlock::Image {
                source: ImageSource::Base64 { media_type, data },
            } => GeminiPart::InlineData {
                inline_data: GeminiBlob {
                    mime_type: media_type.clone(),
                    data: data.clone(),
                },
            },
            ContentBlock::FunctionCall { name, args } => GeminiPart::FunctionCall {
                function_call: GeminiFunctionCall {
                    name: name.clone(),
                    args: args.clone(),
                },
            },
            ContentBlock::FunctionResponse { name, response } => GeminiPart::FunctionResponse {
                function_response: GeminiFunctionResponse {
                    name: name.clone(),
                    response: response.clone(),
                },
            },
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(GeminiContent {
            role: Some(role.to_string()),
            parts,
        })
    }
}

#[async_trait]
impl LlmService for GeminiService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let body = Self::translate_request(request);
        let response = self.generate_content(&self.chat_model, &body).await?;
        Self::normalize_response(response)
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, LlmError> {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart::Text {
                    text: prompt.to_string(),
                }],
            }],
            system_instruction: None,
            tools: None,
            generation_config: Some(GeminiGenerationConfig {
                response_modalities: Some(vec!["IMAGE".to_string()]),
            }),
        };

        let response = self.generate_content(&self.image_model, &body).await?;
        let normalized = Self::normalize_response(response)?;
        first_image(&normalized).ok_or_else(|| LlmError::unknown("No image data found in response"))
    }

    fn model_id(&self) -> &str {
        &self.chat_model
    }
}

fn first_image(response: &LlmResponse) -> Option<GeneratedImage> {
    response.content.iter().find_map(|block| match block {
        ContentBlock::Image {
            source: ImageSource::Base64 { media_type, data },
        } => Some(GeneratedImage {
            mime_type: media_type.clone(),
            data: data.clone(),
        }),
        _ => None,
    })
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiBlob,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: GeminiFunctionCall,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: GeminiFunctionResponse,
    },
    /// Part kinds we do not consume (executable code, etc.)
    Other(Value),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiBlob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    #[serde(skip_serializing_if = "Option::is_none")]
    function_declarations: Option<Vec<GeminiFunctionDeclaration>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    google_search: Option<GeminiGoogleSearch>,
}

#[derive(Debug, Serialize)]
struct GeminiGoogleSearch {}

#[derive(Debug, Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    grounding_metadata: Option<GeminiGroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GeminiGroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GeminiGroundingChunk {
    web: Option<GeminiWebChunk>,
}

#[derive(Debug, Deserialize)]
struct GeminiWebChunk {
    #[serde(default)]
    uri: String,
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}
