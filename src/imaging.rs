//! Image identification and generation
//!
//! Uploads are validated locally before anything reaches the provider.

use crate::catalog::{DEFAULT_IDENTIFY_PROMPT, IDENTIFY_INSTRUCTION};
use crate::llm::{ContentBlock, GeneratedImage, LlmError, LlmMessage, LlmRequest, LlmService};
use crate::normalize::{normalize, Reply};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;
use thiserror::Error;

/// Largest accepted upload (4 MiB, inline data limit)
pub const MAX_UPLOAD_BYTES: usize = 4 * 1024 * 1024;

/// Raster formats the identify flow accepts
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Image is too large. Please select a file smaller than 4MB.")]
    TooLarge { size: usize },
    #[error("Unsupported image type {0}. Please use a PNG, JPEG or WebP image.")]
    UnsupportedType(String),
    #[error("Please select an image to identify.")]
    Missing,
}

/// A file picked by the user, before validation
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// A validated image ready for the identify call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageUpload {
    pub mime_type: String,
    pub size_bytes: usize,
    #[serde(skip)]
    data: String,
    pub preview_url: String,
}

impl ImageUpload {
    pub fn validate(file: ImageFile) -> Result<Self, ValidationError> {
        if file.bytes.is_empty() {
            return Err(ValidationError::Missing);
        }
        if file.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(ValidationError::TooLarge {
                size: file.bytes.len(),
            });
        }
        if !ACCEPTED_MIME_TYPES.contains(&file.mime_type.as_str()) {
            return Err(ValidationError::UnsupportedType(file.mime_type));
        }

        let data = BASE64.encode(&file.bytes);
        Ok(Self {
            preview_url: format!("data:{};base64,{data}", file.mime_type),
            size_bytes: file.bytes.len(),
            mime_type: file.mime_type,
            data,
        })
    }

    /// Base64 payload without the `data:` prefix
    pub fn base64(&self) -> &str {
        &self.data
    }
}

/// Ask the provider what the image shows.
///
/// One stateless request; an empty question falls back to a generic one.
pub async fn identify(
    service: &dyn LlmService,
    prompt: &str,
    image: &ImageUpload,
) -> Result<Reply, LlmError> {
    let question = if prompt.trim().is_empty() {
        DEFAULT_IDENTIFY_PROMPT
    } else {
        prompt
    };

    let request = LlmRequest::new(vec![LlmMessage::user(vec![
        ContentBlock::image(image.mime_type.clone(), image.base64()),
        ContentBlock::text(question),
    ])])
    .with_system(IDENTIFY_INSTRUCTION);

    let response = service.complete(&request).await?;
    Ok(normalize(&response))
}

/// Generate an image from a description
pub async fn generate(service: &dyn LlmService, prompt: &str) -> Result<GeneratedImage, LlmError> {
    service.generate_image(prompt.trim()).await
}
