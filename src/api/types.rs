//! API request and response types

use crate::catalog::Topic;
use crate::imaging::ImageFile;
use crate::view::{Event, ViewState};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

/// User action posted to a controller
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserAction {
    GetStarted,
    SelectTopic {
        key: String,
    },
    ToggleTooltip,
    Search {
        query: String,
    },
    StartTopic,
    ShowImageGenerator,
    ShowImageIdentifier,
    SendMessage {
        text: String,
    },
    SelectImage {
        #[serde(default)]
        image: Option<ImageAttachment>,
    },
    SubmitIdentification {
        #[serde(default)]
        prompt: String,
    },
    GenerateImage {
        prompt: String,
    },
    Back,
}

/// Image file sent inline as base64
#[derive(Debug, Clone, Deserialize)]
pub struct ImageAttachment {
    pub data: String,
    pub media_type: String,
}

impl UserAction {
    pub fn into_event(self) -> Result<Event, base64::DecodeError> {
        Ok(match self {
            UserAction::GetStarted => Event::GetStarted,
            UserAction::SelectTopic { key } => Event::SelectTopic { key },
            UserAction::ToggleTooltip => Event::ToggleTooltip,
            UserAction::Search { query } => Event::Search { query },
            UserAction::StartTopic => Event::StartTopic,
            UserAction::ShowImageGenerator => Event::ShowImageGenerator,
            UserAction::ShowImageIdentifier => Event::ShowImageIdentifier,
            UserAction::SendMessage { text } => Event::SendMessage { text },
            UserAction::SelectImage { image } => Event::SelectImage {
                file: image
                    .map(|image| -> Result<ImageFile, base64::DecodeError> {
                        Ok(ImageFile {
                            bytes: BASE64.decode(image.data.as_bytes())?,
                            mime_type: image.media_type,
                        })
                    })
                    .transpose()?,
            },
            UserAction::SubmitIdentification { prompt } => Event::SubmitIdentification { prompt },
            UserAction::GenerateImage { prompt } => Event::GenerateImage { prompt },
            UserAction::Back => Event::Back,
        })
    }
}

/// Response carrying a controller's view
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub state: ViewState,
}

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    pub topics: &'static [Topic],
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_select_image_decodes_base64() {
        let action: UserAction = serde_json::from_value(json!({
            "type": "select_image",
            "image": {"data": "iVBORw==", "media_type": "image/png"}
        }))
        .unwrap();
        match action.into_event().unwrap() {
            Event::SelectImage { file: Some(file) } => {
                assert_eq!(file.mime_type, "image/png");
                assert_eq!(file.bytes, vec![0x89, 0x50, 0x4e, 0x47]);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_select_image_without_file() {
        let action: UserAction =
            serde_json::from_value(json!({"type": "select_image"})).unwrap();
        assert!(matches!(
            action.into_event().unwrap(),
            Event::SelectImage { file: None }
        ));
    }

    #[test]
    fn test_bad_base64_rejected() {
        let action: UserAction = serde_json::from_value(json!({
            "type": "select_image",
            "image": {"data": "not base64!", "media_type": "image/png"}
        }))
        .unwrap();
        assert!(action.into_event().is_err());
    }

    #[test]
    fn test_identify_prompt_defaults_to_empty() {
        let action: UserAction =
            serde_json::from_value(json!({"type": "submit_identification"})).unwrap();
        assert!(matches!(
            action.into_event().unwrap(),
            Event::SubmitIdentification { prompt } if prompt.is_empty()
        ));
    }
}
