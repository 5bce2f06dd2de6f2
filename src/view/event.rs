//! Events that drive the view

use crate::imaging::ImageFile;
use crate::llm::GeneratedImage;
use crate::normalize::Reply;
use crate::session::SessionError;

/// Events that trigger view transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User actions
    GetStarted,
    SelectTopic {
        key: String,
    },
    ToggleTooltip,
    Search {
        query: String,
    },
    /// The call to action on the topic info screen
    StartTopic,
    ShowImageGenerator,
    ShowImageIdentifier,
    SendMessage {
        text: String,
    },
    /// `None` when the picker was closed without a file
    SelectImage {
        file: Option<ImageFile>,
    },
    SubmitIdentification {
        prompt: String,
    },
    GenerateImage {
        prompt: String,
    },
    Back,

    // Completions
    ReplyReady {
        epoch: u64,
        outcome: Result<Reply, FailureKind>,
    },
    ImageReady {
        epoch: u64,
        outcome: Result<GeneratedImage, FailureKind>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::GetStarted => "get_started",
            Event::SelectTopic { .. } => "select_topic",
            Event::ToggleTooltip => "toggle_tooltip",
            Event::Search { .. } => "search",
            Event::StartTopic => "start_topic",
            Event::ShowImageGenerator => "show_image_generator",
            Event::ShowImageIdentifier => "show_image_identifier",
            Event::SendMessage { .. } => "send_message",
            Event::SelectImage { .. } => "select_image",
            Event::SubmitIdentification { .. } => "submit_identification",
            Event::GenerateImage { .. } => "generate_image",
            Event::Back => "back",
            Event::ReplyReady { .. } => "reply_ready",
            Event::ImageReady { .. } => "image_ready",
        }
    }
}

/// Why a provider-backed action produced no result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No credential configured
    Configuration,
    /// Transport or API failure
    Provider,
    /// Abandoned by navigation
    Cancelled,
}

impl From<&SessionError> for FailureKind {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::Configuration(_) => FailureKind::Configuration,
            SessionError::Provider(_) => FailureKind::Provider,
            SessionError::Cancelled => FailureKind::Cancelled,
        }
    }
}
