//! View state types

use crate::catalog::Topic;
use crate::imaging::ImageUpload;
use crate::llm::GeneratedImage;
use crate::normalize::Source;
use crate::session::SessionMode;
use serde::Serialize;

/// Who wrote a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Ai,
}

/// Transcript entry; never changed once appended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
}

/// The screen being shown.
///
/// Screens that need a topic carry it, so an identify screen without a
/// selected topic cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    Landing,
    Welcome,
    TopicInfo {
        topic: &'static Topic,
        show_tooltip: bool,
    },
    Chat {
        mode: SessionMode,
    },
    ImageGenerate {
        image: Option<GeneratedImage>,
        error: Option<String>,
    },
    ImageIdentify {
        topic: &'static Topic,
        selected: Option<ImageUpload>,
        error: Option<String>,
    },
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Landing => "landing",
            Screen::Welcome => "welcome",
            Screen::TopicInfo { .. } => "topic_info",
            Screen::Chat { .. } => "chat",
            Screen::ImageGenerate { .. } => "image_generate",
            Screen::ImageIdentify { .. } => "image_identify",
        }
    }
}

/// Work in flight; its presence is the busy flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pending {
    Reply,
    Identification,
    Image,
}

/// Everything the front end renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    #[serde(flatten)]
    pub screen: Screen,
    pub transcript: Vec<Message>,
    pub pending: Option<Pending>,
    /// Bumped on every return to welcome; tags in-flight work
    pub epoch: u64,
    #[serde(skip)]
    next_message: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Landing,
            transcript: Vec::new(),
            pending: None,
            epoch: 0,
            next_message: 0,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn with_screen(&self, screen: Screen) -> Self {
        Self {
            screen,
            ..self.clone()
        }
    }

    pub(crate) fn push_message(
        &mut self,
        sender: Sender,
        text: impl Into<String>,
        sources: Vec<Source>,
    ) {
        self.next_message += 1;
        self.transcript.push(Message {
            id: format!("msg-{}", self.next_message),
            text: text.into(),
            sender,
            sources,
        });
    }
}
