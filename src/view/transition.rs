//! Pure view transition function

use super::{Effect, Event, FailureKind, Pending, Screen, Sender, ViewState};
use crate::catalog::{self, Topic, TopicKind, DEFAULT_IDENTIFY_PROMPT};
use crate::imaging::{ImageUpload, ValidationError};
use crate::normalize::Reply;
use crate::session::SessionMode;
use thiserror::Error;

pub const CHAT_FAILURE_TEXT: &str = "Sorry, something went wrong. Please try again.";
pub const IDENTIFY_FAILURE_TEXT: &str = "Sorry, I couldn't identify the image. Please try again.";
pub const GENERATE_FAILURE_TEXT: &str = "Failed to generate image. Please try again.";
pub const CONFIGURATION_FAILURE_TEXT: &str =
    "The assistant is not configured yet. Please set an API key and try again.";

/// Result of a transition
#[derive(Debug, Clone)]
pub struct TransitionResult {
    pub new_state: ViewState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ViewState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Still waiting for the previous reply")]
    Busy,
    #[error("Input is empty")]
    EmptyInput,
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function.
///
/// Given the same state and event it always returns the same result and
/// performs no I/O.
pub fn transition(state: &ViewState, event: Event) -> Result<TransitionResult, TransitionError> {
    match (&state.screen, event) {
        // Back works from everywhere and ends whatever was in flight
        (_, Event::Back) => Ok(back(state)),

        (_, Event::ReplyReady { epoch, outcome }) => Ok(reply_ready(state, epoch, outcome)),

        (_, Event::ImageReady { epoch, outcome }) => {
            if epoch != state.epoch || state.pending != Some(Pending::Image) {
                return Ok(TransitionResult::new(state.clone()));
            }
            let mut next = state.clone();
            next.pending = None;
            next.screen = match outcome {
                Ok(image) => Screen::ImageGenerate {
                    image: Some(image),
                    error: None,
                },
                Err(kind) => Screen::ImageGenerate {
                    image: None,
                    error: Some(failure_text(kind, GENERATE_FAILURE_TEXT).to_string()),
                },
            };
            Ok(TransitionResult::new(next))
        }

        (Screen::Landing, Event::GetStarted) => {
            Ok(TransitionResult::new(state.with_screen(Screen::Welcome)))
        }

        (Screen::Welcome, Event::SelectTopic { key }) => {
            let topic = catalog::topic(&key).ok_or(TransitionError::UnknownTopic(key))?;
            let screen = match topic.kind {
                TopicKind::ImageGenerate => empty_generator(),
                TopicKind::Chat | TopicKind::ImageIdentify => Screen::TopicInfo {
                    topic,
                    show_tooltip: false,
                },
            };
            Ok(TransitionResult::new(state.with_screen(screen)))
        }

        (Screen::Welcome, Event::Search { query }) => {
            if query.trim().is_empty() {
                return Err(TransitionError::EmptyInput);
            }
            Ok(start_chat(state, SessionMode::GroundedSearch, query))
        }

        (Screen::Welcome, Event::ShowImageGenerator) => {
            Ok(TransitionResult::new(state.with_screen(empty_generator())))
        }

        (Screen::Welcome, Event::ShowImageIdentifier) => {
            let screen = empty_identifier(catalog::image_id_topic());
            Ok(TransitionResult::new(state.with_screen(screen)))
        }

        (
            Screen::TopicInfo {
                topic,
                show_tooltip,
            },
            Event::ToggleTooltip,
        ) => {
            let mut next = state.clone();
            if topic.tooltip.is_some() {
                next.screen = Screen::TopicInfo {
                    topic: *topic,
                    show_tooltip: !*show_tooltip,
                };
            }
            Ok(TransitionResult::new(next))
        }

        (Screen::TopicInfo { topic, .. }, Event::StartTopic) => match topic.kind {
            TopicKind::Chat => Ok(start_chat(state, SessionMode::ToolChat, topic.prompt)),
            TopicKind::ImageIdentify => {
                Ok(TransitionResult::new(state.with_screen(empty_identifier(*topic))))
            }
            TopicKind::ImageGenerate => {
                Ok(TransitionResult::new(state.with_screen(empty_generator())))
            }
        },

        (Screen::Chat { mode }, Event::SendMessage { text }) => {
            if state.is_busy() {
                return Err(TransitionError::Busy);
            }
            if text.trim().is_empty() {
                return Err(TransitionError::EmptyInput);
            }
            let mut next = state.clone();
            next.push_message(Sender::User, text.clone(), vec![]);
            next.pending = Some(Pending::Reply);
            Ok(TransitionResult::new(next).with_effect(Effect::RunTurn {
                epoch: state.epoch,
                mode: *mode,
                text,
            }))
        }

        (Screen::ImageIdentify { topic, .. }, Event::SelectImage { file }) => {
            let topic = *topic;
            let validated = file
                .ok_or(ValidationError::Missing)
                .and_then(ImageUpload::validate);
            let screen = match validated {
                Ok(upload) => Screen::ImageIdentify {
                    topic,
                    selected: Some(upload),
                    error: None,
                },
                Err(err) => Screen::ImageIdentify {
                    topic,
                    selected: None,
                    error: Some(err.to_string()),
                },
            };
            Ok(TransitionResult::new(state.with_screen(screen)))
        }

        (
            Screen::ImageIdentify {
                topic, selected, ..
            },
            Event::SubmitIdentification { prompt },
        ) => {
            let topic = *topic;
            let Some(image) = selected.clone() else {
                let screen = Screen::ImageIdentify {
                    topic,
                    selected: None,
                    error: Some(ValidationError::Missing.to_string()),
                };
                return Ok(TransitionResult::new(state.with_screen(screen)));
            };
            let question = if prompt.trim().is_empty() {
                DEFAULT_IDENTIFY_PROMPT.to_string()
            } else {
                prompt
            };

            let mut next = state.clone();
            next.screen = Screen::Chat {
                mode: SessionMode::ToolChat,
            };
            next.transcript.clear();
            next.push_message(Sender::User, format!("[Image Uploaded] {question}"), vec![]);
            next.pending = Some(Pending::Identification);
            Ok(TransitionResult::new(next)
                .with_effect(Effect::EndSession)
                .with_effect(Effect::IdentifyImage {
                    epoch: state.epoch,
                    prompt: question,
                    image,
                }))
        }

        (Screen::ImageGenerate { .. }, Event::GenerateImage { prompt }) => {
            if state.is_busy() {
                return Err(TransitionError::Busy);
            }
            if prompt.trim().is_empty() {
                return Err(TransitionError::EmptyInput);
            }
            let mut next = state.clone();
            next.screen = empty_generator();
            next.pending = Some(Pending::Image);
            Ok(TransitionResult::new(next).with_effect(Effect::GenerateImage {
                epoch: state.epoch,
                prompt,
            }))
        }

        (screen, event) => Err(TransitionError::InvalidTransition(format!(
            "{} does not accept {}",
            screen.name(),
            event.name()
        ))),
    }
}

fn empty_generator() -> Screen {
    Screen::ImageGenerate {
        image: None,
        error: None,
    }
}

fn empty_identifier(topic: &'static Topic) -> Screen {
    Screen::ImageIdentify {
        topic,
        selected: None,
        error: None,
    }
}

/// Open a chat with `text` as its first user message
fn start_chat(state: &ViewState, mode: SessionMode, text: impl Into<String>) -> TransitionResult {
    let text = text.into();
    let mut next = state.clone();
    next.screen = Screen::Chat { mode };
    next.transcript.clear();
    next.push_message(Sender::User, text.clone(), vec![]);
    next.pending = Some(Pending::Reply);
    TransitionResult::new(next)
        .with_effect(Effect::EndSession)
        .with_effect(Effect::RunTurn {
            epoch: state.epoch,
            mode,
            text,
        })
}

fn back(state: &ViewState) -> TransitionResult {
    let mut next = state.clone();
    next.screen = Screen::Welcome;
    next.transcript.clear();
    next.pending = None;
    next.epoch += 1;
    TransitionResult::new(next).with_effect(Effect::EndSession)
}

fn reply_ready(
    state: &ViewState,
    epoch: u64,
    outcome: Result<Reply, FailureKind>,
) -> TransitionResult {
    let fallback = match state.pending {
        Some(Pending::Reply) => CHAT_FAILURE_TEXT,
        Some(Pending::Identification) => IDENTIFY_FAILURE_TEXT,
        // Stale or unexpected; leave the view alone
        Some(Pending::Image) | None => return TransitionResult::new(state.clone()),
    };
    if epoch != state.epoch {
        return TransitionResult::new(state.clone());
    }

    let mut next = state.clone();
    next.pending = None;
    match outcome {
        // An empty reply appends nothing
        Ok(reply) if reply.is_empty() => {}
        Ok(reply) => next.push_message(Sender::Ai, reply.text, reply.sources),
        Err(FailureKind::Cancelled) => {}
        Err(kind) => next.push_message(Sender::Ai, failure_text(kind, fallback), vec![]),
    }
    TransitionResult::new(next)
}

fn failure_text(kind: FailureKind, fallback: &'static str) -> &'static str {
    match kind {
        FailureKind::Configuration => CONFIGURATION_FAILURE_TEXT,
        FailureKind::Provider | FailureKind::Cancelled => fallback,
    }
}
