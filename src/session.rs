//! Conversation session
//!
//! A session turns one user utterance into one normalized reply, using one of
//! two backends:
//!
//! - tool chat: an owned [`ChatHandle`] carrying the conversation, able to
//!   run local tools the provider asks for mid-turn;
//! - grounded search: no handle, a rolling history resent in full with every
//!   request alongside the web-search directive.
//!
//! Exactly one backend is live per session. Switching modes means starting a
//! new session.

use crate::llm::{
    ChatHandle, ConfigurationError, ContentBlock, LlmError, LlmMessage, LlmRequest, LlmResponse,
    ModelRegistry,
};
use crate::normalize::{normalize, Reply};
use crate::tools::{Resolution, ToolRegistry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Upper bound on tool calls resolved within a single turn
pub const MAX_TOOL_ROUNDS: usize = 5;

/// Which backend a session uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    ToolChat,
    GroundedSearch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRole {
    User,
    Model,
}

/// One side of a grounded-search exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub role: HistoryRole,
    pub text: String,
}

impl HistoryTurn {
    fn to_message(&self) -> LlmMessage {
        let content = vec![ContentBlock::text(self.text.clone())];
        match self.role {
            HistoryRole::User => LlmMessage::user(content),
            HistoryRole::Model => LlmMessage::model(content),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("provider error: {0}")]
    Provider(#[from] LlmError),
    #[error("turn cancelled")]
    Cancelled,
}

enum Backend {
    ToolChat {
        handle: ChatHandle,
        tools: Arc<ToolRegistry>,
    },
    GroundedSearch {
        history: Vec<HistoryTurn>,
    },
}

/// Where the tool loop stands after each provider response
enum TurnPhase {
    AwaitingText(LlmResponse),
    AwaitingToolResult {
        response: LlmResponse,
        name: String,
        args: Value,
    },
}

impl TurnPhase {
    /// Only the first requested call is considered
    fn from_response(response: LlmResponse) -> Self {
        let call = response
            .first_function_call()
            .map(|(name, args)| (name.to_string(), args.clone()));
        match call {
            Some((name, args)) => TurnPhase::AwaitingToolResult {
                response,
                name,
                args,
            },
            None => TurnPhase::AwaitingText(response),
        }
    }
}

pub struct Session {
    id: String,
    registry: Arc<ModelRegistry>,
    system: String,
    backend: Backend,
}

impl Session {
    /// Start a session.
    ///
    /// Tool chat needs the provider right away and fails with a configuration
    /// error when no credential is set. Grounded search defers that check to
    /// the first turn.
    pub fn start(
        registry: Arc<ModelRegistry>,
        mode: SessionMode,
        system_instruction: impl Into<String>,
        tools: Option<Arc<ToolRegistry>>,
    ) -> Result<Self, SessionError> {
        let system = system_instruction.into();
        let backend = match mode {
            SessionMode::ToolChat => {
                let service = registry.service()?;
                let tools = tools.unwrap_or_default();
                Backend::ToolChat {
                    handle: ChatHandle::new(service, system.clone(), tools.definitions()),
                    tools,
                }
            }
            SessionMode::GroundedSearch => Backend::GroundedSearch {
                history: Vec::new(),
            },
        };

        let id = uuid::Uuid::new_v4().to_string();
        tracing::info!(session = %id, ?mode, "Session started");

        Ok(Self {
            id,
            registry,
            system,
            backend,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> SessionMode {
        match self.backend {
            Backend::ToolChat { .. } => SessionMode::ToolChat,
            Backend::GroundedSearch { .. } => SessionMode::GroundedSearch,
        }
    }

    /// Grounded-search history; always empty for tool chat
    #[cfg(test)]
    pub fn history(&self) -> &[HistoryTurn] {
        match &self.backend {
            Backend::GroundedSearch { history } => history,
            Backend::ToolChat { .. } => &[],
        }
    }

    /// Send one user turn and return the normalized reply.
    ///
    /// On failure the session is left as it was before the call.
    pub async fn send_turn(&mut self, text: &str) -> Result<Reply, SessionError> {
        tracing::debug!(session = %self.id, mode = ?self.mode(), "Sending turn");
        match &mut self.backend {
            Backend::GroundedSearch { history } => {
                let service = self.registry.service()?;

                let mut messages: Vec<LlmMessage> =
                    history.iter().map(HistoryTurn::to_message).collect();
                messages.push(LlmMessage::user(vec![ContentBlock::text(text)]));

                let request = LlmRequest::new(messages)
                    .with_system(self.system.clone())
                    .with_search();
                let response = service.complete(&request).await?;
                let reply = normalize(&response);

                history.push(HistoryTurn {
                    role: HistoryRole::User,
                    text: text.to_string(),
                });
                history.push(HistoryTurn {
                    role: HistoryRole::Model,
                    text: reply.text.clone(),
                });
                Ok(reply)
            }
            Backend::ToolChat { handle, tools } => {
                let mark = handle.checkpoint();
                let result = run_tool_turn(handle, tools, text, &self.id).await;
                if result.is_err() {
                    handle.rollback(mark);
                }
                result
            }
        }
    }
}

async fn run_tool_turn(
    handle: &mut ChatHandle,
    tools: &ToolRegistry,
    text: &str,
    session_id: &str,
) -> Result<Reply, SessionError> {
    let first = handle.send(vec![ContentBlock::text(text)]).await?;
    let mut phase = TurnPhase::from_response(first);
    let mut rounds = 0;

    loop {
        match phase {
            TurnPhase::AwaitingText(response) => return Ok(normalize(&response)),
            TurnPhase::AwaitingToolResult {
                response,
                name,
                args,
            } => {
                if rounds == MAX_TOOL_ROUNDS {
                    tracing::warn!(
                        session = %session_id,
                        tool = %name,
                        rounds,
                        "Tool loop bound reached, returning available text"
                    );
                    return Ok(normalize(&response));
                }

                match tools.resolve(&name, &args).await {
                    Resolution::Unhandled => {
                        tracing::info!(session = %session_id, tool = %name, "Unhandled tool call, ending turn");
                        return Ok(normalize(&response));
                    }
                    Resolution::Handled(payload) => {
                        rounds += 1;
                        let next = handle
                            .send(vec![ContentBlock::function_response(name, payload)])
                            .await?;
                        phase = TurnPhase::from_response(next);
                    }
                }
            }
        }
    }
}
