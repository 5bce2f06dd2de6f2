//! Runtime for driving one visitor's view
//!
//! The controller applies events through the pure transition function and
//! executes the resulting effects. Provider calls run on spawned tasks and
//! report back as completion events tagged with the epoch they started in.

use crate::catalog::SYSTEM_INSTRUCTION;
use crate::imaging;
use crate::llm::ModelRegistry;
use crate::session::{Session, SessionError, SessionMode};
use crate::tools::ToolRegistry;
use crate::view::{transition, Effect, Event, FailureKind, TransitionError, ViewState};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

struct Inner {
    state: ViewState,
    /// Live chat session, absent while a turn is in flight
    session: Option<Session>,
    /// Cancels in-flight work of the current conversation
    cancel: CancellationToken,
}

pub struct Controller {
    id: String,
    registry: Arc<ModelRegistry>,
    tools: Arc<ToolRegistry>,
    inner: Mutex<Inner>,
    updates: watch::Sender<ViewState>,
}

impl Controller {
    pub fn new(registry: Arc<ModelRegistry>, tools: Arc<ToolRegistry>) -> Self {
        let state = ViewState::new();
        let (updates, _) = watch::channel(state.clone());
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            registry,
            tools,
            inner: Mutex::new(Inner {
                state,
                session: None,
                cancel: CancellationToken::new(),
            }),
            updates,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Latest published view state
    pub fn snapshot(&self) -> ViewState {
        self.updates.borrow().clone()
    }

    /// Watch view state changes
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.updates.subscribe()
    }

    /// Apply an event and start any work it calls for.
    ///
    /// Returns the state right after the transition; provider work finishes
    /// later and is published through [`Controller::subscribe`].
    pub async fn dispatch(self: &Arc<Self>, event: Event) -> Result<ViewState, TransitionError> {
        let mut inner = self.inner.lock().await;
        let event_name = event.name();
        let result = transition(&inner.state, event).inspect_err(|e| {
            tracing::debug!(controller = %self.id, event = event_name, error = %e, "Event rejected");
        })?;

        inner.state = result.new_state;
        self.updates.send_replace(inner.state.clone());

        for effect in result.effects {
            self.execute(&mut inner, effect);
        }
        Ok(inner.state.clone())
    }

    /// Release the session and cancel anything in flight
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        end_session(&self.id, &mut inner);
    }

    fn execute(self: &Arc<Self>, inner: &mut Inner, effect: Effect) {
        match effect {
            Effect::EndSession => end_session(&self.id, inner),

            Effect::RunTurn { epoch, mode, text } => {
                let this = Arc::clone(self);
                let session = inner.session.take();
                let cancel = inner.cancel.clone();
                tokio::spawn(async move {
                    this.run_turn(epoch, mode, text, session, cancel).await;
                });
            }

            Effect::IdentifyImage {
                epoch,
                prompt,
                image,
            } => {
                let this = Arc::clone(self);
                let cancel = inner.cancel.clone();
                tokio::spawn(async move {
                    let outcome = match this.registry.service() {
                        Err(e) => Err(this.report(&SessionError::from(e))),
                        Ok(service) => {
                            tokio::select! {
                                biased;
                                () = cancel.cancelled() => Err(FailureKind::Cancelled),
                                result = imaging::identify(service.as_ref(), &prompt, &image) => {
                                    result.map_err(|e| this.report(&SessionError::from(e)))
                                }
                            }
                        }
                    };
                    this.complete(epoch, Event::ReplyReady { epoch, outcome }, None)
                        .await;
                });
            }

            Effect::GenerateImage { epoch, prompt } => {
                let this = Arc::clone(self);
                let cancel = inner.cancel.clone();
                tokio::spawn(async move {
                    let outcome = match this.registry.service() {
                        Err(e) => Err(this.report(&SessionError::from(e))),
                        Ok(service) => {
                            tokio::select! {
                                biased;
                                () = cancel.cancelled() => Err(FailureKind::Cancelled),
                                result = imaging::generate(service.as_ref(), &prompt) => {
                                    result.map_err(|e| this.report(&SessionError::from(e)))
                                }
                            }
                        }
                    };
                    this.complete(epoch, Event::ImageReady { epoch, outcome }, None)
                        .await;
                });
            }
        }
    }

    async fn run_turn(
        &self,
        epoch: u64,
        mode: SessionMode,
        text: String,
        session: Option<Session>,
        cancel: CancellationToken,
    ) {
        let session = match session.filter(|s| s.mode() == mode) {
            Some(session) => Ok(session),
            None => Session::start(
                Arc::clone(&self.registry),
                mode,
                SYSTEM_INSTRUCTION,
                match mode {
                    SessionMode::ToolChat => Some(Arc::clone(&self.tools)),
                    SessionMode::GroundedSearch => None,
                },
            ),
        };

        let mut session = match session {
            Ok(session) => session,
            Err(e) => {
                let outcome = Err(self.report(&e));
                self.complete(epoch, Event::ReplyReady { epoch, outcome }, None)
                    .await;
                return;
            }
        };

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(SessionError::Cancelled),
            result = session.send_turn(&text) => result,
        };
        let outcome = result.map_err(|e| self.report(&e));
        self.complete(epoch, Event::ReplyReady { epoch, outcome }, Some(session))
            .await;
    }

    /// Apply a completion unless the user has moved on since it started
    async fn complete(&self, epoch: u64, event: Event, session: Option<Session>) {
        let mut inner = self.inner.lock().await;
        if inner.state.epoch != epoch {
            tracing::debug!(
                controller = %self.id,
                started = epoch,
                current = inner.state.epoch,
                "Discarding stale completion"
            );
            return;
        }
        if session.is_some() {
            inner.session = session;
        }

        match transition(&inner.state, event) {
            Ok(result) => {
                inner.state = result.new_state;
                self.updates.send_replace(inner.state.clone());
            }
            Err(e) => {
                tracing::warn!(controller = %self.id, error = %e, "Completion rejected");
            }
        }
    }

    fn report(&self, err: &SessionError) -> FailureKind {
        match err {
            SessionError::Configuration(e) => {
                tracing::error!(controller = %self.id, error = %e, "Assistant is not configured");
            }
            SessionError::Provider(e) => {
                tracing::warn!(controller = %self.id, error = %e, kind = ?e.kind, "Provider call failed");
            }
            SessionError::Cancelled => {
                tracing::info!(controller = %self.id, "Request cancelled");
            }
        }
        FailureKind::from(err)
    }
}

fn end_session(controller: &str, inner: &mut Inner) {
    if let Some(session) = inner.session.take() {
        tracing::info!(controller = %controller, session = %session.id(), "Session ended");
    }
    inner.cancel.cancel();
    inner.cancel = CancellationToken::new();
}
