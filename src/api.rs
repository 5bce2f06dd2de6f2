//! HTTP API for Green Land
//!
//! One controller per visitor, addressed by id.

mod handlers;
mod types;

pub use handlers::create_router;

use crate::llm::ModelRegistry;
use crate::runtime::Controller;
use crate::tools::ToolRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// A live controller and when a request last touched it
struct Entry {
    controller: Arc<Controller>,
    last_seen: Instant,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    controllers: Arc<RwLock<HashMap<String, Entry>>>,
    pub llm_registry: Arc<ModelRegistry>,
    pub tools: Arc<ToolRegistry>,
}

impl AppState {
    pub fn new(llm_registry: Arc<ModelRegistry>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            controllers: Arc::new(RwLock::new(HashMap::new())),
            llm_registry,
            tools,
        }
    }

    async fn create_controller(&self) -> Arc<Controller> {
        let controller = Arc::new(Controller::new(
            Arc::clone(&self.llm_registry),
            Arc::clone(&self.tools),
        ));
        self.controllers.write().await.insert(
            controller.id().to_string(),
            Entry {
                controller: Arc::clone(&controller),
                last_seen: Instant::now(),
            },
        );
        tracing::info!(controller = %controller.id(), "Controller created");
        controller
    }

    async fn controller(&self, id: &str) -> Option<Arc<Controller>> {
        let mut controllers = self.controllers.write().await;
        let entry = controllers.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(Arc::clone(&entry.controller))
    }

    async fn remove_controller(&self, id: &str) -> Option<Arc<Controller>> {
        self.controllers
            .write()
            .await
            .remove(id)
            .map(|entry| entry.controller)
    }

    /// Shut down and forget controllers untouched for at least `max_idle`.
    /// Controllers waiting on the provider are kept. Returns how many were removed.
    pub async fn expire_idle(&self, max_idle: Duration) -> usize {
        let expired: Vec<(String, Arc<Controller>)> = {
            let mut controllers = self.controllers.write().await;
            let ids: Vec<String> = controllers
                .iter()
                .filter(|(_, entry)| {
                    entry.last_seen.elapsed() >= max_idle && !entry.controller.snapshot().is_busy()
                })
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| controllers.remove(&id).map(|entry| (id, entry.controller)))
                .collect()
        };

        for (id, controller) in &expired {
            controller.shutdown().await;
            tracing::info!(controller = %id, "Idle controller expired");
        }
        expired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::MockLlmService;
    use crate::view::{Event, Screen};

    fn state() -> AppState {
        let registry = Arc::new(ModelRegistry::with_service(Arc::new(MockLlmService::new())));
        AppState::new(registry, Arc::new(ToolRegistry::builtin()))
    }

    #[tokio::test]
    async fn test_idle_controllers_expire() {
        let state = state();
        let controller = state.create_controller().await;
        let id = controller.id().to_string();

        assert_eq!(state.expire_idle(Duration::from_secs(3600)).await, 0);
        assert!(state.controller(&id).await.is_some());

        assert_eq!(state.expire_idle(Duration::ZERO).await, 1);
        assert!(state.controller(&id).await.is_none());
        assert!(state.remove_controller(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_touched_controller_survives_expiry() {
        let state = state();
        let stale = state.create_controller().await;
        let fresh = state.create_controller().await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        fresh.dispatch(Event::GetStarted).await.unwrap();
        assert!(state.controller(fresh.id()).await.is_some());

        assert_eq!(state.expire_idle(Duration::from_millis(200)).await, 1);
        assert!(state.controller(stale.id()).await.is_none());
        let fresh = state.controller(fresh.id()).await.unwrap();
        assert!(matches!(fresh.snapshot().screen, Screen::Welcome));
    }
}
