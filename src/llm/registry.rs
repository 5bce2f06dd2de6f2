//! Provider configuration and service lookup

use super::{ConfigurationError, GeminiService, LlmService, LoggingService};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the LLM provider
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    /// Gateway base URL; requests go through it without an API key
    pub gateway: Option<String>,
    pub chat_model: String,
    pub image_model: String,
    pub request_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            gateway: None,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("API_KEY"))
                .ok()
                .filter(|k| !k.is_empty()),
            gateway: std::env::var("LLM_GATEWAY").ok(),
            chat_model: std::env::var("GREEN_LAND_CHAT_MODEL").unwrap_or(defaults.chat_model),
            image_model: std::env::var("GREEN_LAND_IMAGE_MODEL").unwrap_or(defaults.image_model),
            request_timeout: std::env::var("GREEN_LAND_LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map_or(defaults.request_timeout, Duration::from_secs),
        }
    }
}

/// Holds the configured provider, if any.
///
/// A missing credential is not an error until something asks for the
/// service; `service()` then reports a `ConfigurationError`.
pub struct ModelRegistry {
    service: Option<Arc<dyn LlmService>>,
}

impl ModelRegistry {
    /// Create an empty registry for testing purposes
    #[cfg(test)]
    pub fn new_empty() -> Self {
        Self { service: None }
    }

    pub fn new(config: &LlmConfig) -> Self {
        // In gateway mode, use "implicit" as the API key
        // The gateway will handle the actual authentication
        let api_key = if config.gateway.is_some() {
            Some("implicit".to_string())
        } else {
            config.api_key.clone()
        };

        let service = api_key.and_then(|key| match GeminiService::new(key, config) {
            Ok(service) => {
                let service: Arc<dyn LlmService> = Arc::new(service);
                Some(Arc::new(LoggingService::new(service)) as Arc<dyn LlmService>)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create Gemini client");
                None
            }
        });

        Self { service }
    }

    /// Wrap an already constructed service
    #[cfg(test)]
    pub fn with_service(service: Arc<dyn LlmService>) -> Self {
        Self {
            service: Some(service),
        }
    }

    /// Get the configured service
    pub fn service(&self) -> Result<Arc<dyn LlmService>, ConfigurationError> {
        self.service.clone().ok_or(ConfigurationError)
    }

    /// Check if a provider is configured
    pub fn is_configured(&self) -> bool {
        self.service.is_some()
    }
}
