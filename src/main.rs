//! Green Land - organic farming assistant
//!
//! A Rust backend that drives the assistant's screens and conversations and
//! talks to the Gemini API on the visitor's behalf.

mod api;
mod catalog;
mod imaging;
mod llm;
mod normalize;
mod runtime;
mod session;
mod tools;
mod view;

use api::{create_router, AppState};
use llm::{LlmConfig, ModelRegistry};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tools::ToolRegistry;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "green_land=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let port: u16 = std::env::var("GREEN_LAND_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    // Missing credentials are reported on first use, not here
    let llm_config = LlmConfig::from_env();
    let llm_registry = Arc::new(ModelRegistry::new(&llm_config));
    if llm_registry.is_configured() {
        tracing::info!(
            chat_model = %llm_config.chat_model,
            image_model = %llm_config.image_model,
            gateway = llm_config.gateway.is_some(),
            "LLM registry initialized"
        );
    } else {
        tracing::warn!("No Gemini API key configured. Set GEMINI_API_KEY, API_KEY or LLM_GATEWAY.");
    }

    let state = AppState::new(llm_registry, Arc::new(ToolRegistry::builtin()));

    // Visitors that never delete their session are swept after this long
    let idle_limit = Duration::from_secs(
        std::env::var("GREEN_LAND_SESSION_IDLE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1800),
    );
    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let expired = sweeper.expire_idle(idle_limit).await;
            if expired > 0 {
                tracing::debug!(expired, "Swept idle controllers");
            }
        }
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Green Land server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
