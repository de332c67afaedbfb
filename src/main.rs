//! contextgate - session-aware turn router for tool-using reasoning engines
//!
//! Routes conversational turns through an external engine and decides per
//! turn whether tool output resets, continues or answers from the session's
//! stored context.

mod api;
mod config;
mod engine;
mod memory;
mod presentation;
mod runtime;

use api::{create_router, AppState};
use config::RouterConfig;
use engine::{HttpEngine, LoggingEngine, ReasoningEngine};
use runtime::{SessionRegistry, SharedEngine};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
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
                .unwrap_or_else(|_| "contextgate=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = RouterConfig::from_env()?;

    if config.engine.url.is_none() {
        tracing::warn!("No engine endpoint configured. Set CONTEXTGATE_ENGINE_URL.");
    }

    // Engine
    let http_engine = HttpEngine::new(&config.engine)?;
    let engine: SharedEngine = Arc::new(LoggingEngine::new(
        Arc::new(http_engine),
        config.engine.timeout,
    ));
    tracing::info!(
        engine = %engine.engine_id(),
        tool_servers = ?config.engine.tool_servers,
        emit_trace = config.controller.emit_trace,
        record_keys = ?config.controller.record_keys,
        "Engine initialized"
    );

    // Session registry
    let registry = Arc::new(SessionRegistry::new(
        engine,
        config.system_prompt.clone(),
        config.controller.clone(),
    ));
    let state = AppState::new(Arc::clone(&registry));

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(CompressionLayer::new()),
    );

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("contextgate listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let ended = registry.end_all().await;
    tracing::info!(sessions = ended, "Server stopped; sessions discarded");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
