//! CampusHub Realtime Server
//!
//! Main entry point that wires the directory store, identity verifier,
//! and realtime engine together and serves the WebSocket endpoint.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use campushub_api::AppState;
use campushub_auth::jwt::decoder::TokenDecoder;
use campushub_auth::verifier::JwtIdentityVerifier;
use campushub_core::config::AppConfig;
use campushub_core::error::AppError;
use campushub_directory::{DirectoryStore, HttpDirectory, InMemoryDirectory};
use campushub_realtime::RealtimeEngine;

#[tokio::main]
async fn main() {
    let env = std::env::var("CAMPUSHUB_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function.
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting CampusHub realtime server v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Directory store (external collaborator) ──────────
    let directory: Arc<dyn DirectoryStore> = match config.directory.provider.as_str() {
        "memory" => {
            tracing::warn!("Using in-memory directory store; intended for development only");
            Arc::new(InMemoryDirectory::new())
        }
        _ => Arc::new(HttpDirectory::new(&config.directory)?),
    };

    // ── Step 2: Identity verifier ────────────────────────────────
    let verifier = Arc::new(JwtIdentityVerifier::new(
        TokenDecoder::new(&config.auth),
        directory.clone(),
    ));

    // ── Step 3: Realtime engine ──────────────────────────────────
    let engine = Arc::new(RealtimeEngine::new(
        config.realtime.clone(),
        directory.clone(),
    ));

    // ── Step 4: HTTP surface ─────────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(Arc::new(config), engine.clone(), verifier);
    let router = campushub_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(addr = %addr, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(engine))
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    Ok(())
}

/// Waits for Ctrl-C, then shuts the engine down.
async fn shutdown_signal(engine: Arc<RealtimeEngine>) {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
    engine.shutdown();
}
