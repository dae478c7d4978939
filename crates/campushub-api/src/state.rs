//! Application state shared across all handlers.

use std::sync::Arc;

use campushub_auth::IdentityVerifier;
use campushub_core::config::AppConfig;
use campushub_realtime::RealtimeEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every axum handler via `State<AppState>`. All fields are
/// `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// The realtime engine.
    pub engine: Arc<RealtimeEngine>,
    /// Identity verifier for handshake credentials.
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish()
    }
}

impl AppState {
    /// Creates the application state.
    pub fn new(
        config: Arc<AppConfig>,
        engine: Arc<RealtimeEngine>,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            config,
            engine,
            verifier,
        }
    }
}
