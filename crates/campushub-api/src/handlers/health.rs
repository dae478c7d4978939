//! Health check handlers.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use campushub_realtime::metrics::MetricsSnapshot;

use crate::state::AppState;

/// Basic health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Detailed health response with engine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// Service status.
    pub status: String,
    /// Live connection count.
    pub connections: usize,
    /// Distinct principals currently online.
    pub online_principals: usize,
    /// Active channel count.
    pub channels: usize,
    /// Engine metrics counters.
    pub metrics: MetricsSnapshot,
}

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/health/detailed
pub async fn health_detailed(State(state): State<AppState>) -> Json<DetailedHealthResponse> {
    Json(DetailedHealthResponse {
        status: "ok".to_string(),
        connections: state.engine.registry.connection_count(),
        online_principals: state.engine.registry.principal_count(),
        channels: state.engine.channels.channel_count(),
        metrics: state.engine.metrics.snapshot(),
    })
}
