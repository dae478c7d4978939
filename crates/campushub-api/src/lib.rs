//! # campushub-api
//!
//! Thin axum surface over the realtime engine: the WebSocket upgrade
//! endpoint, health checks, and the `AppError` → HTTP mapping. All REST
//! CRUD for courses, grades, and announcements lives in the portal
//! backend, not here.

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
