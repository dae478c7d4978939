//! # campushub-realtime
//!
//! Real-time presence and scoped-broadcast core for CampusHub. Provides:
//!
//! - Connection registry with multi-device support per principal
//! - Channel membership resolution against the external directory store
//! - A single pure access guard for join/signal authorization
//! - Scoped event routing (principal / channel / global fan-out)
//! - Derived online/offline presence tracking with transition broadcasts
//! - Ephemeral signal relay (typing indicators, read receipts, file shares)
//! - Fan-out bridge for collaborator-produced events (announcements, grades)

pub mod bridge;
pub mod channel;
pub mod connection;
pub mod guard;
pub mod metrics;
pub mod presence;
pub mod server;
pub mod signal;

pub use channel::registry::ChannelRegistry;
pub use channel::resolver::MembershipResolver;
pub use channel::types::ChannelId;
pub use connection::manager::ConnectionManager;
pub use connection::registry::ConnectionRegistry;
pub use presence::tracker::PresenceTracker;
pub use server::RealtimeEngine;
pub use signal::router::EventRouter;
pub use signal::types::{ClientAction, CloseReason, ServerEvent, Signal, SignalScope};
