//! Presence — derived online/offline state per principal.

pub mod status;
pub mod tracker;

pub use status::PresenceStatus;
pub use tracker::{PresenceRecord, PresenceTracker};
