//! Collaborator ingress — domain events routed into the realtime system.

pub mod event_bridge;

pub use event_bridge::EventBridge;
