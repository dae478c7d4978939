//! # campushub-entity
//!
//! Domain entity models for CampusHub. Entities here are snapshots of
//! records owned by the external portal store; this crate never persists
//! anything itself.

pub mod principal;

pub use principal::{Principal, Role};
