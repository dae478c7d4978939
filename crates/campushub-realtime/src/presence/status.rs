//! Presence status definitions.

use serde::{Deserialize, Serialize};

/// Derived presence of a principal. Exactly two states: status is always
/// a function of the connection registry, never set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    /// At least one live connection.
    Online,
    /// No live connections.
    Offline,
}

impl PresenceStatus {
    /// Converts to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}
