//! Typed channel identifiers and parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use campushub_core::AppError;
use campushub_core::types::id::{CourseId, PrincipalId};

/// A named broadcast scope.
///
/// Channels carry no state of their own in this core; existence and
/// membership are validated against the external store. The string form
/// (`personal:<uuid>`, `course:<uuid>`, `department:<name>`, `global`) is
/// the wire representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ChannelId {
    /// One principal's private channel — grade fan-out, direct notices.
    Personal(PrincipalId),
    /// Course channel — chat, typing, receipts, file shares, course announcements.
    Course(CourseId),
    /// Department channel, keyed by department name.
    Department(String),
    /// Global broadcast scope (portal-wide announcements).
    Global,
}

/// Coarse channel categorization, used in resolution-status payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Personal channel.
    Personal,
    /// Course channel.
    Course,
    /// Department channel.
    Department,
    /// Global channel.
    Global,
}

impl ChannelId {
    /// Returns the kind of this channel.
    pub fn kind(&self) -> ChannelKind {
        match self {
            Self::Personal(_) => ChannelKind::Personal,
            Self::Course(_) => ChannelKind::Course,
            Self::Department(_) => ChannelKind::Department,
            Self::Global => ChannelKind::Global,
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Personal(id) => write!(f, "personal:{id}"),
            Self::Course(id) => write!(f, "course:{id}"),
            Self::Department(name) => write!(f, "department:{name}"),
            Self::Global => write!(f, "global"),
        }
    }
}

impl FromStr for ChannelId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "global" {
            return Ok(Self::Global);
        }

        let parts: Vec<&str> = s.splitn(2, ':').collect();
        match parts.as_slice() {
            ["personal", id] => id
                .parse::<PrincipalId>()
                .map(Self::Personal)
                .map_err(|_| AppError::validation(format!("Invalid personal channel id: '{s}'"))),
            ["course", id] => id
                .parse::<CourseId>()
                .map(Self::Course)
                .map_err(|_| AppError::validation(format!("Invalid course channel id: '{s}'"))),
            ["department", name] if !name.is_empty() => {
                Ok(Self::Department(name.to_string()))
            }
            _ => Err(AppError::validation(format!("Unknown channel: '{s}'"))),
        }
    }
}

impl From<ChannelId> for String {
    fn from(channel: ChannelId) -> String {
        channel.to_string()
    }
}

impl TryFrom<String> for ChannelId {
    type Error = AppError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
