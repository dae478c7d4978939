//! Signal, action, and event type definitions.
//!
//! Every message crossing the realtime boundary is a variant of one of
//! the closed enums below; there are no string-keyed event names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use campushub_core::types::id::{CourseId, MessageId, PrincipalId};
use campushub_entity::Principal;

use crate::channel::types::{ChannelId, ChannelKind};
use crate::presence::status::PresenceStatus;

/// The target of a signal: exactly one principal, one channel, or
/// everyone connected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum SignalScope {
    /// All live connections of one principal.
    Principal(PrincipalId),
    /// All connections subscribed to one channel.
    Channel(ChannelId),
    /// Every live connection.
    Global,
}

/// The closed set of signal kinds this core routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Chat message fan-out.
    Chat,
    /// Typing indicator on.
    TypingStart,
    /// Typing indicator off.
    TypingStop,
    /// Read receipt.
    ReadReceipt,
    /// Presence transition or recompute broadcast.
    StatusUpdate,
    /// File shared into a channel.
    FileShared,
    /// Announcement fan-out from the portal.
    AnnouncementFanout,
    /// Grade fan-out to one principal.
    GradeFanout,
}

impl SignalKind {
    /// Stable name for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::TypingStart => "typing_start",
            Self::TypingStop => "typing_stop",
            Self::ReadReceipt => "read_receipt",
            Self::StatusUpdate => "status_update",
            Self::FileShared => "file_shared",
            Self::AnnouncementFanout => "announcement_fanout",
            Self::GradeFanout => "grade_fanout",
        }
    }
}

/// A transient scoped message. Never persisted; the router is a pure
/// delivery fabric.
#[derive(Debug, Clone)]
pub struct Signal {
    /// What kind of signal this is.
    pub kind: SignalKind,
    /// Who receives it.
    pub scope: SignalScope,
    /// The event delivered to each recipient.
    pub event: ServerEvent,
}

impl Signal {
    /// Creates a signal. Constructors on [`ServerEvent`] producers keep
    /// `kind` and `event` coherent; prefer those where one exists.
    pub fn new(kind: SignalKind, scope: SignalScope, event: ServerEvent) -> Self {
        Self { kind, scope, event }
    }
}

/// Metadata describing a shared file. Upload and storage are the portal's
/// concern; this core only relays the notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// File identifier in the external store.
    pub id: Uuid,
    /// Original file name.
    pub name: String,
    /// Size in bytes.
    pub size_bytes: i64,
    /// MIME type, if known.
    pub mime_type: Option<String>,
}

/// Actions sent by the client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientAction {
    /// Join a channel (re-authorized against the store).
    Join {
        /// Target channel.
        channel: ChannelId,
    },
    /// Leave a channel. Always succeeds.
    Leave {
        /// Target channel.
        channel: ChannelId,
    },
    /// Start a typing indicator in a scope.
    TypingStart {
        /// Declared scope.
        scope: SignalScope,
    },
    /// Stop a typing indicator. Never inferred from inactivity.
    TypingStop {
        /// Declared scope.
        scope: SignalScope,
    },
    /// Mark a message as read; relays a read receipt into the scope.
    MessageRead {
        /// Message being acknowledged.
        message_id: MessageId,
        /// Scope the receipt is relayed into.
        scope: SignalScope,
    },
    /// Request a presence recompute and broadcast.
    StatusUpdate {
        /// Client-reported status; presence is derived, so this is
        /// advisory only.
        status: String,
    },
    /// Notify a channel that a file was shared.
    FileShared {
        /// Target channel.
        channel: ChannelId,
        /// File metadata from the upload service.
        file: FileMetadata,
    },
    /// Keepalive response to a server ping.
    Pong {
        /// Echoed timestamp.
        timestamp: i64,
    },
}

/// Events sent by the server to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Join confirmed.
    Joined {
        /// Channel joined.
        channel: ChannelId,
        /// Human-readable channel label.
        label: String,
    },
    /// Leave confirmed.
    Left {
        /// Channel left.
        channel: ChannelId,
    },
    /// Chat message fan-out.
    ChatMessage {
        /// Message ID assigned by the external store.
        message_id: MessageId,
        /// Channel the message was posted to.
        channel: ChannelId,
        /// Sender.
        sender_id: PrincipalId,
        /// Sender display name.
        sender_name: String,
        /// Message body.
        body: String,
        /// When the store accepted the message.
        sent_at: DateTime<Utc>,
    },
    /// Someone started typing.
    TypingStarted {
        /// Scope the indicator applies to.
        scope: SignalScope,
        /// Who is typing.
        principal_id: PrincipalId,
        /// Display name.
        display_name: String,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },
    /// Someone stopped typing.
    TypingStopped {
        /// Scope the indicator applies to.
        scope: SignalScope,
        /// Who stopped.
        principal_id: PrincipalId,
        /// Display name.
        display_name: String,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },
    /// A message was read.
    ReadReceipt {
        /// Message that was read.
        message_id: MessageId,
        /// Scope the receipt was relayed into.
        scope: SignalScope,
        /// Reader.
        read_by: PrincipalId,
        /// When it was read.
        read_at: DateTime<Utc>,
    },
    /// Presence change broadcast.
    StatusUpdate {
        /// Principal whose presence changed.
        principal_id: PrincipalId,
        /// Display name.
        display_name: String,
        /// Derived status.
        status: PresenceStatus,
        /// Last time the principal went offline, if ever.
        last_seen: Option<DateTime<Utc>>,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },
    /// A file was shared into a channel.
    FileShared {
        /// Target channel.
        channel: ChannelId,
        /// File metadata.
        file: FileMetadata,
        /// Sharer.
        shared_by: PrincipalId,
        /// Sharer display name.
        shared_by_name: String,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },
    /// Announcement fan-out.
    Announcement {
        /// Announcement ID in the external store.
        announcement_id: Uuid,
        /// Scope it was published to.
        scope: SignalScope,
        /// Title.
        title: String,
        /// Body.
        body: String,
        /// Author.
        posted_by: PrincipalId,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },
    /// A grade was posted for the receiving principal.
    GradePosted {
        /// Course the grade belongs to.
        course_id: CourseId,
        /// Graded item label.
        item: String,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },
    /// Connect-time channel resolution is incomplete; the listed kinds
    /// will be retried in the background.
    ResolutionPending {
        /// Channel kinds still unresolved.
        pending: Vec<ChannelKind>,
        /// Whether the server is retrying.
        retryable: bool,
        /// Human-readable explanation.
        message: String,
    },
    /// Keepalive ping.
    Ping {
        /// Server timestamp (milliseconds).
        timestamp: i64,
    },
    /// Action rejected.
    Error {
        /// Machine-readable error code.
        code: String,
        /// Human-readable message.
        message: String,
    },
}

impl ServerEvent {
    /// Builds a typing indicator event.
    pub fn typing(scope: SignalScope, principal: &Principal, active: bool) -> Self {
        let now = Utc::now();
        if active {
            Self::TypingStarted {
                scope,
                principal_id: principal.id,
                display_name: principal.display_name.clone(),
                timestamp: now,
            }
        } else {
            Self::TypingStopped {
                scope,
                principal_id: principal.id,
                display_name: principal.display_name.clone(),
                timestamp: now,
            }
        }
    }
}

/// Why a connection ended. The string forms are part of the client
/// protocol and must stay distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Handshake authentication failed.
    AuthFailed,
    /// Closed after a forbidden action (not used for survivable denials).
    Forbidden,
    /// Closed because a backing entity disappeared.
    NotFound,
    /// Clean client close.
    NormalClose,
    /// Transport-level error or keepalive timeout.
    TransportError,
}

impl CloseReason {
    /// Stable wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthFailed => "auth-failed",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not-found",
            Self::NormalClose => "normal-close",
            Self::TransportError => "transport-error",
        }
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
