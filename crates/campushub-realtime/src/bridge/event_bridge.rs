//! Domain event → signal mapping.
//!
//! The portal's REST layer persists chat messages, announcements, and
//! grades in the external store, then calls into this bridge for the
//! live fan-out. The bridge never persists anything; delivery beyond
//! currently-connected principals is the store's concern.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use campushub_core::types::id::{CourseId, MessageId, PrincipalId};

use crate::channel::types::ChannelId;
use crate::signal::router::EventRouter;
use crate::signal::types::{ServerEvent, Signal, SignalKind, SignalScope};

/// Bridges domain events into the realtime system.
#[derive(Debug)]
pub struct EventBridge {
    /// Event router.
    router: Arc<EventRouter>,
}

impl EventBridge {
    /// Creates a new event bridge.
    pub fn new(router: Arc<EventRouter>) -> Self {
        Self { router }
    }

    /// Fans out a chat message that the store has already accepted.
    pub fn on_chat_message(
        &self,
        channel: ChannelId,
        message_id: MessageId,
        sender_id: PrincipalId,
        sender_name: &str,
        body: &str,
        sent_at: DateTime<Utc>,
    ) {
        let event = ServerEvent::ChatMessage {
            message_id,
            channel: channel.clone(),
            sender_id,
            sender_name: sender_name.to_string(),
            body: body.to_string(),
            sent_at,
        };
        self.router.route(&Signal::new(
            SignalKind::Chat,
            SignalScope::Channel(channel),
            event,
        ));
    }

    /// Fans out an announcement to its scope (global, department, or
    /// course).
    pub fn on_announcement_published(
        &self,
        scope: SignalScope,
        announcement_id: Uuid,
        title: &str,
        body: &str,
        posted_by: PrincipalId,
    ) {
        let event = ServerEvent::Announcement {
            announcement_id,
            scope: scope.clone(),
            title: title.to_string(),
            body: body.to_string(),
            posted_by,
            timestamp: Utc::now(),
        };
        self.router
            .route(&Signal::new(SignalKind::AnnouncementFanout, scope, event));
    }

    /// Notifies one principal that a grade was posted. Always
    /// principal-scoped: grades are private.
    pub fn on_grade_posted(&self, principal_id: PrincipalId, course_id: CourseId, item: &str) {
        let event = ServerEvent::GradePosted {
            course_id,
            item: item.to_string(),
            timestamp: Utc::now(),
        };
        self.router.route(&Signal::new(
            SignalKind::GradeFanout,
            SignalScope::Principal(principal_id),
            event,
        ));
    }
}
