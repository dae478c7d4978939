//! Ephemeral signal relay — typing indicators, read receipts, file
//! shares.
//!
//! A thin layer over the router: validate that the source principal is a
//! member of the declared scope, then route. Nothing here is persisted,
//! and a typing stop is never inferred from inactivity — clients signal
//! it explicitly.

use std::sync::Arc;

use chrono::Utc;

use campushub_core::types::id::MessageId;
use campushub_core::{AppError, AppResult};
use campushub_directory::DirectoryStore;
use campushub_entity::Principal;

use crate::channel::types::ChannelId;
use crate::guard::{self, AccessAction, AccessTarget};

use super::router::EventRouter;
use super::types::{FileMetadata, ServerEvent, Signal, SignalKind, SignalScope};

/// Relay for ephemeral signals.
pub struct EphemeralRelay {
    router: Arc<EventRouter>,
    directory: Arc<dyn DirectoryStore>,
}

impl std::fmt::Debug for EphemeralRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralRelay").finish()
    }
}

impl EphemeralRelay {
    /// Creates a new relay.
    pub fn new(router: Arc<EventRouter>, directory: Arc<dyn DirectoryStore>) -> Self {
        Self { router, directory }
    }

    /// Relays a typing indicator into a scope.
    pub fn typing(&self, principal: &Principal, scope: SignalScope, active: bool) -> AppResult<()> {
        ensure_scope_member(principal, &scope)?;

        let kind = if active {
            SignalKind::TypingStart
        } else {
            SignalKind::TypingStop
        };
        let event = ServerEvent::typing(scope.clone(), principal, active);
        self.router.route(&Signal::new(kind, scope, event));
        Ok(())
    }

    /// Relays a read receipt into a scope.
    pub fn read_receipt(
        &self,
        principal: &Principal,
        message_id: MessageId,
        scope: SignalScope,
    ) -> AppResult<()> {
        ensure_scope_member(principal, &scope)?;

        let event = ServerEvent::ReadReceipt {
            message_id,
            scope: scope.clone(),
            read_by: principal.id,
            read_at: Utc::now(),
        };
        self.router
            .route(&Signal::new(SignalKind::ReadReceipt, scope, event));
        Ok(())
    }

    /// Relays a file-shared notice into a channel. The file itself was
    /// already stored by the upload service; this only tells channel
    /// members about it.
    pub async fn file_shared(
        &self,
        principal: &Principal,
        channel: ChannelId,
        file: FileMetadata,
    ) -> AppResult<()> {
        if let ChannelId::Course(course_id) = &channel {
            if !self.directory.course_exists(*course_id).await? {
                return Err(AppError::not_found(format!(
                    "Course no longer exists: {course_id}"
                )));
            }
        }

        guard::ensure(
            principal,
            AccessAction::Publish,
            &AccessTarget::Channel(&channel),
        )?;

        let event = ServerEvent::FileShared {
            channel: channel.clone(),
            file,
            shared_by: principal.id,
            shared_by_name: principal.display_name.clone(),
            timestamp: Utc::now(),
        };
        self.router.route(&Signal::new(
            SignalKind::FileShared,
            SignalScope::Channel(channel),
            event,
        ));
        Ok(())
    }
}

/// Maps a signal scope onto the guard's target model and checks
/// publish access for it.
fn ensure_scope_member(principal: &Principal, scope: &SignalScope) -> AppResult<()> {
    match scope {
        SignalScope::Principal(target) => guard::ensure(
            principal,
            AccessAction::Publish,
            &AccessTarget::Principal(*target),
        ),
        SignalScope::Channel(channel) => guard::ensure(
            principal,
            AccessAction::Publish,
            &AccessTarget::Channel(channel),
        ),
        SignalScope::Global => guard::ensure(
            principal,
            AccessAction::Publish,
            &AccessTarget::Channel(&ChannelId::Global),
        ),
    }
}
