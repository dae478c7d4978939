//! Channel membership resolution against the external directory store.

use std::sync::Arc;

use tracing::{debug, warn};

use campushub_core::{AppError, AppResult};
use campushub_directory::DirectoryStore;
use campushub_entity::Principal;

use super::types::{ChannelId, ChannelKind};

/// Result of connect-time channel resolution.
#[derive(Debug, Clone)]
pub struct ResolvedChannels {
    /// Channels the connection should subscribe to now.
    pub channels: Vec<ChannelId>,
    /// Channel kinds that could not be resolved because the store was
    /// unavailable; the manager retries them in the background.
    pub deferred: Vec<ChannelKind>,
}

/// Computes and validates which channels a principal may join.
///
/// Connect-time resolution issues one membership query (admins get one
/// extra course-list query); explicit joins always re-query, since the
/// connect-time snapshot is never trusted for later authorization.
pub struct MembershipResolver {
    directory: Arc<dyn DirectoryStore>,
}

impl std::fmt::Debug for MembershipResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipResolver").finish()
    }
}

impl MembershipResolver {
    /// Creates a new resolver.
    pub fn new(directory: Arc<dyn DirectoryStore>) -> Self {
        Self { directory }
    }

    /// Resolves the default channel set at connect time.
    ///
    /// The personal channel never needs the store and is always present.
    /// A store outage defers the membership-derived channels instead of
    /// failing the handshake.
    pub async fn connect_channels(&self, principal: &Principal) -> ResolvedChannels {
        let mut channels = vec![ChannelId::Personal(principal.id)];

        match self.membership_channels(principal).await {
            Ok(resolved) => {
                channels.extend(resolved);
                ResolvedChannels {
                    channels,
                    deferred: Vec::new(),
                }
            }
            Err(e) if e.is_retryable() => {
                warn!(
                    principal_id = %principal.id,
                    error = %e,
                    "Store unavailable during connect resolution, deferring"
                );
                ResolvedChannels {
                    channels,
                    deferred: vec![ChannelKind::Course, ChannelKind::Department],
                }
            }
            Err(e) => {
                // Non-retryable resolution failures also must not kill the
                // handshake; the principal keeps their personal channel.
                warn!(
                    principal_id = %principal.id,
                    error = %e,
                    "Connect resolution failed"
                );
                ResolvedChannels {
                    channels,
                    deferred: Vec::new(),
                }
            }
        }
    }

    /// The membership-derived remainder of the default set: department
    /// channel plus every enrolled/taught course; admins additionally get
    /// every existing course channel.
    pub async fn membership_channels(&self, principal: &Principal) -> AppResult<Vec<ChannelId>> {
        let snapshot = self.directory.membership_snapshot(principal.id).await?;

        let mut channels = Vec::with_capacity(snapshot.courses.len() + 1);
        channels.push(ChannelId::Department(snapshot.department));
        channels.extend(snapshot.courses.into_iter().map(ChannelId::Course));

        if principal.is_admin() {
            for course_id in self.directory.all_course_ids().await? {
                let channel = ChannelId::Course(course_id);
                if !channels.contains(&channel) {
                    channels.push(channel);
                }
            }
        }

        debug!(
            principal_id = %principal.id,
            count = channels.len(),
            "Resolved membership channels"
        );
        Ok(channels)
    }

    /// Authorizes an explicit join against fresh store data and returns
    /// the channel label on success.
    ///
    /// Fails `NotFound` when the backing entity is gone, `Forbidden` when
    /// the access guard denies the fresh principal snapshot.
    pub async fn authorize_join(
        &self,
        principal: &Principal,
        channel: &ChannelId,
    ) -> AppResult<String> {
        use crate::guard::{self, AccessAction, AccessTarget};

        match channel {
            // No store state backs these two; the guard alone decides.
            ChannelId::Global | ChannelId::Personal(_) => {
                guard::ensure(principal, AccessAction::Join, &AccessTarget::Channel(channel))?;
                self.describe(channel).await
            }
            ChannelId::Course(course_id) => {
                let label = self
                    .directory
                    .course_label(*course_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::not_found(format!("Course no longer exists: {course_id}"))
                    })?;

                let fresh = self.directory.fetch_principal(principal.id).await?;
                guard::ensure(&fresh, AccessAction::Join, &AccessTarget::Channel(channel))?;
                Ok(label)
            }
            ChannelId::Department(_) => {
                let fresh = self.directory.fetch_principal(principal.id).await?;
                guard::ensure(&fresh, AccessAction::Join, &AccessTarget::Channel(channel))?;
                self.describe(channel).await
            }
        }
    }

    /// Human-readable label for a channel. Course labels come from the
    /// store, falling back to the id string if the course vanished
    /// between resolution and labelling.
    pub async fn describe(&self, channel: &ChannelId) -> AppResult<String> {
        match channel {
            ChannelId::Personal(_) => Ok("Personal".to_string()),
            ChannelId::Department(name) => Ok(name.clone()),
            ChannelId::Global => Ok("Global".to_string()),
            ChannelId::Course(course_id) => Ok(self
                .directory
                .course_label(*course_id)
                .await?
                .unwrap_or_else(|| course_id.to_string())),
        }
    }
}
