//! Connection manager — orchestrates the connection lifecycle and
//! dispatches client actions.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use campushub_core::config::realtime::RealtimeConfig;
use campushub_core::error::ErrorKind;
use campushub_core::types::id::{ConnectionId, PrincipalId};
use campushub_core::{AppError, AppResult};
use campushub_entity::Principal;

use crate::channel::registry::ChannelRegistry;
use crate::channel::resolver::MembershipResolver;
use crate::channel::types::ChannelId;
use crate::metrics::EngineMetrics;
use crate::presence::tracker::{PresenceRecord, PresenceTracker};
use crate::signal::relay::EphemeralRelay;
use crate::signal::router::EventRouter;
use crate::signal::types::{ClientAction, CloseReason, ServerEvent, SignalKind};

use super::handle::ConnectionHandle;
use super::registry::ConnectionRegistry;

/// Manages all live connections.
///
/// Owns the only paths that mutate the connection registry, so every
/// disconnect (explicit close, transport error, or heartbeat timeout)
/// funnels into [`ConnectionManager::unregister`] and cleanup runs
/// exactly once per connection.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Configuration.
    config: RealtimeConfig,
    /// Live connection registry.
    registry: Arc<ConnectionRegistry>,
    /// Channel registry.
    channels: Arc<ChannelRegistry>,
    /// Presence tracker.
    presence: Arc<PresenceTracker>,
    /// Membership resolver.
    resolver: Arc<MembershipResolver>,
    /// Event router.
    router: Arc<EventRouter>,
    /// Ephemeral signal relay.
    relay: Arc<EphemeralRelay>,
    /// Metrics.
    metrics: Arc<EngineMetrics>,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: RealtimeConfig,
        registry: Arc<ConnectionRegistry>,
        channels: Arc<ChannelRegistry>,
        presence: Arc<PresenceTracker>,
        resolver: Arc<MembershipResolver>,
        router: Arc<EventRouter>,
        relay: Arc<EphemeralRelay>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            config,
            registry,
            channels,
            presence,
            resolver,
            router,
            relay,
            metrics,
        }
    }

    /// Registers a new authenticated connection: resolves and subscribes
    /// the default channel set, then re-evaluates presence.
    ///
    /// Returns the connection handle and the receiver for outbound events.
    pub async fn register(
        &self,
        principal: Principal,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(principal, tx));

        self.registry.insert(handle.clone());

        let resolved = self.resolver.connect_channels(&handle.principal).await;
        for channel in &resolved.channels {
            self.channels.subscribe(channel.clone(), handle.id);
        }

        if !resolved.deferred.is_empty() {
            handle.send(ServerEvent::ResolutionPending {
                pending: resolved.deferred.clone(),
                retryable: true,
                message: "Channel resolution incomplete; retrying in the background".to_string(),
            });
            self.spawn_resolution_retry(handle.clone());
        }

        if self.presence.mark_online(handle.principal_id()) {
            let record = self.presence.record(handle.principal_id());
            self.broadcast_presence(&handle.principal, &record);
        }

        self.metrics.connection_opened();
        info!(
            conn_id = %handle.id,
            principal_id = %handle.principal_id(),
            channels = resolved.channels.len(),
            "Connection registered"
        );

        (handle, rx)
    }

    /// Unregisters a connection and cleans up its subscriptions.
    /// Idempotent: unknown connection IDs are a no-op.
    ///
    /// Re-evaluates presence only when the owning principal's live set
    /// became empty, so the Offline broadcast fires exactly once.
    pub fn unregister(&self, conn_id: &ConnectionId, reason: CloseReason) {
        let Some(handle) = self.registry.remove(conn_id) else {
            debug!(conn_id = %conn_id, "Unregister of unknown connection ignored");
            return;
        };

        handle.mark_closed();
        self.channels.unsubscribe_all(handle.id);

        let principal_id = handle.principal_id();
        if !self.registry.is_online(principal_id) {
            if let Some(record) = self.presence.mark_offline(principal_id) {
                self.broadcast_presence(&handle.principal, &record);
            }
        }

        self.metrics.connection_closed();
        info!(
            conn_id = %conn_id,
            principal_id = %principal_id,
            reason = reason.as_str(),
            "Connection unregistered"
        );
    }

    /// Processes a raw inbound action from a client.
    pub async fn handle_action(&self, conn_id: &ConnectionId, raw: &str) {
        let Some(handle) = self.registry.get(conn_id) else {
            warn!(conn_id = %conn_id, "Action from unknown connection");
            return;
        };

        self.metrics.action_received();

        let action: ClientAction = match serde_json::from_str(raw) {
            Ok(action) => action,
            Err(e) => {
                handle.send(ServerEvent::Error {
                    code: "INVALID_MESSAGE".to_string(),
                    message: format!("Failed to parse action: {e}"),
                });
                return;
            }
        };

        match action {
            ClientAction::Join { channel } => {
                self.handle_join(&handle, channel).await;
            }
            ClientAction::Leave { channel } => {
                // Unconditional: leaving needs no authorization and
                // always succeeds.
                self.channels.unsubscribe(&channel, handle.id);
                handle.send(ServerEvent::Left { channel });
            }
            ClientAction::TypingStart { scope } => {
                self.report(&handle, self.relay.typing(&handle.principal, scope, true));
            }
            ClientAction::TypingStop { scope } => {
                self.report(&handle, self.relay.typing(&handle.principal, scope, false));
            }
            ClientAction::MessageRead { message_id, scope } => {
                self.report(
                    &handle,
                    self.relay.read_receipt(&handle.principal, message_id, scope),
                );
            }
            ClientAction::StatusUpdate { status } => {
                // Presence is derived from the registry; the reported
                // status only triggers a recompute and re-broadcast.
                debug!(
                    conn_id = %conn_id,
                    requested = %status,
                    "Status update requested, recomputing derived presence"
                );
                let principal_id = handle.principal_id();
                let online = self.registry.is_online(principal_id);
                let record = self.presence.recompute(principal_id, online);
                self.broadcast_presence(&handle.principal, &record);
            }
            ClientAction::FileShared { channel, file } => {
                let result = self
                    .relay
                    .file_shared(&handle.principal, channel, file)
                    .await;
                self.report(&handle, result);
            }
            ClientAction::Pong { .. } => {
                handle.record_pong();
            }
        }
    }

    /// Closes every connection through the normal unregister path.
    pub fn close_all(&self) {
        let all = self.registry.all_connections();
        for handle in &all {
            self.unregister(&handle.id, CloseReason::NormalClose);
        }
        if !all.is_empty() {
            info!(count = all.len(), "All connections closed");
        }
    }

    /// Whether a principal has at least one live connection.
    pub fn is_online(&self, principal_id: PrincipalId) -> bool {
        self.registry.is_online(principal_id)
    }

    async fn handle_join(&self, handle: &Arc<ConnectionHandle>, channel: ChannelId) {
        if self.channels.subscription_count(handle.id)
            >= self.config.max_subscriptions_per_connection
        {
            handle.send(ServerEvent::Error {
                code: "MAX_SUBSCRIPTIONS".to_string(),
                message: format!(
                    "Maximum subscriptions ({}) reached",
                    self.config.max_subscriptions_per_connection
                ),
            });
            return;
        }

        match self.resolver.authorize_join(&handle.principal, &channel).await {
            Ok(label) => {
                self.channels.subscribe(channel.clone(), handle.id);
                handle.send(ServerEvent::Joined { channel, label });
            }
            Err(e) => {
                if e.kind == ErrorKind::Forbidden {
                    self.metrics.join_denied();
                }
                handle.send(error_event(&e));
            }
        }
    }

    /// Broadcasts a presence record to the principal's course channels
    /// and department channel.
    fn broadcast_presence(&self, principal: &Principal, record: &PresenceRecord) {
        let mut scopes: Vec<ChannelId> = principal
            .courses
            .iter()
            .map(|course| ChannelId::Course(*course))
            .collect();
        scopes.push(ChannelId::Department(principal.department.clone()));

        let event = ServerEvent::StatusUpdate {
            principal_id: principal.id,
            display_name: principal.display_name.clone(),
            status: record.status,
            last_seen: record.last_seen,
            timestamp: Utc::now(),
        };
        self.router
            .route_to_channels(SignalKind::StatusUpdate, &scopes, &event);
    }

    /// Sends a structured error back for a rejected action. Rejections
    /// are local to the action; the connection survives.
    fn report(&self, handle: &Arc<ConnectionHandle>, result: AppResult<()>) {
        if let Err(e) = result {
            handle.send(error_event(&e));
        }
    }

    /// Retries deferred membership resolution with bounded backoff,
    /// subscribing recovered channels as they appear.
    fn spawn_resolution_retry(&self, handle: Arc<ConnectionHandle>) {
        let resolver = self.resolver.clone();
        let channels = self.channels.clone();
        let metrics = self.metrics.clone();
        let attempts = self.config.resolver_retry_attempts;
        let backoff = Duration::from_millis(self.config.resolver_retry_backoff_ms);

        tokio::spawn(async move {
            for attempt in 1..=attempts {
                tokio::time::sleep(backoff).await;
                if !handle.is_alive() {
                    return;
                }
                metrics.resolution_retry();

                match resolver.membership_channels(&handle.principal).await {
                    Ok(resolved) => {
                        for channel in resolved {
                            if channels.is_subscribed(&channel, handle.id) {
                                continue;
                            }
                            let label = resolver
                                .describe(&channel)
                                .await
                                .unwrap_or_else(|_| channel.to_string());
                            channels.subscribe(channel.clone(), handle.id);
                            handle.send(ServerEvent::Joined { channel, label });
                        }
                        debug!(
                            conn_id = %handle.id,
                            attempt,
                            "Deferred channel resolution recovered"
                        );
                        return;
                    }
                    Err(e) if e.is_retryable() && attempt < attempts => {
                        debug!(
                            conn_id = %handle.id,
                            attempt,
                            "Resolution retry failed, backing off"
                        );
                    }
                    Err(e) => {
                        warn!(
                            conn_id = %handle.id,
                            error = %e,
                            "Deferred channel resolution gave up"
                        );
                        handle.send(error_event(&e));
                        return;
                    }
                }
            }
        });
    }
}

/// Maps an error onto the structured rejection event.
fn error_event(e: &AppError) -> ServerEvent {
    ServerEvent::Error {
        code: e.kind.to_string(),
        message: e.message.clone(),
    }
}
