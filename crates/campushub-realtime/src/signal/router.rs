//! Event router — delivers scoped signals to subscribed connections.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use campushub_core::types::id::ConnectionId;

use crate::channel::registry::ChannelRegistry;
use crate::channel::types::ChannelId;
use crate::connection::handle::ConnectionHandle;
use crate::connection::registry::ConnectionRegistry;
use crate::metrics::EngineMetrics;

use super::types::{ServerEvent, Signal, SignalKind, SignalScope};

/// Pure delivery fabric: given a signal with an explicit scope, queue it
/// on every connection currently subscribed to that scope.
///
/// Delivery is best-effort and at most once per live connection; a
/// connection that disconnects mid-broadcast simply misses the signal.
/// Fan-out is synchronous into per-connection FIFO queues, so signals
/// from one source to one target arrive in submission order; nothing is
/// promised across sources. The router never persists anything.
#[derive(Debug)]
pub struct EventRouter {
    connections: Arc<ConnectionRegistry>,
    channels: Arc<ChannelRegistry>,
    metrics: Arc<EngineMetrics>,
}

impl EventRouter {
    /// Creates a new router.
    pub fn new(
        connections: Arc<ConnectionRegistry>,
        channels: Arc<ChannelRegistry>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            connections,
            channels,
            metrics,
        }
    }

    /// Routes a signal to its scope. Returns the number of connections
    /// the event was queued on.
    pub fn route(&self, signal: &Signal) -> usize {
        let targets = self.resolve_scope(&signal.scope);
        self.deliver(signal.kind, targets, &signal.event)
    }

    /// Routes one event to the union of several channels, delivering at
    /// most once per connection even when channel memberships overlap.
    /// Used for presence broadcasts, which span a principal's course
    /// channels plus their department channel.
    pub fn route_to_channels(
        &self,
        kind: SignalKind,
        channels: &[ChannelId],
        event: &ServerEvent,
    ) -> usize {
        let mut seen: HashSet<ConnectionId> = HashSet::new();
        let mut targets = Vec::new();
        for channel in channels {
            for conn_id in self.channels.subscribers(channel) {
                if seen.insert(conn_id) {
                    if let Some(handle) = self.connections.get(&conn_id) {
                        targets.push(handle);
                    }
                }
            }
        }
        self.deliver(kind, targets, event)
    }

    fn resolve_scope(&self, scope: &SignalScope) -> Vec<Arc<ConnectionHandle>> {
        match scope {
            SignalScope::Principal(principal_id) => {
                self.connections.connections_for(*principal_id)
            }
            SignalScope::Channel(channel_id) => self
                .channels
                .subscribers(channel_id)
                .into_iter()
                .filter_map(|conn_id| self.connections.get(&conn_id))
                .collect(),
            SignalScope::Global => self.connections.all_connections(),
        }
    }

    fn deliver(
        &self,
        kind: SignalKind,
        targets: Vec<Arc<ConnectionHandle>>,
        event: &ServerEvent,
    ) -> usize {
        let mut delivered = 0u64;
        let mut dropped = 0u64;
        for handle in &targets {
            if handle.send(event.clone()) {
                delivered += 1;
            } else {
                dropped += 1;
            }
        }
        self.metrics.signal_routed(delivered, dropped);

        debug!(
            kind = kind.as_str(),
            delivered,
            dropped,
            "Signal routed"
        );
        delivered as usize
    }
}
