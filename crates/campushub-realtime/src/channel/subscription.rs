//! Subscription tracking — which connections are subscribed to which channels.

use std::collections::HashSet;

use dashmap::DashMap;

use campushub_core::types::id::ConnectionId;

use super::types::ChannelId;

/// Tracks connection-to-channel subscription mappings (reverse index).
#[derive(Debug, Default)]
pub struct SubscriptionTracker {
    /// Connection ID → set of channels.
    conn_to_channels: DashMap<ConnectionId, HashSet<ChannelId>>,
}

impl SubscriptionTracker {
    /// Creates a new subscription tracker.
    pub fn new() -> Self {
        Self {
            conn_to_channels: DashMap::new(),
        }
    }

    /// Records a subscription.
    pub fn add(&self, conn_id: ConnectionId, channel: ChannelId) {
        self.conn_to_channels
            .entry(conn_id)
            .or_default()
            .insert(channel);
    }

    /// Removes a subscription.
    pub fn remove(&self, conn_id: ConnectionId, channel: &ChannelId) {
        if let Some(mut channels) = self.conn_to_channels.get_mut(&conn_id) {
            channels.remove(channel);
        }
    }

    /// Gets all channels a connection is subscribed to.
    pub fn channels_of(&self, conn_id: ConnectionId) -> HashSet<ChannelId> {
        self.conn_to_channels
            .get(&conn_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Returns the number of subscriptions for a connection.
    pub fn count(&self, conn_id: ConnectionId) -> usize {
        self.conn_to_channels
            .get(&conn_id)
            .map(|entry| entry.value().len())
            .unwrap_or(0)
    }

    /// Removes all subscriptions for a connection.
    pub fn remove_all(&self, conn_id: ConnectionId) -> HashSet<ChannelId> {
        self.conn_to_channels
            .remove(&conn_id)
            .map(|(_, channels)| channels)
            .unwrap_or_default()
    }

    /// Drops every tracked subscription. Test isolation only.
    pub fn clear(&self) {
        self.conn_to_channels.clear();
    }
}
