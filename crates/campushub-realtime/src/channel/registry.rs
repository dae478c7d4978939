//! Channel registry — manages all channels and subscriptions.

use dashmap::DashMap;

use campushub_core::types::id::ConnectionId;

use super::channel::Channel;
use super::subscription::SubscriptionTracker;
use super::types::ChannelId;

/// Registry of all active broadcast channels.
///
/// Channels exist only while they have subscribers; an empty channel is
/// garbage-collected on unsubscribe, so join → leave → join leaves no
/// residual state behind.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    /// Channel → Channel state.
    channels: DashMap<ChannelId, Channel>,
    /// Subscription tracker (reverse index).
    subscriptions: SubscriptionTracker,
}

impl ChannelRegistry {
    /// Creates a new channel registry.
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
            subscriptions: SubscriptionTracker::new(),
        }
    }

    /// Subscribes a connection to a channel.
    pub fn subscribe(&self, channel_id: ChannelId, conn_id: ConnectionId) {
        self.channels
            .entry(channel_id.clone())
            .or_insert_with(|| Channel::new(channel_id.clone()))
            .subscribe(conn_id);

        self.subscriptions.add(conn_id, channel_id);
    }

    /// Unsubscribes a connection from a channel.
    pub fn unsubscribe(&self, channel_id: &ChannelId, conn_id: ConnectionId) {
        if let Some(mut channel) = self.channels.get_mut(channel_id) {
            channel.unsubscribe(conn_id);
            if channel.is_empty() {
                drop(channel);
                self.channels.remove(channel_id);
            }
        }
        self.subscriptions.remove(conn_id, channel_id);
    }

    /// Unsubscribes a connection from all channels.
    pub fn unsubscribe_all(&self, conn_id: ConnectionId) {
        let channels = self.subscriptions.remove_all(conn_id);
        for channel_id in &channels {
            if let Some(mut channel) = self.channels.get_mut(channel_id) {
                channel.unsubscribe(conn_id);
                if channel.is_empty() {
                    drop(channel);
                    self.channels.remove(channel_id);
                }
            }
        }
    }

    /// Returns all subscriber connection IDs for a channel.
    pub fn subscribers(&self, channel_id: &ChannelId) -> Vec<ConnectionId> {
        self.channels
            .get(channel_id)
            .map(|ch| ch.get_subscribers())
            .unwrap_or_default()
    }

    /// Whether a connection is subscribed to a channel.
    pub fn is_subscribed(&self, channel_id: &ChannelId, conn_id: ConnectionId) -> bool {
        self.channels
            .get(channel_id)
            .map(|ch| ch.subscribers.contains(&conn_id))
            .unwrap_or(false)
    }

    /// Returns the subscription count for a connection.
    pub fn subscription_count(&self, conn_id: ConnectionId) -> usize {
        self.subscriptions.count(conn_id)
    }

    /// Returns subscriber count for a channel.
    pub fn subscriber_count(&self, channel_id: &ChannelId) -> usize {
        self.channels
            .get(channel_id)
            .map(|ch| ch.subscriber_count())
            .unwrap_or(0)
    }

    /// Returns total number of active channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Drops every channel and subscription. Test isolation only.
    pub fn clear(&self) {
        self.channels.clear();
        self.subscriptions.clear();
    }
}
