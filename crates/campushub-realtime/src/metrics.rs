//! Engine metrics counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Total connections ever established.
    connections_opened: AtomicU64,
    /// Total connections closed.
    connections_closed: AtomicU64,
    /// Total signals routed.
    signals_routed: AtomicU64,
    /// Total per-connection deliveries.
    deliveries: AtomicU64,
    /// Deliveries dropped (dead connection or full buffer).
    deliveries_dropped: AtomicU64,
    /// Total client actions received.
    actions_received: AtomicU64,
    /// Join attempts denied by the access guard.
    joins_denied: AtomicU64,
    /// Background channel-resolution retries.
    resolution_retries: AtomicU64,
}

impl EngineMetrics {
    /// Create new zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an opened connection.
    pub fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a closed connection.
    pub fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one routed signal with its delivery/drop counts.
    pub fn signal_routed(&self, delivered: u64, dropped: u64) {
        self.signals_routed.fetch_add(1, Ordering::Relaxed);
        self.deliveries.fetch_add(delivered, Ordering::Relaxed);
        self.deliveries_dropped.fetch_add(dropped, Ordering::Relaxed);
    }

    /// Record a received client action.
    pub fn action_received(&self) {
        self.actions_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a denied join.
    pub fn join_denied(&self) {
        self.joins_denied.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a resolution retry attempt.
    pub fn resolution_retry(&self) {
        self.resolution_retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            signals_routed: self.signals_routed.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            deliveries_dropped: self.deliveries_dropped.load(Ordering::Relaxed),
            actions_received: self.actions_received.load(Ordering::Relaxed),
            joins_denied: self.joins_denied.load(Ordering::Relaxed),
            resolution_retries: self.resolution_retries.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total connections ever established.
    pub connections_opened: u64,
    /// Total connections closed.
    pub connections_closed: u64,
    /// Total signals routed.
    pub signals_routed: u64,
    /// Total per-connection deliveries.
    pub deliveries: u64,
    /// Deliveries dropped.
    pub deliveries_dropped: u64,
    /// Total client actions received.
    pub actions_received: u64,
    /// Joins denied.
    pub joins_denied: u64,
    /// Resolution retries.
    pub resolution_retries: u64,
}
