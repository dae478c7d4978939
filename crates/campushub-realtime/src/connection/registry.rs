//! Connection registry — all live connections, indexed by principal.

use std::sync::Arc;

use dashmap::DashMap;

use campushub_core::types::id::{ConnectionId, PrincipalId};

use super::handle::ConnectionHandle;

/// Thread-safe registry of all live connections.
///
/// A principal holds a *set* of simultaneous connections (multi-device);
/// collapsing to a single slot would orphan earlier sessions and corrupt
/// presence. Insert and remove are both idempotent so every disconnect
/// path can call cleanup unconditionally.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Principal ID → live connection handles.
    by_principal: DashMap<PrincipalId, Vec<Arc<ConnectionHandle>>>,
    /// Connection ID → connection handle for direct lookup.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            by_principal: DashMap::new(),
            by_id: DashMap::new(),
        }
    }

    /// Adds a connection. Registering the same connection ID twice is a
    /// no-op; returns whether the handle was newly inserted.
    pub fn insert(&self, handle: Arc<ConnectionHandle>) -> bool {
        if self.by_id.contains_key(&handle.id) {
            tracing::debug!(conn_id = %handle.id, "Duplicate register ignored");
            return false;
        }
        self.by_id.insert(handle.id, handle.clone());
        self.by_principal
            .entry(handle.principal_id())
            .or_default()
            .push(handle);
        true
    }

    /// Removes a connection. Unknown IDs are a no-op returning `None`,
    /// never an error; cleanup must be safe to run twice.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.by_id.remove(conn_id)?;
        if let Some(mut connections) = self.by_principal.get_mut(&handle.principal_id()) {
            connections.retain(|c| c.id != *conn_id);
            if connections.is_empty() {
                drop(connections);
                self.by_principal.remove(&handle.principal_id());
            }
        }
        Some(handle)
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Gets all live connections for a principal.
    pub fn connections_for(&self, principal_id: PrincipalId) -> Vec<Arc<ConnectionHandle>> {
        self.by_principal
            .get(&principal_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Whether the principal has at least one live connection.
    pub fn is_online(&self, principal_id: PrincipalId) -> bool {
        self.by_principal
            .get(&principal_id)
            .map(|entry| !entry.value().is_empty())
            .unwrap_or(false)
    }

    /// Returns all connection handles.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Total number of live connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Number of distinct principals with live connections.
    pub fn principal_count(&self) -> usize {
        self.by_principal.len()
    }

    /// Drops every connection mapping. Test isolation only.
    pub fn clear(&self) {
        self.by_id.clear();
        self.by_principal.clear();
    }
}
