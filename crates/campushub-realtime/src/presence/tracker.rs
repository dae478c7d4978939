//! Presence tracker — derived online/offline state with transition
//! detection.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use campushub_core::types::id::PrincipalId;

use super::status::PresenceStatus;

/// Presence snapshot for one principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceRecord {
    /// Principal this record belongs to.
    pub principal_id: PrincipalId,
    /// Current derived status.
    pub status: PresenceStatus,
    /// Updated on every Online → Offline transition.
    pub last_seen: Option<DateTime<Utc>>,
}

impl PresenceRecord {
    fn offline(principal_id: PrincipalId) -> Self {
        Self {
            principal_id,
            status: PresenceStatus::Offline,
            last_seen: None,
        }
    }
}

/// Tracks presence state for all principals.
///
/// Transition methods return whether a state change happened; decisions
/// are taken under the map entry lock, so concurrent register/unregister
/// for one principal cannot observe the same transition twice.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    records: DashMap<PrincipalId, PresenceRecord>,
}

impl PresenceTracker {
    /// Creates a new presence tracker.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Marks a principal online. Returns `true` only on the
    /// Offline → Online edge.
    pub fn mark_online(&self, principal_id: PrincipalId) -> bool {
        let mut entry = self
            .records
            .entry(principal_id)
            .or_insert_with(|| PresenceRecord::offline(principal_id));
        if entry.status == PresenceStatus::Online {
            return false;
        }
        entry.status = PresenceStatus::Online;
        true
    }

    /// Marks a principal offline. Returns the updated record only on the
    /// Online → Offline edge; `last_seen` is stamped then.
    pub fn mark_offline(&self, principal_id: PrincipalId) -> Option<PresenceRecord> {
        let mut entry = self.records.get_mut(&principal_id)?;
        if entry.status == PresenceStatus::Offline {
            return None;
        }
        entry.status = PresenceStatus::Offline;
        entry.last_seen = Some(Utc::now());
        Some(entry.clone())
    }

    /// Re-derives a principal's status from the given registry fact and
    /// returns the current record. Used by the client's status_update
    /// action: presence is derived, so recompute is the only honest
    /// response to a client-reported status.
    pub fn recompute(&self, principal_id: PrincipalId, online: bool) -> PresenceRecord {
        if online {
            self.mark_online(principal_id);
        } else {
            self.mark_offline(principal_id);
        }
        self.record(principal_id)
    }

    /// Current status, `Offline` for unknown principals.
    pub fn status(&self, principal_id: PrincipalId) -> PresenceStatus {
        self.records
            .get(&principal_id)
            .map(|r| r.status)
            .unwrap_or(PresenceStatus::Offline)
    }

    /// Current record snapshot, a default offline record for unknown
    /// principals.
    pub fn record(&self, principal_id: PrincipalId) -> PresenceRecord {
        self.records
            .get(&principal_id)
            .map(|r| r.clone())
            .unwrap_or_else(|| PresenceRecord::offline(principal_id))
    }

    /// Number of principals currently online.
    pub fn online_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.status == PresenceStatus::Online)
            .count()
    }

    /// Drops all records. Test isolation only.
    pub fn clear(&self) {
        self.records.clear();
    }
}
