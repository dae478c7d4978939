//! Individual connection handle.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use campushub_core::types::id::{ConnectionId, PrincipalId};
use campushub_entity::Principal;

use crate::signal::types::ServerEvent;

/// A handle to a single live connection.
///
/// Holds the sender half of the connection's outbound queue plus the
/// principal snapshot captured at handshake time. The queue is FIFO per
/// connection, which is what gives the router its per-source→target
/// ordering guarantee.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// Principal snapshot from the identity verifier.
    pub principal: Principal,
    /// When the connection was established.
    pub established_at: DateTime<Utc>,
    /// Sender for outbound events.
    sender: mpsc::Sender<ServerEvent>,
    /// Last pong received.
    last_pong: RwLock<DateTime<Utc>>,
    /// Whether the connection is still open.
    alive: AtomicBool,
}

impl ConnectionHandle {
    /// Creates a new connection handle.
    pub fn new(principal: Principal, sender: mpsc::Sender<ServerEvent>) -> Self {
        let now = Utc::now();
        Self {
            id: ConnectionId::new(),
            principal,
            established_at: now,
            sender,
            last_pong: RwLock::new(now),
            alive: AtomicBool::new(true),
        }
    }

    /// The owning principal's ID.
    pub fn principal_id(&self) -> PrincipalId {
        self.principal.id
    }

    /// Queues an event for delivery. Returns `false` if the connection is
    /// closed or its buffer is full; delivery is best-effort, at most
    /// once, and never blocks the caller.
    pub fn send(&self, event: ServerEvent) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Send buffer full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_closed();
                false
            }
        }
    }

    /// Check if the connection is open.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark the connection closed. Idempotent.
    pub fn mark_closed(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Record a pong response.
    pub fn record_pong(&self) {
        let mut lp = self.last_pong.write().unwrap_or_else(|e| e.into_inner());
        *lp = Utc::now();
    }

    /// Last pong timestamp.
    pub fn last_pong(&self) -> DateTime<Utc> {
        *self.last_pong.read().unwrap_or_else(|e| e.into_inner())
    }
}
