//! Shared test helpers for integration tests.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use campushub_core::config::realtime::RealtimeConfig;
use campushub_core::types::id::{CourseId, PrincipalId};
use campushub_directory::{CourseRecord, DirectoryStore, InMemoryDirectory};
use campushub_entity::{Principal, Role};
use campushub_realtime::RealtimeEngine;
use campushub_realtime::connection::handle::ConnectionHandle;
use campushub_realtime::signal::types::ServerEvent;

/// Engine plus seedable directory for driving the core end to end.
pub struct TestHarness {
    /// The seedable external store.
    pub directory: Arc<InMemoryDirectory>,
    /// The engine under test.
    pub engine: RealtimeEngine,
}

impl TestHarness {
    /// Creates a harness with fast retry timings.
    pub fn new() -> Self {
        let directory = Arc::new(InMemoryDirectory::new());
        let config = RealtimeConfig {
            channel_buffer_size: 64,
            resolver_retry_attempts: 3,
            resolver_retry_backoff_ms: 50,
            ..RealtimeConfig::default()
        };
        let engine = RealtimeEngine::new(config, directory.clone() as Arc<dyn DirectoryStore>);
        Self { directory, engine }
    }

    /// Seeds a course and returns its id.
    pub fn seed_course(&self, label: &str) -> CourseId {
        let id = CourseId::new();
        self.directory.upsert_course(CourseRecord {
            id,
            label: label.to_string(),
        });
        id
    }

    /// Seeds a principal and returns the snapshot.
    pub fn seed_principal(
        &self,
        name: &str,
        role: Role,
        department: &str,
        courses: &[CourseId],
    ) -> Principal {
        let principal = Principal {
            id: PrincipalId::new(),
            display_name: name.to_string(),
            role,
            department: department.to_string(),
            courses: courses.iter().copied().collect::<HashSet<_>>(),
            active: true,
        };
        self.directory.upsert_principal(principal.clone());
        principal
    }

    /// Opens a connection for a principal, as the transport would after
    /// a successful handshake.
    pub async fn connect(
        &self,
        principal: &Principal,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<ServerEvent>) {
        self.engine.connections.register(principal.clone()).await
    }

    /// Sends a raw client action, exercising the full parse + dispatch
    /// path.
    pub async fn act(&self, conn: &Arc<ConnectionHandle>, action: serde_json::Value) {
        self.engine
            .connections
            .handle_action(&conn.id, &action.to_string())
            .await;
    }
}

/// Receives the next event or panics after a deadline.
pub async fn recv(rx: &mut mpsc::Receiver<ServerEvent>) -> ServerEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Drains every event already queued, without waiting.
pub fn drain(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Waits until an event matching the predicate arrives, skipping others.
pub async fn recv_matching(
    rx: &mut mpsc::Receiver<ServerEvent>,
    pred: impl Fn(&ServerEvent) -> bool,
) -> ServerEvent {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let remaining = deadline
            .checked_duration_since(tokio::time::Instant::now())
            .expect("timed out waiting for matching event");
        let event = tokio::time::timeout(remaining, rx.recv())
            .await
            .expect("timed out waiting for matching event")
            .expect("event channel closed");
        if pred(&event) {
            return event;
        }
    }
}
