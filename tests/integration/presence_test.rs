//! Presence derivation and transition-broadcast tests.

use campushub_entity::Role;
use campushub_realtime::presence::status::PresenceStatus;
use campushub_realtime::signal::types::{CloseReason, ServerEvent};

use crate::helpers::{TestHarness, drain};

fn status_updates(events: &[ServerEvent]) -> Vec<(PresenceStatus, Option<chrono::DateTime<chrono::Utc>>)> {
    events
        .iter()
        .filter_map(|e| match e {
            ServerEvent::StatusUpdate {
                status, last_seen, ..
            } => Some((*status, *last_seen)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_is_online_tracks_live_set() {
    let h = TestHarness::new();
    let course = h.seed_course("CS 101");
    let p = h.seed_principal("Pat", Role::Student, "cs", &[course]);

    assert!(!h.engine.connections.is_online(p.id));

    let (c1, _rx1) = h.connect(&p).await;
    assert!(h.engine.connections.is_online(p.id));

    let (c2, _rx2) = h.connect(&p).await;
    assert!(h.engine.connections.is_online(p.id));

    h.engine.connections.unregister(&c1.id, CloseReason::NormalClose);
    assert!(h.engine.connections.is_online(p.id));

    h.engine.connections.unregister(&c2.id, CloseReason::TransportError);
    assert!(!h.engine.connections.is_online(p.id));
}

#[tokio::test]
async fn test_multi_device_single_offline_broadcast() {
    let h = TestHarness::new();
    let course = h.seed_course("PHYS 201");
    let p = h.seed_principal("Pat", Role::Student, "physics", &[course]);
    let observer = h.seed_principal("Obs", Role::Student, "physics", &[course]);

    let (_obs_conn, mut obs_rx) = h.connect(&observer).await;
    // Discard the observer's own connect-time broadcast.
    drain(&mut obs_rx);

    let (c1, _rx1) = h.connect(&p).await;
    let updates = status_updates(&drain(&mut obs_rx));
    assert_eq!(updates.len(), 1, "exactly one Online broadcast");
    assert_eq!(updates[0].0, PresenceStatus::Online);

    // Second device: already online, no new transition.
    let (c2, _rx2) = h.connect(&p).await;
    assert!(status_updates(&drain(&mut obs_rx)).is_empty());

    // First device closes; the live set is non-empty, so no broadcast.
    h.engine.connections.unregister(&c1.id, CloseReason::NormalClose);
    assert!(status_updates(&drain(&mut obs_rx)).is_empty());

    // Last device closes: exactly one Offline broadcast with last_seen.
    h.engine.connections.unregister(&c2.id, CloseReason::NormalClose);
    let updates = status_updates(&drain(&mut obs_rx));
    assert_eq!(updates.len(), 1, "exactly one Offline broadcast");
    assert_eq!(updates[0].0, PresenceStatus::Offline);
    assert!(updates[0].1.is_some(), "last_seen stamped on offline");
}

#[tokio::test]
async fn test_double_unregister_is_silent() {
    let h = TestHarness::new();
    let course = h.seed_course("HIST 10");
    let p = h.seed_principal("Pat", Role::Student, "history", &[course]);
    let observer = h.seed_principal("Obs", Role::Teacher, "history", &[course]);

    let (_obs_conn, mut obs_rx) = h.connect(&observer).await;
    let (conn, _rx) = h.connect(&p).await;
    drain(&mut obs_rx);

    h.engine.connections.unregister(&conn.id, CloseReason::NormalClose);
    h.engine.connections.unregister(&conn.id, CloseReason::TransportError);

    let updates = status_updates(&drain(&mut obs_rx));
    assert_eq!(updates.len(), 1, "second unregister must not re-emit");
    assert!(!h.engine.connections.is_online(p.id));
}

#[tokio::test]
async fn test_engine_reset_clears_all_state() {
    let h = TestHarness::new();
    let course = h.seed_course("CS 1");
    let p = h.seed_principal("Pat", Role::Student, "cs", &[course]);

    let (conn, _rx) = h.connect(&p).await;
    assert!(h.engine.registry.connection_count() > 0);

    h.engine.reset();

    assert_eq!(h.engine.registry.connection_count(), 0);
    assert_eq!(h.engine.channels.channel_count(), 0);
    assert!(!h.engine.connections.is_online(p.id));
    assert!(!conn.is_alive());
}

#[tokio::test]
async fn test_status_update_action_rebroadcasts_derived_state() {
    let h = TestHarness::new();
    let course = h.seed_course("BIO 3");
    let p = h.seed_principal("Pat", Role::Student, "biology", &[course]);
    let observer = h.seed_principal("Obs", Role::Student, "biology", &[course]);

    let (_obs_conn, mut obs_rx) = h.connect(&observer).await;
    let (conn, _rx) = h.connect(&p).await;
    drain(&mut obs_rx);

    // The client may claim whatever it likes; the broadcast carries the
    // derived state.
    h.act(&conn, serde_json::json!({"action": "status_update", "status": "away"}))
        .await;

    let updates = status_updates(&drain(&mut obs_rx));
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, PresenceStatus::Online);
}
