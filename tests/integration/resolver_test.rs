//! Membership resolution tests: connect-time defaults, store outage
//! degradation, and fresh re-query on explicit joins.

use campushub_entity::Role;
use campushub_realtime::ChannelId;
use campushub_realtime::signal::types::ServerEvent;

use crate::helpers::{TestHarness, drain, recv, recv_matching};

#[tokio::test]
async fn test_default_channel_set_on_connect() {
    let h = TestHarness::new();
    let course = h.seed_course("CS 101");
    let student = h.seed_principal("Sam", Role::Student, "cs", &[course]);

    let (conn, _rx) = h.connect(&student).await;

    assert!(h.engine.channels.is_subscribed(&ChannelId::Personal(student.id), conn.id));
    assert!(h.engine.channels.is_subscribed(&ChannelId::Course(course), conn.id));
    assert!(h.engine.channels.is_subscribed(
        &ChannelId::Department("cs".to_string()),
        conn.id
    ));
    assert_eq!(h.engine.channels.subscription_count(conn.id), 3);
}

#[tokio::test]
async fn test_store_outage_degrades_and_recovers() {
    let h = TestHarness::new();
    let course = h.seed_course("CS 101");
    let student = h.seed_principal("Sam", Role::Student, "cs", &[course]);

    h.directory.set_unavailable(true);
    let (conn, mut rx) = h.connect(&student).await;

    // Handshake survives: personal channel is live, the rest is deferred
    // and announced as retryable.
    assert!(h.engine.channels.is_subscribed(&ChannelId::Personal(student.id), conn.id));
    assert_eq!(h.engine.channels.subscription_count(conn.id), 1);
    match recv(&mut rx).await {
        ServerEvent::ResolutionPending { retryable, pending, .. } => {
            assert!(retryable);
            assert!(!pending.is_empty());
        }
        other => panic!("expected resolution pending, got {other:?}"),
    }

    // Store comes back; the background retry subscribes the remainder
    // and confirms each channel.
    h.directory.set_unavailable(false);

    let mut joined = Vec::new();
    while joined.len() < 2 {
        if let ServerEvent::Joined { channel, .. } =
            recv_matching(&mut rx, |e| matches!(e, ServerEvent::Joined { .. })).await
        {
            joined.push(channel);
        }
    }
    assert!(joined.contains(&ChannelId::Course(course)));
    assert!(joined.contains(&ChannelId::Department("cs".to_string())));
    assert!(h.engine.channels.is_subscribed(&ChannelId::Course(course), conn.id));
}

#[tokio::test]
async fn test_join_during_outage_is_retryable_and_survivable() {
    let h = TestHarness::new();
    let course = h.seed_course("CS 101");
    let extra = h.seed_course("CS 102");
    let student = h.seed_principal("Sam", Role::Student, "cs", &[course]);

    let (conn, mut rx) = h.connect(&student).await;
    drain(&mut rx);

    h.directory.enroll(student.id, extra);
    h.directory.set_unavailable(true);
    h.act(
        &conn,
        serde_json::json!({"action": "join", "channel": format!("course:{extra}")}),
    )
    .await;
    assert!(matches!(
        recv(&mut rx).await,
        ServerEvent::Error { code, .. } if code == "STORE_UNAVAILABLE"
    ));

    // The connection survived; the same join succeeds once the store is
    // back.
    h.directory.set_unavailable(false);
    h.act(
        &conn,
        serde_json::json!({"action": "join", "channel": format!("course:{extra}")}),
    )
    .await;
    assert!(matches!(recv(&mut rx).await, ServerEvent::Joined { .. }));
}

#[tokio::test]
async fn test_join_requeries_instead_of_trusting_snapshot() {
    let h = TestHarness::new();
    let course = h.seed_course("CS 101");
    let late = h.seed_course("CS 200");
    let student = h.seed_principal("Sam", Role::Student, "cs", &[course]);

    let (conn, mut rx) = h.connect(&student).await;
    drain(&mut rx);

    // Enrollment happened after connect: the stale snapshot knows
    // nothing about it, the fresh query allows the join.
    h.directory.enroll(student.id, late);
    h.act(
        &conn,
        serde_json::json!({"action": "join", "channel": format!("course:{late}")}),
    )
    .await;
    assert!(matches!(recv(&mut rx).await, ServerEvent::Joined { .. }));

    // Withdrawal also takes effect immediately, snapshot notwithstanding.
    h.directory.withdraw(student.id, course);
    h.act(&conn, serde_json::json!({"action": "leave", "channel": format!("course:{course}")}))
        .await;
    drain(&mut rx);
    h.act(
        &conn,
        serde_json::json!({"action": "join", "channel": format!("course:{course}")}),
    )
    .await;
    assert!(matches!(
        recv(&mut rx).await,
        ServerEvent::Error { code, .. } if code == "FORBIDDEN"
    ));
}
