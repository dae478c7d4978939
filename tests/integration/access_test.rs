//! Join authorization and default-channel resolution tests.

use campushub_entity::Role;
use campushub_realtime::ChannelId;
use campushub_realtime::signal::types::ServerEvent;

use crate::helpers::{TestHarness, drain, recv};

#[tokio::test]
async fn test_foreign_course_join_forbidden() {
    let h = TestHarness::new();
    let own = h.seed_course("CS 101");
    let foreign = h.seed_course("LAW 900");
    let student = h.seed_principal("Sam", Role::Student, "cs", &[own]);

    let (conn, mut rx) = h.connect(&student).await;
    drain(&mut rx);

    h.act(
        &conn,
        serde_json::json!({"action": "join", "channel": format!("course:{foreign}")}),
    )
    .await;

    match recv(&mut rx).await {
        ServerEvent::Error { code, .. } => assert_eq!(code, "FORBIDDEN"),
        other => panic!("expected forbidden error, got {other:?}"),
    }
    assert!(
        !h.engine
            .channels
            .is_subscribed(&ChannelId::Course(foreign), conn.id)
    );
}

#[tokio::test]
async fn test_teacher_forbidden_outside_taught_courses() {
    let h = TestHarness::new();
    let taught = h.seed_course("MATH 20");
    let other = h.seed_course("MATH 30");
    let teacher = h.seed_principal("Tea", Role::Teacher, "maths", &[taught]);

    let (conn, mut rx) = h.connect(&teacher).await;
    drain(&mut rx);

    h.act(
        &conn,
        serde_json::json!({"action": "join", "channel": format!("course:{other}")}),
    )
    .await;

    assert!(matches!(
        recv(&mut rx).await,
        ServerEvent::Error { code, .. } if code == "FORBIDDEN"
    ));
}

#[tokio::test]
async fn test_admin_joins_any_course() {
    let h = TestHarness::new();
    let course = h.seed_course("ART 5");
    let admin = h.seed_principal("Adm", Role::Admin, "administration", &[]);

    let (conn, mut rx) = h.connect(&admin).await;
    drain(&mut rx);

    // Admins are auto-subscribed at connect; leave first so the explicit
    // join is exercised on a clean slate.
    h.act(
        &conn,
        serde_json::json!({"action": "leave", "channel": format!("course:{course}")}),
    )
    .await;
    drain(&mut rx);

    h.act(
        &conn,
        serde_json::json!({"action": "join", "channel": format!("course:{course}")}),
    )
    .await;

    match recv(&mut rx).await {
        ServerEvent::Joined { channel, label } => {
            assert_eq!(channel, ChannelId::Course(course));
            assert_eq!(label, "ART 5");
        }
        other => panic!("expected joined, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_missing_course_not_found() {
    let h = TestHarness::new();
    let course = h.seed_course("GEO 1");
    let student = h.seed_principal("Sam", Role::Student, "geo", &[course]);

    let (conn, mut rx) = h.connect(&student).await;
    drain(&mut rx);

    h.directory.remove_course(course);
    h.act(
        &conn,
        serde_json::json!({"action": "join", "channel": format!("course:{course}")}),
    )
    .await;

    assert!(matches!(
        recv(&mut rx).await,
        ServerEvent::Error { code, .. } if code == "NOT_FOUND"
    ));
}

#[tokio::test]
async fn test_admin_auto_subscribed_to_every_course() {
    let h = TestHarness::new();
    let courses: Vec<_> = (0..4).map(|i| h.seed_course(&format!("C{i}"))).collect();
    let admin = h.seed_principal("Adm", Role::Admin, "administration", &[]);

    let (conn, _rx) = h.connect(&admin).await;

    for course in &courses {
        assert!(
            h.engine
                .channels
                .is_subscribed(&ChannelId::Course(*course), conn.id),
            "admin missing course channel"
        );
    }
    // Personal + department + every course.
    assert_eq!(
        h.engine.channels.subscription_count(conn.id),
        courses.len() + 2
    );
}

#[tokio::test]
async fn test_rejoin_after_leave_is_clean() {
    let h = TestHarness::new();
    let course = h.seed_course("CHEM 2");
    let student = h.seed_principal("Sam", Role::Student, "chemistry", &[course]);

    let (conn, mut rx) = h.connect(&student).await;
    drain(&mut rx);
    let channel = format!("course:{course}");

    // Already subscribed from connect; leave, then join twice around
    // another leave. Each join must behave identically.
    h.act(&conn, serde_json::json!({"action": "leave", "channel": channel})).await;
    assert!(matches!(recv(&mut rx).await, ServerEvent::Left { .. }));

    h.act(&conn, serde_json::json!({"action": "join", "channel": channel})).await;
    let first = recv(&mut rx).await;

    h.act(&conn, serde_json::json!({"action": "leave", "channel": channel})).await;
    assert!(matches!(recv(&mut rx).await, ServerEvent::Left { .. }));

    h.act(&conn, serde_json::json!({"action": "join", "channel": channel})).await;
    let second = recv(&mut rx).await;

    match (&first, &second) {
        (
            ServerEvent::Joined { channel: c1, label: l1 },
            ServerEvent::Joined { channel: c2, label: l2 },
        ) => {
            assert_eq!(c1, c2);
            assert_eq!(l1, l2);
        }
        other => panic!("expected two joined events, got {other:?}"),
    }
    assert!(
        h.engine
            .channels
            .is_subscribed(&ChannelId::Course(course), conn.id)
    );
}

#[tokio::test]
async fn test_personal_channel_closed_to_admins() {
    let h = TestHarness::new();
    let student = h.seed_principal("Sam", Role::Student, "cs", &[]);
    let admin = h.seed_principal("Adm", Role::Admin, "administration", &[]);

    let (conn, mut rx) = h.connect(&admin).await;
    drain(&mut rx);

    h.act(
        &conn,
        serde_json::json!({"action": "join", "channel": format!("personal:{}", student.id)}),
    )
    .await;

    assert!(matches!(
        recv(&mut rx).await,
        ServerEvent::Error { code, .. } if code == "FORBIDDEN"
    ));
}
