//! Event routing, relay scoping, and fan-out tests.

use chrono::Utc;

use campushub_core::types::id::MessageId;
use campushub_entity::Role;
use campushub_realtime::ChannelId;
use campushub_realtime::signal::types::{ServerEvent, SignalScope};

use crate::helpers::{TestHarness, drain, recv};

#[tokio::test]
async fn test_typing_events_arrive_in_submission_order() {
    let h = TestHarness::new();
    let course = h.seed_course("CS 101");
    let source = h.seed_principal("Src", Role::Student, "cs", &[course]);
    let target = h.seed_principal("Tgt", Role::Student, "cs", &[course]);

    let (src_conn, _src_rx) = h.connect(&source).await;
    let (_tgt_conn, mut tgt_rx) = h.connect(&target).await;
    drain(&mut tgt_rx);

    let scope = serde_json::json!({"type": "channel", "id": format!("course:{course}")});
    h.act(&src_conn, serde_json::json!({"action": "typing_start", "scope": scope}))
        .await;
    h.act(&src_conn, serde_json::json!({"action": "typing_stop", "scope": scope}))
        .await;

    assert!(matches!(recv(&mut tgt_rx).await, ServerEvent::TypingStarted { .. }));
    assert!(matches!(recv(&mut tgt_rx).await, ServerEvent::TypingStopped { .. }));
}

#[tokio::test]
async fn test_read_receipt_reaches_members_only() {
    let h = TestHarness::new();
    let course = h.seed_course("PHYS 201");
    let other_course = h.seed_course("LIT 7");
    let teacher = h.seed_principal("Tea", Role::Teacher, "physics", &[course]);
    let student = h.seed_principal("Stu", Role::Student, "physics", &[course]);
    let unrelated = h.seed_principal("Unr", Role::Student, "literature", &[other_course]);

    let (teacher_conn, _t_rx) = h.connect(&teacher).await;
    let (_student_conn, mut student_rx) = h.connect(&student).await;
    let (_unrelated_conn, mut unrelated_rx) = h.connect(&unrelated).await;
    drain(&mut student_rx);
    drain(&mut unrelated_rx);

    let message_id = MessageId::new();
    h.act(
        &teacher_conn,
        serde_json::json!({
            "action": "message_read",
            "message_id": message_id,
            "scope": {"type": "channel", "id": format!("course:{course}")},
        }),
    )
    .await;

    let receipts: Vec<_> = drain(&mut student_rx)
        .into_iter()
        .filter(|e| matches!(e, ServerEvent::ReadReceipt { .. }))
        .collect();
    assert_eq!(receipts.len(), 1, "member receives exactly one receipt");
    match &receipts[0] {
        ServerEvent::ReadReceipt {
            message_id: got,
            read_by,
            ..
        } => {
            assert_eq!(*got, message_id);
            assert_eq!(*read_by, teacher.id);
        }
        _ => unreachable!(),
    }

    assert!(
        drain(&mut unrelated_rx)
            .iter()
            .all(|e| !matches!(e, ServerEvent::ReadReceipt { .. })),
        "non-member must receive nothing"
    );
}

#[tokio::test]
async fn test_typing_into_foreign_scope_forbidden() {
    let h = TestHarness::new();
    let course = h.seed_course("CS 101");
    let foreign = h.seed_course("SEC 500");
    let source = h.seed_principal("Src", Role::Student, "cs", &[course]);

    let (conn, mut rx) = h.connect(&source).await;
    drain(&mut rx);

    h.act(
        &conn,
        serde_json::json!({
            "action": "typing_start",
            "scope": {"type": "channel", "id": format!("course:{foreign}")},
        }),
    )
    .await;

    assert!(matches!(
        recv(&mut rx).await,
        ServerEvent::Error { code, .. } if code == "FORBIDDEN"
    ));
}

#[tokio::test]
async fn test_chat_fanout_via_bridge() {
    let h = TestHarness::new();
    let course = h.seed_course("CS 101");
    let sender = h.seed_principal("Snd", Role::Student, "cs", &[course]);
    let member = h.seed_principal("Mem", Role::Student, "cs", &[course]);

    let (_sender_conn, _s_rx) = h.connect(&sender).await;
    let (_member_conn, mut member_rx) = h.connect(&member).await;
    drain(&mut member_rx);

    // The REST layer persists the message, then hands it to the bridge.
    let message_id = MessageId::new();
    h.engine.bridge.on_chat_message(
        ChannelId::Course(course),
        message_id,
        sender.id,
        &sender.display_name,
        "hello",
        Utc::now(),
    );

    match recv(&mut member_rx).await {
        ServerEvent::ChatMessage {
            message_id: got,
            sender_id,
            body,
            ..
        } => {
            assert_eq!(got, message_id);
            assert_eq!(sender_id, sender.id);
            assert_eq!(body, "hello");
        }
        other => panic!("expected chat message, got {other:?}"),
    }
}

#[tokio::test]
async fn test_grade_fanout_is_principal_scoped() {
    let h = TestHarness::new();
    let course = h.seed_course("CS 101");
    let graded = h.seed_principal("Grd", Role::Student, "cs", &[course]);
    let peer = h.seed_principal("Peer", Role::Student, "cs", &[course]);

    // Two devices for the graded principal: both must hear it.
    let (_g1, mut g1_rx) = h.connect(&graded).await;
    let (_g2, mut g2_rx) = h.connect(&graded).await;
    let (_peer_conn, mut peer_rx) = h.connect(&peer).await;
    drain(&mut g1_rx);
    drain(&mut g2_rx);
    drain(&mut peer_rx);

    h.engine.bridge.on_grade_posted(graded.id, course, "Midterm");

    assert!(matches!(recv(&mut g1_rx).await, ServerEvent::GradePosted { .. }));
    assert!(matches!(recv(&mut g2_rx).await, ServerEvent::GradePosted { .. }));
    assert!(
        drain(&mut peer_rx)
            .iter()
            .all(|e| !matches!(e, ServerEvent::GradePosted { .. })),
        "grades are private to the graded principal"
    );
}

#[tokio::test]
async fn test_global_announcement_reaches_everyone() {
    let h = TestHarness::new();
    let a = h.seed_principal("A", Role::Student, "cs", &[]);
    let b = h.seed_principal("B", Role::Teacher, "physics", &[]);
    let admin = h.seed_principal("Adm", Role::Admin, "administration", &[]);

    let (_ca, mut rx_a) = h.connect(&a).await;
    let (_cb, mut rx_b) = h.connect(&b).await;
    drain(&mut rx_a);
    drain(&mut rx_b);

    h.engine.bridge.on_announcement_published(
        SignalScope::Global,
        uuid::Uuid::new_v4(),
        "Maintenance",
        "The portal restarts at midnight.",
        admin.id,
    );

    assert!(matches!(recv(&mut rx_a).await, ServerEvent::Announcement { .. }));
    assert!(matches!(recv(&mut rx_b).await, ServerEvent::Announcement { .. }));
}

#[tokio::test]
async fn test_file_shared_relayed_to_channel() {
    let h = TestHarness::new();
    let course = h.seed_course("CS 101");
    let sharer = h.seed_principal("Shr", Role::Teacher, "cs", &[course]);
    let member = h.seed_principal("Mem", Role::Student, "cs", &[course]);

    let (sharer_conn, _s_rx) = h.connect(&sharer).await;
    let (_member_conn, mut member_rx) = h.connect(&member).await;
    drain(&mut member_rx);

    h.act(
        &sharer_conn,
        serde_json::json!({
            "action": "file_shared",
            "channel": format!("course:{course}"),
            "file": {
                "id": uuid::Uuid::new_v4(),
                "name": "syllabus.pdf",
                "size_bytes": 52_400,
                "mime_type": "application/pdf",
            },
        }),
    )
    .await;

    match recv(&mut member_rx).await {
        ServerEvent::FileShared { file, shared_by, .. } => {
            assert_eq!(file.name, "syllabus.pdf");
            assert_eq!(shared_by, sharer.id);
        }
        other => panic!("expected file shared, got {other:?}"),
    }
}

#[tokio::test]
async fn test_file_shared_into_deleted_course_not_found() {
    let h = TestHarness::new();
    let course = h.seed_course("CS 101");
    let sharer = h.seed_principal("Shr", Role::Teacher, "cs", &[course]);

    let (conn, mut rx) = h.connect(&sharer).await;
    drain(&mut rx);

    h.directory.remove_course(course);
    h.act(
        &conn,
        serde_json::json!({
            "action": "file_shared",
            "channel": format!("course:{course}"),
            "file": {
                "id": uuid::Uuid::new_v4(),
                "name": "late.pdf",
                "size_bytes": 1,
                "mime_type": null,
            },
        }),
    )
    .await;

    assert!(matches!(
        recv(&mut rx).await,
        ServerEvent::Error { code, .. } if code == "NOT_FOUND"
    ));
}
