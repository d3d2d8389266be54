// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use h2_core::{AgentName, Message, MessageStatus, Priority};
use h2_storage::ActivityLog;
use h2_wire::{Request, Response};
use std::path::Path;
use std::time::Duration;

fn spec(name: &str) -> LaunchSpec {
    let name: AgentName = name.parse().unwrap();
    LaunchSpec::command(name, std::env::temp_dir(), "cat")
}

async fn request(socket: &Path, request: &Request) -> Response {
    let stream = tokio::net::UnixStream::connect(socket).await.unwrap();
    let (mut reader, mut writer) = stream.into_split();
    h2_wire::write_request(&mut writer, request).await.unwrap();
    h2_wire::read_response(&mut reader, Duration::from_secs(5)).await.unwrap()
}

async fn wait_for_socket(socket: &Path) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if tokio::net::UnixStream::connect(socket).await.is_ok() {
            return;
        }
        assert!(tokio::time::Instant::now() < deadline, "socket never appeared");
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

async fn wait_delivered(socket: &Path, id: &str) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let resp = request(socket, &Request::Show { message_id: id.to_string() }).await;
        if resp.message.as_ref().map(|m| m.status) == Some(MessageStatus::Delivered) {
            return;
        }
        assert!(tokio::time::Instant::now() < deadline, "message never delivered");
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

#[tokio::test]
async fn full_session_send_status_stop() {
    std::env::set_var("H2_DRAIN_TIMEOUT_MS", "50");
    let tmp = tempfile::tempdir().unwrap();
    let dir = H2Dir::new(tmp.path());

    let handle = tokio::spawn(Supervisor::new(dir.clone(), spec("life-test")).run());
    let socket = dir.agent_socket_path("life-test");
    wait_for_socket(&socket).await;

    assert!(dir.pidfile_path("life-test").exists());
    assert!(dir.metadata_path("life-test").exists());

    let resp = request(
        &socket,
        &Request::Send {
            priority: Priority::Normal,
            from: "tester".to_string(),
            body: "hello".to_string(),
            raw: false,
        },
    )
    .await;
    assert!(resp.ok, "{:?}", resp.error);
    let id = resp.message_id.unwrap();
    wait_delivered(&socket, &id).await;

    let resp = request(&socket, &Request::Status).await;
    let agent = resp.agent.unwrap();
    assert_eq!(agent.name, "life-test");
    assert_eq!(agent.queued, 0);

    let resp = request(&socket, &Request::Stop).await;
    assert!(resp.ok);
    handle.await.unwrap().unwrap();

    assert!(!socket.exists(), "socket unlinked at shutdown");
    assert!(!dir.pidfile_path("life-test").exists(), "pidfile unlinked at shutdown");

    let entries = ActivityLog::read_entries(&dir.activity_path("life-test"));
    let tags: Vec<&str> = entries
        .iter()
        .map(|e| match &e.event {
            ActivityEvent::SessionStart { .. } => "session_start",
            ActivityEvent::StateChange { .. } => "state_change",
            ActivityEvent::MessageEnqueued { .. } => "message_enqueued",
            ActivityEvent::MessageDelivered { .. } => "message_delivered",
            _ => "other",
        })
        .collect();
    assert_eq!(tags.first(), Some(&"session_start"));
    assert!(tags.contains(&"message_delivered"));
    match &entries.last().unwrap().event {
        ActivityEvent::SessionSummary { delivered, .. } => assert_eq!(*delivered, 1),
        other => panic!("expected session_summary last, got {other:?}"),
    }
}

#[tokio::test]
async fn recovers_queued_messages_from_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = H2Dir::new(tmp.path());

    // A message left behind by a previous (crashed) supervisor.
    let store = MessageStore::open(dir.messages_dir("recover-test")).unwrap();
    let stranded = Message::new("tester", "stranded", Priority::Normal);
    let id = stranded.id.to_string();
    store.persist(&stranded).unwrap();

    let handle = tokio::spawn(Supervisor::new(dir.clone(), spec("recover-test")).run());
    let socket = dir.agent_socket_path("recover-test");
    wait_for_socket(&socket).await;
    wait_delivered(&socket, &id).await;

    let resp = request(&socket, &Request::Stop).await;
    assert!(resp.ok);
    handle.await.unwrap().unwrap();

    // Delivered exactly once, durably.
    let on_disk = store.load(&stranded.id).unwrap().unwrap();
    assert_eq!(on_disk.status, MessageStatus::Delivered);
}

#[tokio::test]
async fn second_supervisor_for_same_agent_is_rejected() {
    std::env::set_var("H2_DRAIN_TIMEOUT_MS", "50");
    let tmp = tempfile::tempdir().unwrap();
    let dir = H2Dir::new(tmp.path());

    let handle = tokio::spawn(Supervisor::new(dir.clone(), spec("dup-test")).run());
    let socket = dir.agent_socket_path("dup-test");
    wait_for_socket(&socket).await;

    let err = Supervisor::new(dir.clone(), spec("dup-test")).run().await.unwrap_err();
    assert!(matches!(err, SupervisorError::AlreadyRunning(_)));

    let resp = request(&socket, &Request::Stop).await;
    assert!(resp.ok);
    handle.await.unwrap().unwrap();
}
