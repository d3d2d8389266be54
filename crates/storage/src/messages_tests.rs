// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use h2_core::Priority;

fn store() -> (tempfile::TempDir, MessageStore) {
    let tmp = tempfile::tempdir().unwrap();
    let store = MessageStore::open(tmp.path().join("messages")).unwrap();
    (tmp, store)
}

fn message_at(ms: u64, body: &str) -> Message {
    let mut m = Message::new("alice", body, Priority::Normal);
    m.id = MessageId::at(ms);
    m.created_at_ms = ms;
    m
}

#[test]
fn persist_then_load_round_trips() {
    let (_tmp, store) = store();
    let msg = message_at(1_000, "hello");
    store.persist(&msg).unwrap();
    assert_eq!(store.load(&msg.id).unwrap(), Some(msg));
}

#[test]
fn load_missing_is_none() {
    let (_tmp, store) = store();
    assert_eq!(store.load(&MessageId::at(1)).unwrap(), None);
}

#[test]
fn persist_leaves_no_tmp_file() {
    let (_tmp, store) = store();
    let msg = message_at(1_000, "hello");
    store.persist(&msg).unwrap();
    let names: Vec<String> = std::fs::read_dir(store.dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![format!("{}.json", msg.id)]);
}

#[test]
fn scan_returns_undelivered_in_creation_order() {
    let (_tmp, store) = store();
    let first = message_at(1_000, "first");
    let second = message_at(2_000, "second");
    let mut done = message_at(1_500, "done");
    done.status = MessageStatus::Delivered;
    done.delivered_at_ms = Some(1_600);

    // Write newest first to prove ordering comes from ids, not readdir.
    store.persist(&second).unwrap();
    store.persist(&done).unwrap();
    store.persist(&first).unwrap();

    let scanned = store.scan_undelivered().unwrap();
    assert_eq!(scanned, vec![first, second]);
}

#[test]
fn scan_demotes_delivering_to_queued() {
    let (_tmp, store) = store();
    let mut interrupted = message_at(1_000, "interrupted");
    interrupted.status = MessageStatus::Delivering;
    store.persist(&interrupted).unwrap();

    let scanned = store.scan_undelivered().unwrap();
    assert_eq!(scanned.len(), 1);
    assert_eq!(scanned[0].status, MessageStatus::Queued);

    // The demotion is durable, not just in the returned value.
    let on_disk = store.load(&interrupted.id).unwrap().unwrap();
    assert_eq!(on_disk.status, MessageStatus::Queued);
}

#[test]
fn scan_skips_garbage_files() {
    let (_tmp, store) = store();
    std::fs::write(store.dir().join("not-a-message.json"), b"{torn").unwrap();
    std::fs::write(store.dir().join("README"), b"ignore me").unwrap();
    let msg = message_at(1_000, "ok");
    store.persist(&msg).unwrap();
    assert_eq!(store.scan_undelivered().unwrap(), vec![msg]);
}

#[test]
fn status_update_rewrites_in_place() {
    let (_tmp, store) = store();
    let mut msg = message_at(1_000, "hello");
    store.persist(&msg).unwrap();

    msg.status = MessageStatus::Delivering;
    store.persist(&msg).unwrap();
    msg.status = MessageStatus::Delivered;
    msg.delivered_at_ms = Some(2_000);
    store.persist(&msg).unwrap();

    let on_disk = store.load(&msg.id).unwrap().unwrap();
    assert_eq!(on_disk.status, MessageStatus::Delivered);
    assert_eq!(on_disk.delivered_at_ms, Some(2_000));
    // Delivered messages are never re-queued.
    assert!(store.scan_undelivered().unwrap().is_empty());
}
