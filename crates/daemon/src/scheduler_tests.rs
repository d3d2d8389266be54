// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::pty::PtyHost;
use crate::scrollback::Scrollback;
use h2_core::{AgentName, LaunchSpec, Message};
use h2_storage::{ActivityLog, MessageStore};
use std::sync::Arc;

const WINDOW: Duration = Duration::from_millis(750);

fn queue_with(priorities: &[Priority]) -> PriorityQueue {
    let mut q = PriorityQueue::new();
    for (i, p) in priorities.iter().enumerate() {
        q.push(Message::new("test", format!("m{i}"), *p));
    }
    q
}

fn idle_for(now: Instant, elapsed: Duration) -> Option<Instant> {
    Some(now - elapsed)
}

#[test]
fn empty_queue_waits() {
    let now = Instant::now();
    let q = PriorityQueue::new();
    assert_eq!(
        next_action(&q, &AgentState::Idle, idle_for(now, WINDOW * 2), None, now, WINDOW),
        Action::Wait
    );
}

#[test]
fn exited_schedules_nothing() {
    let now = Instant::now();
    let q = queue_with(&[Priority::Interrupt, Priority::Normal]);
    assert_eq!(next_action(&q, &AgentState::Exited, None, None, now, WINDOW), Action::Exit);
}

#[yare::parameterized(
    active = { AgentState::Active },
    idle = { AgentState::Idle },
    blocked = { AgentState::BlockedOnPermission { tool: None } },
)]
fn interrupt_delivers_in_any_live_state(state: AgentState) {
    let now = Instant::now();
    let q = queue_with(&[Priority::Interrupt]);
    assert_eq!(
        next_action(&q, &state, None, None, now, WINDOW),
        Action::Deliver(Priority::Interrupt)
    );
}

#[test]
fn normal_is_held_while_blocked() {
    let now = Instant::now();
    let q = queue_with(&[Priority::Normal]);
    let blocked = AgentState::BlockedOnPermission { tool: Some("Bash".to_string()) };
    assert_eq!(next_action(&q, &blocked, None, None, now, WINDOW), Action::Wait);
    assert_eq!(
        next_action(&q, &AgentState::Active, None, None, now, WINDOW),
        Action::Deliver(Priority::Normal)
    );
    assert_eq!(
        next_action(&q, &AgentState::Idle, idle_for(now, Duration::ZERO), None, now, WINDOW),
        Action::Deliver(Priority::Normal)
    );
}

#[test]
fn interrupt_overtakes_held_normal_on_blocked_agent() {
    let now = Instant::now();
    let mut q = queue_with(&[Priority::Normal]);
    q.push(Message::new("test", "urgent", Priority::Interrupt));
    let blocked = AgentState::BlockedOnPermission { tool: None };
    assert_eq!(
        next_action(&q, &blocked, None, None, now, WINDOW),
        Action::Deliver(Priority::Interrupt)
    );
}

#[test]
fn idle_first_waits_for_quiesce_window() {
    let now = Instant::now();
    let q = queue_with(&[Priority::IdleFirst]);

    // Active: nothing to do but wait for a state change.
    assert_eq!(next_action(&q, &AgentState::Active, None, None, now, WINDOW), Action::Wait);

    // Idle for less than the window: sleep until it opens.
    let idle_since = now - Duration::from_millis(100);
    match next_action(&q, &AgentState::Idle, Some(idle_since), None, now, WINDOW) {
        Action::Sleep(deadline) => assert_eq!(deadline, idle_since + WINDOW),
        other => panic!("expected sleep, got {other:?}"),
    }

    // Quiesced: deliver.
    assert_eq!(
        next_action(&q, &AgentState::Idle, idle_for(now, WINDOW), None, now, WINDOW),
        Action::Deliver(Priority::IdleFirst)
    );
}

#[test]
fn idle_requires_quiesce_and_no_recent_urgent_delivery() {
    let now = Instant::now();
    let q = queue_with(&[Priority::Idle]);
    let idle_since = idle_for(now, WINDOW * 2);

    // A higher-priority delivery inside the window holds idle back.
    let recent = Some(now - Duration::from_millis(100));
    match next_action(&q, &AgentState::Idle, idle_since, recent, now, WINDOW) {
        Action::Sleep(deadline) => {
            assert_eq!(deadline, now - Duration::from_millis(100) + WINDOW)
        }
        other => panic!("expected sleep, got {other:?}"),
    }

    // Urgent delivery long enough ago: clear to go.
    let old = Some(now - WINDOW * 3);
    assert_eq!(
        next_action(&q, &AgentState::Idle, idle_since, old, now, WINDOW),
        Action::Deliver(Priority::Idle)
    );
    assert_eq!(
        next_action(&q, &AgentState::Idle, idle_since, None, now, WINDOW),
        Action::Deliver(Priority::Idle)
    );
}

#[test]
fn idle_short_lull_never_fires() {
    // The agent flipped idle only briefly: no idle delivery inside the window.
    let now = Instant::now();
    let q = queue_with(&[Priority::Idle, Priority::IdleFirst]);
    let action = next_action(
        &q,
        &AgentState::Idle,
        idle_for(now, Duration::from_millis(10)),
        None,
        now,
        WINDOW,
    );
    assert!(matches!(action, Action::Sleep(_)), "{action:?}");
}

#[test]
fn priority_order_when_all_eligible() {
    let now = Instant::now();
    let q = queue_with(&[Priority::Idle, Priority::IdleFirst, Priority::Normal, Priority::Interrupt]);
    let idle_since = idle_for(now, WINDOW * 2);
    assert_eq!(
        next_action(&q, &AgentState::Idle, idle_since, None, now, WINDOW),
        Action::Deliver(Priority::Interrupt)
    );

    let q = queue_with(&[Priority::Idle, Priority::IdleFirst, Priority::Normal]);
    assert_eq!(
        next_action(&q, &AgentState::Idle, idle_since, None, now, WINDOW),
        Action::Deliver(Priority::Normal)
    );

    let q = queue_with(&[Priority::Idle, Priority::IdleFirst]);
    assert_eq!(
        next_action(&q, &AgentState::Idle, idle_since, None, now, WINDOW),
        Action::Deliver(Priority::IdleFirst)
    );
}

#[test]
fn already_quiesced_idle_first_fires_immediately() {
    // Enqueued while the agent has been idle past the window: no fresh wait.
    let now = Instant::now();
    let q = queue_with(&[Priority::IdleFirst]);
    assert_eq!(
        next_action(&q, &AgentState::Idle, idle_for(now, WINDOW * 10), None, now, WINDOW),
        Action::Deliver(Priority::IdleFirst)
    );
}

// End-to-end: a real PTY child, a real store, the real scheduler task.

struct Rig {
    _tmp: tempfile::TempDir,
    shared: Arc<Shared>,
    host: Arc<PtyHost>,
    cancel: CancellationToken,
}

fn rig() -> Rig {
    let tmp = tempfile::tempdir().unwrap();
    let store = MessageStore::open(tmp.path().join("messages")).unwrap();
    let activity = ActivityLog::open(tmp.path().join("session-activity.jsonl"));
    let (shared, _state_rx) = Shared::new(store, activity);

    let name: AgentName = "sched-test".parse().unwrap();
    let spec = LaunchSpec::command(name, std::env::temp_dir(), "cat");
    let scrollback = Scrollback::new(tmp.path().join("scrollback.log"), 1024 * 1024);
    let host = Arc::new(PtyHost::spawn(&spec, tmp.path(), "s1", scrollback).unwrap());

    let cancel = CancellationToken::new();
    let scheduler = Scheduler {
        shared: Arc::clone(&shared),
        input_tx: host.input_sender(),
        exit_rx: host.exit_receiver(),
        cancel: cancel.clone(),
        window: Duration::from_millis(50),
    };
    tokio::spawn(scheduler.run());

    Rig { _tmp: tmp, shared, host, cancel }
}

async fn wait_for_status(
    shared: &Shared,
    id: &h2_core::MessageId,
    status: MessageStatus,
) -> Message {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(m) = shared.store.load(id).unwrap() {
            if m.status == status {
                return m;
            }
        }
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {status}");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn delivers_normal_message_to_idle_agent() {
    let r = rig();
    let msg = Message::new("alice", "hello", Priority::Normal);
    let id = r.shared.enqueue(msg).unwrap();

    let delivered = wait_for_status(&r.shared, &id, MessageStatus::Delivered).await;
    assert!(delivered.delivered_at_ms.is_some());
    assert_eq!(r.shared.delivered_count(), 1);

    r.cancel.cancel();
    r.host.kill();
}

#[tokio::test]
async fn equal_priority_messages_deliver_in_fifo_order() {
    let r = rig();
    let mut rx = r.host.subscribe_output();
    let a = r.shared.enqueue(Message::new("alice", "first", Priority::Normal)).unwrap();
    let b = r.shared.enqueue(Message::new("alice", "second", Priority::Normal)).unwrap();

    let a = wait_for_status(&r.shared, &a, MessageStatus::Delivered).await;
    let b = wait_for_status(&r.shared, &b, MessageStatus::Delivered).await;
    assert!(a.delivered_at_ms <= b.delivered_at_ms);

    // Both envelopes visible on the PTY, in order.
    let mut seen = Vec::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let chunk = tokio::time::timeout_at(deadline, rx.recv()).await.unwrap().unwrap();
        seen.extend_from_slice(&chunk);
        let text = String::from_utf8_lossy(&seen);
        if let (Some(i), Some(j)) = (text.find("first"), text.find("second")) {
            assert!(i < j);
            break;
        }
    }

    r.cancel.cancel();
    r.host.kill();
}

#[tokio::test]
async fn exit_during_queue_marks_nothing_delivered() {
    let r = rig();
    // Exit before anything is enqueued; scheduler must stop scheduling.
    r.host.kill();
    let mut exit = r.host.exit_receiver();
    while exit.borrow_and_update().is_none() {
        exit.changed().await.unwrap();
    }
    r.shared.set_exited();

    let id = r.shared.enqueue(Message::new("alice", "late", Priority::Interrupt)).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    let m = r.shared.store.load(&id).unwrap().unwrap();
    assert_eq!(m.status, MessageStatus::Queued);
    r.cancel.cancel();
}
