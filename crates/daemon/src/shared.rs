// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State shared between the scheduler, the state tracker, and the
//! control handlers.
//!
//! The scheduler is the only task that pops the queue or mutates message
//! delivery state; everything else enqueues, applies hook events, or
//! takes read snapshots, and signals the scheduler through `wake`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tracing::info;

use h2_core::{AgentState, Clock, HookEvent, Message, MessageId, SystemClock};
use h2_storage::{ActivityEvent, ActivityLog, MessageStore, StoreError};

use crate::queue::PriorityQueue;
use crate::state::{StateTracker, Transition};

pub struct Shared {
    pub queue: Mutex<PriorityQueue>,
    pub tracker: Mutex<StateTracker>,
    /// Wakes the scheduler on enqueue and on state transitions.
    pub wake: Notify,
    pub store: MessageStore,
    pub activity: ActivityLog,
    pub delivered: AtomicU64,
    pub failed: AtomicU64,
    clock: SystemClock,
    state_tx: watch::Sender<AgentState>,
}

impl Shared {
    pub fn new(store: MessageStore, activity: ActivityLog) -> (Arc<Self>, watch::Receiver<AgentState>) {
        let (state_tx, state_rx) = watch::channel(AgentState::default());
        let shared = Arc::new(Self {
            queue: Mutex::new(PriorityQueue::new()),
            tracker: Mutex::new(StateTracker::new(Instant::now())),
            wake: Notify::new(),
            store,
            activity,
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            clock: SystemClock,
            state_tx,
        });
        (shared, state_rx)
    }

    pub fn epoch_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }

    /// Persist then enqueue. The message is on disk before any delivery
    /// can begin; a persist failure means it is not queued at all.
    pub fn enqueue(&self, message: Message) -> Result<MessageId, StoreError> {
        self.store.persist(&message)?;
        self.activity.append(
            self.clock.epoch_ms(),
            ActivityEvent::MessageEnqueued {
                id: message.id.to_string(),
                priority: message.priority.to_string(),
                from: message.from.clone(),
            },
        );
        let id = message.id.clone();
        self.queue.lock().push(message);
        self.wake.notify_one();
        Ok(id)
    }

    /// Re-queue messages recovered from disk at startup, without
    /// re-logging them as newly enqueued.
    pub fn requeue(&self, messages: Vec<Message>) {
        if messages.is_empty() {
            return;
        }
        let mut queue = self.queue.lock();
        for message in messages {
            queue.push(message);
        }
        drop(queue);
        self.wake.notify_one();
    }

    /// Feed a hook event through the state machine.
    pub fn apply_hook(&self, event: &HookEvent) {
        self.activity.append(
            self.clock.epoch_ms(),
            ActivityEvent::HookEvent {
                name: event.name.to_string(),
                tool_name: event.tool_name.clone(),
            },
        );
        let transition = self.tracker.lock().apply_hook(event, self.clock.now());
        self.after_transition(transition);
    }

    /// Record child exit. Terminal; later calls are no-ops.
    pub fn set_exited(&self) {
        let transition = self.tracker.lock().set_exited(self.clock.now());
        self.after_transition(transition);
    }

    fn after_transition(&self, transition: Option<Transition>) {
        let Some(transition) = transition else { return };
        info!(from = %transition.from, to = %transition.to, "state change");
        let detail = match &transition.to {
            AgentState::BlockedOnPermission { .. } => Some(transition.to.detail()),
            _ => None,
        };
        self.activity.append(
            self.clock.epoch_ms(),
            ActivityEvent::StateChange {
                from: transition.from.as_str().to_string(),
                to: transition.to.as_str().to_string(),
                detail,
            },
        );
        let _ = self.state_tx.send(transition.to);
        self.wake.notify_one();
    }

    pub fn state_receiver(&self) -> watch::Receiver<AgentState> {
        self.state_tx.subscribe()
    }

    pub fn queued_count(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}
