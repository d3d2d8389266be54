// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The delivery scheduler: a single cooperative worker.
//!
//! All queue pops and message state transitions happen on this task.
//! Enqueuers and the state tracker signal it through `Shared::wake`;
//! between wake-ups it either waits or sleeps until the idle quiesce
//! window opens. Once a delivery starts nothing else writes to the PTY
//! until it completes or fails: the write goes through the input pump as
//! one burst and the scheduler awaits the ack before touching the next
//! message.

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use h2_core::{AgentState, Message, MessageStatus, Priority};
use h2_storage::ActivityEvent;

use crate::pty::WriteReq;
use crate::queue::PriorityQueue;
use crate::shared::Shared;

/// What the scheduler should do next, decided under the queue+tracker
/// locks and executed outside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    /// Pop and deliver the head of this priority's queue.
    Deliver(Priority),
    /// Nothing deliverable yet, but a gate opens at this instant.
    Sleep(Instant),
    /// Nothing deliverable until a wake-up.
    Wait,
    /// The agent is gone; stop scheduling.
    Exit,
}

/// Gating rules:
/// - `interrupt` goes out in any live state, including blocked.
/// - `normal` is held while blocked on permission.
/// - `idle-first` needs `idle` held for the full quiesce window.
/// - `idle` additionally requires that no higher-priority delivery
///   completed inside the trailing window.
pub(crate) fn next_action(
    queue: &PriorityQueue,
    state: &AgentState,
    idle_since: Option<Instant>,
    last_urgent_done: Option<Instant>,
    now: Instant,
    window: Duration,
) -> Action {
    if state.is_terminal() {
        return Action::Exit;
    }

    if queue.has(Priority::Interrupt) {
        return Action::Deliver(Priority::Interrupt);
    }

    let live = matches!(state, AgentState::Active | AgentState::Idle);
    if queue.has(Priority::Normal) && live {
        return Action::Deliver(Priority::Normal);
    }

    let mut deadline: Option<Instant> = None;
    if let Some(idle_since) = idle_since {
        let quiesced_at = idle_since + window;

        if queue.has(Priority::IdleFirst) {
            if now >= quiesced_at {
                return Action::Deliver(Priority::IdleFirst);
            }
            deadline = Some(quiesced_at);
        }

        if queue.has(Priority::Idle) {
            let urgent_clear = last_urgent_done.map(|t| t + window).unwrap_or(quiesced_at);
            let ready_at = quiesced_at.max(urgent_clear);
            if now >= ready_at {
                return Action::Deliver(Priority::Idle);
            }
            deadline = Some(deadline.map_or(ready_at, |d| d.min(ready_at)));
        }
    }

    match deadline {
        Some(d) => Action::Sleep(d),
        None => Action::Wait,
    }
}

enum WriteOutcome {
    Written,
    Failed(String),
    AgentExited,
    Cancelled,
}

pub struct Scheduler {
    pub shared: std::sync::Arc<Shared>,
    pub input_tx: mpsc::Sender<WriteReq>,
    pub exit_rx: watch::Receiver<Option<i32>>,
    pub cancel: CancellationToken,
    pub window: Duration,
}

impl Scheduler {
    pub async fn run(mut self) {
        let mut last_urgent_done: Option<Instant> = None;
        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            let action = {
                let queue = self.shared.queue.lock();
                let tracker = self.shared.tracker.lock();
                next_action(
                    &queue,
                    tracker.state(),
                    tracker.idle_since(),
                    last_urgent_done,
                    Instant::now(),
                    self.window,
                )
            };
            match action {
                Action::Exit => break,
                Action::Deliver(priority) => {
                    let message = self.shared.queue.lock().pop(priority);
                    let Some(message) = message else { continue };
                    match self.deliver(message).await {
                        DeliverEnd::Delivered(p) => {
                            if p != Priority::Idle {
                                last_urgent_done = Some(Instant::now());
                            }
                        }
                        DeliverEnd::Continue => {}
                        DeliverEnd::Stop => break,
                    }
                }
                Action::Sleep(deadline) => {
                    tokio::select! {
                        _ = self.cancel.cancelled() => break,
                        _ = self.shared.wake.notified() => {}
                        _ = tokio::time::sleep_until(deadline.into()) => {}
                    }
                }
                Action::Wait => {
                    tokio::select! {
                        _ = self.cancel.cancelled() => break,
                        _ = self.shared.wake.notified() => {}
                    }
                }
            }
        }
        debug!("scheduler stopped");
    }

    async fn deliver(&mut self, mut message: Message) -> DeliverEnd {
        message.status = MessageStatus::Delivering;
        if let Err(e) = self.shared.store.persist(&message) {
            warn!(id = %message.id, error = %e, "failed to persist delivering status");
        }

        let bytes = message.rendered();
        let outcome = self.write_with_retry(&bytes).await;

        match outcome {
            WriteOutcome::Written => {
                message.status = MessageStatus::Delivered;
                message.delivered_at_ms = Some(self.shared.epoch_ms());
                if let Err(e) = self.shared.store.persist(&message) {
                    warn!(id = %message.id, error = %e, "failed to persist delivered status");
                }
                self.shared.activity.append(
                    self.shared.epoch_ms(),
                    ActivityEvent::MessageDelivered { id: message.id.to_string() },
                );
                self.shared.delivered.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                info!(id = %message.id, priority = %message.priority, "message delivered");
                DeliverEnd::Delivered(message.priority)
            }
            WriteOutcome::Failed(reason) => {
                self.fail(message, &reason);
                DeliverEnd::Continue
            }
            WriteOutcome::AgentExited => {
                self.fail(message, "agent_exited");
                DeliverEnd::Stop
            }
            WriteOutcome::Cancelled => {
                self.fail(message, "shutdown");
                DeliverEnd::Stop
            }
        }
    }

    fn fail(&self, mut message: Message, reason: &str) {
        message.status = MessageStatus::Failed;
        message.failure_reason = Some(reason.to_string());
        if let Err(e) = self.shared.store.persist(&message) {
            warn!(id = %message.id, error = %e, "failed to persist failed status");
        }
        self.shared.activity.append(
            self.shared.epoch_ms(),
            ActivityEvent::MessageFailed { id: message.id.to_string(), reason: reason.to_string() },
        );
        self.shared.failed.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        warn!(id = %message.id, reason, "message failed");
    }

    /// One write, one retry. Abandons on child exit or shutdown.
    async fn write_with_retry(&mut self, bytes: &[u8]) -> WriteOutcome {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let (ack_tx, ack_rx) = oneshot::channel();
            if self
                .input_tx
                .send(WriteReq { bytes: bytes.to_vec(), ack: Some(ack_tx) })
                .await
                .is_err()
            {
                return WriteOutcome::Failed("pty input closed".to_string());
            }
            tokio::select! {
                ack = ack_rx => match ack {
                    Ok(Ok(())) => return WriteOutcome::Written,
                    Ok(Err(e)) if attempts < 2 => {
                        debug!(error = %e, "pty write failed, retrying once");
                    }
                    Ok(Err(e)) => return WriteOutcome::Failed(e.to_string()),
                    Err(_) => return WriteOutcome::Failed("pty writer gone".to_string()),
                },
                _ = child_exited(&mut self.exit_rx) => return WriteOutcome::AgentExited,
                _ = self.cancel.cancelled() => return WriteOutcome::Cancelled,
            }
        }
    }
}

enum DeliverEnd {
    Delivered(Priority),
    Continue,
    Stop,
}

/// Resolves once the child's exit status is known.
async fn child_exited(rx: &mut watch::Receiver<Option<i32>>) {
    loop {
        if rx.borrow_and_update().is_some() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender dropped without an exit status; never resolve.
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
