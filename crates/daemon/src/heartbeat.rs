// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The idle nudge.
//!
//! A timer armed on every transition into `idle` and disarmed on the way
//! out. When it fires, the optional condition command runs first (`sh
//! -c`, non-zero exit suppresses), then a normal-priority message with
//! the configured body goes through the ordinary store + scheduler path.
//! At most one nudge per idle period.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use h2_core::{AgentState, HeartbeatConfig, Message, Priority};
use h2_storage::ActivityEvent;

use crate::shared::Shared;

pub struct Heartbeat {
    pub shared: Arc<Shared>,
    pub config: HeartbeatConfig,
    pub state_rx: watch::Receiver<AgentState>,
    pub cancel: CancellationToken,
    pub cwd: PathBuf,
}

impl Heartbeat {
    pub async fn run(mut self) {
        loop {
            let idle = matches!(&*self.state_rx.borrow_and_update(), AgentState::Idle);
            if !idle {
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    changed = self.state_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        continue;
                    }
                }
            }

            // Armed. A state change disarms; the timer firing nudges once.
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                changed = self.state_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(self.config.idle_timeout()) => {
                    if self.condition_allows().await {
                        self.nudge();
                    } else {
                        debug!("nudge suppressed by condition");
                    }
                    // One nudge per idle period: re-arm only after the
                    // agent leaves idle.
                    tokio::select! {
                        _ = self.cancel.cancelled() => break,
                        changed = self.state_rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        }
        debug!("heartbeat stopped");
    }

    async fn condition_allows(&self) -> bool {
        let Some(condition) = &self.config.condition else {
            return true;
        };
        let status = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(condition)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match status {
            Ok(status) => status.success(),
            Err(e) => {
                warn!(error = %e, "heartbeat condition failed to run");
                false
            }
        }
    }

    fn nudge(&self) {
        self.shared.activity.append(
            self.shared.epoch_ms(),
            ActivityEvent::Nudge { message: self.config.message.clone() },
        );
        let message = Message::new("heartbeat", &self.config.message, Priority::Normal);
        if let Err(e) = self.shared.enqueue(message) {
            warn!(error = %e, "failed to enqueue nudge");
        }
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
