// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The session activity log: append-only JSONL, one event per line.
//!
//! Writers serialise through a single mutex and the sink is best-effort:
//! an append that fails is dropped (with a debug log), never surfaced.
//! Readers tolerate a torn final line.

use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ActivityEvent {
    SessionStart {
        session_id: String,
        pid: u32,
        command: String,
    },
    StateChange {
        from: String,
        to: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    HookEvent {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_name: Option<String>,
    },
    MessageEnqueued {
        id: String,
        priority: String,
        from: String,
    },
    MessageDelivered {
        id: String,
    },
    MessageFailed {
        id: String,
        reason: String,
    },
    Nudge {
        message: String,
    },
    SessionSummary {
        uptime_secs: u64,
        delivered: u64,
        failed: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
    },
}

/// One log line: a monotonic timestamp plus the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub ts: u64,
    #[serde(flatten)]
    pub event: ActivityEvent,
}

pub struct ActivityLog {
    path: PathBuf,
    file: Mutex<Option<std::fs::File>>,
}

impl ActivityLog {
    /// Open (or create) the log for appending. Opening never fails; a
    /// log that cannot be opened degrades to a no-op sink.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file = std::fs::OpenOptions::new().create(true).append(true).open(&path).ok();
        if file.is_none() {
            debug!(path = %path.display(), "activity log unavailable, events will be dropped");
        }
        Self { path, file: Mutex::new(file) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event. Best-effort; errors are dropped.
    pub fn append(&self, ts: u64, event: ActivityEvent) {
        let entry = ActivityEntry { ts, event };
        let Ok(mut line) = serde_json::to_string(&entry) else {
            return;
        };
        line.push('\n');
        let mut guard = self.file.lock();
        if let Some(file) = guard.as_mut() {
            if let Err(e) = file.write_all(line.as_bytes()) {
                debug!(error = %e, "dropping activity log line");
            }
        }
    }

    /// Read back every parseable entry; a torn final line is ignored.
    pub fn read_entries(path: &Path) -> Vec<ActivityEntry> {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Vec::new();
        };
        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect()
    }
}

#[cfg(test)]
#[path = "activity_tests.rs"]
mod tests;
