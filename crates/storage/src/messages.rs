// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The on-disk message store: one JSON file per message.
//!
//! A message is persisted before it is enqueued, and every status change
//! rewrites the file through tmp+fsync+rename, so a crashed supervisor
//! never leaves a torn record and a delivered message stays delivered
//! across restarts.

use std::path::{Path, PathBuf};

use tracing::warn;

use h2_core::{Message, MessageId, MessageStatus};

use crate::atomic::write_json;
use crate::StoreError;

#[derive(Debug, Clone)]
pub struct MessageStore {
    dir: PathBuf,
}

impl MessageStore {
    /// Open the store rooted at the session's `messages/` directory,
    /// creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &MessageId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Persist a message (create or status update).
    pub fn persist(&self, message: &Message) -> Result<(), StoreError> {
        write_json(&self.path_for(&message.id), message)
    }

    pub fn load(&self, id: &MessageId) -> Result<Option<Message>, StoreError> {
        let path = self.path_for(id);
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        Ok(Some(serde_json::from_slice(&bytes).map_err(|e| StoreError::json(path, e))?))
    }

    /// Startup scan: every undelivered message, in id (= creation) order.
    ///
    /// A message found in `delivering` was interrupted mid-delivery and is
    /// assumed untyped: it is demoted to `queued` on disk and re-queued.
    /// Unparseable files are skipped with a warning.
    pub fn scan_undelivered(&self) -> Result<Vec<Message>, StoreError> {
        let mut out = Vec::new();
        let entries = std::fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = match std::fs::read(&path) {
                Ok(b) => b,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable message file");
                    continue;
                }
            };
            let mut message: Message = match serde_json::from_slice(&bytes) {
                Ok(m) => m,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unparseable message file");
                    continue;
                }
            };
            match message.status {
                MessageStatus::Queued => out.push(message),
                MessageStatus::Delivering => {
                    message.status = MessageStatus::Queued;
                    self.persist(&message)?;
                    out.push(message);
                }
                MessageStatus::Delivered | MessageStatus::Failed => {}
            }
        }
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
