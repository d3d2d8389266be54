// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded scrollback capture.
//!
//! The output pump feeds every PTY read into this ring; the ring is
//! rewritten to `scrollback.log` once enough new bytes accumulate and
//! again at exit. The log is a convenience artifact, so writes are
//! best-effort.

use std::collections::VecDeque;
use std::path::PathBuf;

use tracing::debug;

/// Default ring capacity (1 MiB).
pub const DEFAULT_CAPACITY: usize = 1024 * 1024;

/// Bytes accumulated between flushes.
const FLUSH_THRESHOLD: usize = 64 * 1024;

pub struct Scrollback {
    buf: VecDeque<u8>,
    capacity: usize,
    path: PathBuf,
    pending: usize,
}

impl Scrollback {
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self { buf: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)), capacity, path: path.into(), pending: 0 }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        // Oversized chunks only keep their tail.
        let keep = if bytes.len() > self.capacity {
            &bytes[bytes.len() - self.capacity..]
        } else {
            bytes
        };
        self.buf.extend(keep.iter().copied());
        while self.buf.len() > self.capacity {
            self.buf.pop_front();
        }
        self.pending += keep.len();
        if self.pending >= FLUSH_THRESHOLD {
            self.flush();
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        let (a, b) = self.buf.as_slices();
        let mut out = Vec::with_capacity(self.buf.len());
        out.extend_from_slice(a);
        out.extend_from_slice(b);
        out
    }

    /// Rewrite the log with the current ring contents.
    pub fn flush(&mut self) {
        self.pending = 0;
        let tmp = self.path.with_extension("log.tmp");
        if std::fs::write(&tmp, self.contents())
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .is_err()
        {
            debug!(path = %self.path.display(), "scrollback flush failed");
        }
    }
}
