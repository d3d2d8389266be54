// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The attach multiplexer.
//!
//! After the handshake response an attach connection speaks frames both
//! ways: client `data` frames feed the PTY input pump, client `control`
//! frames resize, and every PTY output chunk fans out to every attached
//! connection as a `data` frame. A client that cannot keep up with the
//! output broadcast is dropped rather than stalling the pump. The PTY
//! window is the minimum of all attached sizes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::broadcast;
use tracing::{debug, info};

use h2_wire::{read_frame, write_frame, write_response, ControlMsg, Frame, FrameKind, Response};

use crate::pty::PtyHost;

/// Window sizes of the currently attached clients.
#[derive(Default)]
pub struct AttachSet {
    sizes: Mutex<HashMap<u64, (u16, u16)>>,
    next: AtomicU64,
}

impl AttachSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, cols: u16, rows: u16) -> u64 {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        if cols > 0 && rows > 0 {
            self.sizes.lock().insert(id, (cols, rows));
        }
        id
    }

    fn update(&self, id: u64, cols: u16, rows: u16) {
        if cols > 0 && rows > 0 {
            self.sizes.lock().insert(id, (cols, rows));
        }
    }

    fn remove(&self, id: u64) {
        self.sizes.lock().remove(&id);
    }

    pub fn count(&self) -> usize {
        self.sizes.lock().len()
    }

    /// Smallest window over all attached clients, so nobody sees
    /// wrapped-off content.
    pub fn min_size(&self) -> Option<(u16, u16)> {
        let sizes = self.sizes.lock();
        let cols = sizes.values().map(|(c, _)| *c).min()?;
        let rows = sizes.values().map(|(_, r)| *r).min()?;
        Some((cols, rows))
    }
}

fn apply_window(pty: &PtyHost, attaches: &AttachSet) {
    if let Some((cols, rows)) = attaches.min_size() {
        let _ = pty.resize(cols, rows);
    }
}

/// Serve one attached client until it disconnects.
pub async fn run_attach<R, W>(
    mut reader: R,
    mut writer: W,
    cols: u16,
    rows: u16,
    pty: Arc<PtyHost>,
    attaches: Arc<AttachSet>,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let id = attaches.register(cols, rows);
    apply_window(&pty, &attaches);
    info!(attach_id = id, cols, rows, "client attached");

    if write_response(&mut writer, &Response::ok()).await.is_err() {
        attaches.remove(id);
        apply_window(&pty, &attaches);
        return;
    }

    // Fan PTY output to this client. Lagging behind the broadcast means
    // the client's buffer is full: disconnect it, never block the pump.
    let mut output_rx = pty.subscribe_output();
    let output_task = tokio::spawn(async move {
        loop {
            match output_rx.recv().await {
                Ok(chunk) => {
                    if write_frame(&mut writer, &Frame::data(chunk)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!(dropped_chunks = n, "attach client too slow, dropping");
                    break;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    loop {
        match read_frame(&mut reader).await {
            Ok(frame) => match frame.kind {
                FrameKind::Data => {
                    if pty.write_input(frame.payload).await.is_err() {
                        break;
                    }
                }
                FrameKind::Control => {
                    if let Ok(ControlMsg::Resize { cols, rows }) =
                        serde_json::from_slice(&frame.payload)
                    {
                        // 0x0 is rejected as a no-op.
                        if cols > 0 && rows > 0 {
                            attaches.update(id, cols, rows);
                            apply_window(&pty, &attaches);
                        }
                    }
                }
                FrameKind::Request | FrameKind::Response => break,
            },
            Err(_) => break,
        }
    }

    output_task.abort();
    attaches.remove(id);
    apply_window(&pty, &attaches);
    info!(attach_id = id, "client detached");
}

#[cfg(test)]
#[path = "attach_tests.rs"]
mod tests;
