// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The PTY host: one pseudoterminal, one child, two pumps.
//!
//! The output pump is a blocking reader thread publishing every chunk to
//! a broadcast channel (attach fan-out) and the scrollback ring. The
//! input pump is a single blocking writer thread fed by an mpsc; one
//! consumer means one writer, so a scheduler delivery is typed as one
//! contiguous burst that attached-client keystrokes cannot interleave.
//! Deliveries carry an ack so the scheduler observes write completion.

use std::io::{Read, Write};
use std::path::Path;

use parking_lot::Mutex;
use portable_pty::{native_pty_system, ChildKiller, CommandBuilder, MasterPty, PtySize};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use h2_core::LaunchSpec;

use crate::scrollback::Scrollback;

/// Initial window size before the first attach.
pub const INITIAL_COLS: u16 = 80;
pub const INITIAL_ROWS: u16 = 24;

const READ_CHUNK: usize = 4096;
const OUTPUT_CHANNEL_CAPACITY: usize = 1024;
const INPUT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum PtyError {
    #[error("failed to open pty: {0}")]
    Open(String),

    #[error("failed to spawn {command}: {reason}")]
    Spawn { command: String, reason: String },

    #[error("invalid window size {cols}x{rows}")]
    BadSize { cols: u16, rows: u16 },

    #[error("resize failed: {0}")]
    Resize(String),

    #[error("child input closed")]
    InputClosed,
}

/// One write onto the PTY master. Scheduler deliveries set `ack` to
/// observe completion; keystrokes leave it unset.
pub struct WriteReq {
    pub bytes: Vec<u8>,
    pub ack: Option<oneshot::Sender<std::io::Result<()>>>,
}

pub struct PtyHost {
    master: Mutex<Box<dyn MasterPty + Send>>,
    killer: Mutex<Box<dyn ChildKiller + Send + Sync>>,
    input_tx: mpsc::Sender<WriteReq>,
    output_tx: broadcast::Sender<Vec<u8>>,
    exit_rx: watch::Receiver<Option<i32>>,
    pid: Option<u32>,
}

impl PtyHost {
    /// Allocate the PTY and exec the child described by `spec`.
    pub fn spawn(
        spec: &LaunchSpec,
        session_dir: &Path,
        session_id: &str,
        scrollback: Scrollback,
    ) -> Result<Self, PtyError> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: INITIAL_ROWS,
                cols: INITIAL_COLS,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| PtyError::Open(e.to_string()))?;

        let mut cmd = CommandBuilder::new(&spec.command);
        cmd.args(&spec.args);
        cmd.cwd(&spec.cwd);
        cmd.env("H2_ACTOR", spec.name.as_str());
        cmd.env("H2_ROLE", &spec.role_name);
        cmd.env("H2_SESSION_DIR", session_dir);
        cmd.env("H2_SESSION_ID", session_id);
        if let Some(pod) = &spec.pod {
            cmd.env("H2_POD", pod);
        }
        if let Some(config_dir) = &spec.claude_config_dir {
            cmd.env("CLAUDE_CONFIG_DIR", config_dir);
        }
        for (key, value) in &spec.overrides {
            cmd.env(key, value);
        }

        let mut child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| PtyError::Spawn { command: spec.command.clone(), reason: e.to_string() })?;
        drop(pair.slave);

        let pid = child.process_id();
        let killer = child.clone_killer();
        info!(command = %spec.command, pid = ?pid, "child spawned");

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| PtyError::Open(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| PtyError::Open(e.to_string()))?;

        let (output_tx, _) = broadcast::channel(OUTPUT_CHANNEL_CAPACITY);
        let (input_tx, input_rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let (exit_tx, exit_rx) = watch::channel(None);

        spawn_output_pump(reader, output_tx.clone(), scrollback);
        spawn_input_pump(writer, input_rx);

        std::thread::spawn(move || {
            let code = match child.wait() {
                Ok(status) => status.exit_code() as i32,
                Err(e) => {
                    warn!(error = %e, "child wait failed");
                    -1
                }
            };
            info!(code, "child exited");
            let _ = exit_tx.send(Some(code));
        });

        Ok(Self {
            master: Mutex::new(pair.master),
            killer: Mutex::new(killer),
            input_tx,
            output_tx,
            exit_rx,
            pid,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn input_sender(&self) -> mpsc::Sender<WriteReq> {
        self.input_tx.clone()
    }

    pub fn subscribe_output(&self) -> broadcast::Receiver<Vec<u8>> {
        self.output_tx.subscribe()
    }

    pub fn exit_receiver(&self) -> watch::Receiver<Option<i32>> {
        self.exit_rx.clone()
    }

    pub fn exit_code(&self) -> Option<i32> {
        *self.exit_rx.borrow()
    }

    /// Queue keystrokes without waiting for the write to land.
    pub async fn write_input(&self, bytes: Vec<u8>) -> Result<(), PtyError> {
        self.input_tx
            .send(WriteReq { bytes, ack: None })
            .await
            .map_err(|_| PtyError::InputClosed)
    }

    /// Resize the PTY. 0x0 (or either dimension zero) is rejected.
    pub fn resize(&self, cols: u16, rows: u16) -> Result<(), PtyError> {
        if cols == 0 || rows == 0 {
            return Err(PtyError::BadSize { cols, rows });
        }
        self.master
            .lock()
            .resize(PtySize { rows, cols, pixel_width: 0, pixel_height: 0 })
            .map_err(|e| PtyError::Resize(e.to_string()))
    }

    /// Ask the child to terminate (SIGTERM). Escalation is the caller's
    /// job via [`PtyHost::kill`].
    pub fn terminate(&self) {
        if let Some(pid) = self.pid {
            let pid = nix::unistd::Pid::from_raw(pid as i32);
            if let Err(e) = nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGTERM) {
                debug!(error = %e, "SIGTERM failed");
            }
        }
    }

    /// Forcibly kill the child.
    pub fn kill(&self) {
        if let Err(e) = self.killer.lock().kill() {
            debug!(error = %e, "kill failed");
        }
    }
}

fn spawn_output_pump(
    mut reader: Box<dyn Read + Send>,
    output_tx: broadcast::Sender<Vec<u8>>,
    mut scrollback: Scrollback,
) {
    std::thread::spawn(move || {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    let chunk = buf[..n].to_vec();
                    scrollback.push(&chunk);
                    // No receivers is fine; nobody is attached.
                    let _ = output_tx.send(chunk);
                }
                Err(e) => {
                    debug!(error = %e, "pty read ended");
                    break;
                }
            }
        }
        scrollback.flush();
    });
}

fn spawn_input_pump(mut writer: Box<dyn Write + Send>, mut input_rx: mpsc::Receiver<WriteReq>) {
    std::thread::spawn(move || {
        // Errors are reported per request, not treated as fatal: the
        // scheduler retries once and a closed master just keeps failing.
        while let Some(req) = input_rx.blocking_recv() {
            let result = writer.write_all(&req.bytes).and_then(|_| writer.flush());
            if let Err(e) = &result {
                warn!(error = %e, "pty write failed");
            }
            if let Some(ack) = req.ack {
                let _ = ack.send(result);
            }
        }
    });
}

#[cfg(test)]
#[path = "pty_tests.rs"]
mod tests;
