// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor assembly and lifecycle.
//!
//! Startup order matters: session directory, pidfile lock (first, so
//! stale-socket cleanup is safe), socket bind, metadata, message
//! recovery, PTY spawn, then the task set. Shutdown is signal- or
//! stop-driven and runs the fixed grace windows: close the listener,
//! drain, SIGTERM the child, SIGKILL after the grace, write the session
//! summary, unlink socket and pidfile.

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use h2_core::{Clock, LaunchSpec, SystemClock};
use h2_storage::{ActivityEvent, ActivityLog, H2Dir, MessageStore, SessionMeta, StoreError};

use crate::attach::AttachSet;
use crate::env;
use crate::heartbeat::Heartbeat;
use crate::listener::{ListenCtx, Listener};
use crate::pty::{PtyError, PtyHost};
use crate::scheduler::Scheduler;
use crate::scrollback::{Scrollback, DEFAULT_CAPACITY};
use crate::shared::Shared;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("agent {0} already has a running supervisor")]
    AlreadyRunning(String),

    #[error("cannot listen on {path}: {source}")]
    Bind {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Pty(#[from] PtyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

enum StopReason {
    /// `stop` request or termination signal.
    Requested,
    /// The child exited on its own.
    ChildExit,
}

pub struct Supervisor {
    dir: H2Dir,
    spec: LaunchSpec,
}

impl Supervisor {
    pub fn new(dir: H2Dir, spec: LaunchSpec) -> Self {
        Self { dir, spec }
    }

    pub async fn run(self) -> Result<(), SupervisorError> {
        let clock = SystemClock;
        let name = self.spec.name.to_string();
        let session_dir = self.dir.session_dir(&name);
        std::fs::create_dir_all(&session_dir)?;

        // Detach from the launching terminal's session.
        let _ = nix::unistd::setsid();

        // Lock the pidfile before anything else. The lock dies with its
        // holder, so a stale file from a crashed supervisor locks fine
        // and gets overwritten.
        let pid_path = self.dir.pidfile_path(&name);
        let lock_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&pid_path)?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| SupervisorError::AlreadyRunning(name.clone()))?;
        let mut lock_file = lock_file;
        lock_file.set_len(0)?;
        writeln!(lock_file, "{}", std::process::id())?;
        let _lock_file = lock_file; // held for the life of the process

        // Holding the lock guarantees any existing socket is stale.
        let socket_path = self.dir.agent_socket_path(&name);
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if socket_path.exists() {
            let _ = std::fs::remove_file(&socket_path);
        }
        let listener = UnixListener::bind(&socket_path)
            .map_err(|e| SupervisorError::Bind { path: socket_path.clone(), source: e })?;

        let store = MessageStore::open(self.dir.messages_dir(&name))?;
        let activity = ActivityLog::open(self.dir.activity_path(&name));
        let meta = SessionMeta::new(self.spec.clone(), clock.epoch_ms());
        meta.write(&self.dir.metadata_path(&name))?;

        // Undelivered messages from a previous incarnation re-queue
        // before the scheduler starts.
        let recovered = store.scan_undelivered()?;
        if !recovered.is_empty() {
            info!(count = recovered.len(), "recovered undelivered messages");
        }

        let (shared, state_rx) = Shared::new(store, activity);
        shared.activity.append(
            clock.epoch_ms(),
            ActivityEvent::SessionStart {
                session_id: meta.session_id.clone(),
                pid: std::process::id(),
                command: self.spec.command.clone(),
            },
        );
        shared.requeue(recovered);

        let scrollback = Scrollback::new(self.dir.scrollback_path(&name), DEFAULT_CAPACITY);
        let pty = Arc::new(PtyHost::spawn(&self.spec, &session_dir, &meta.session_id, scrollback)?);

        let shutdown = CancellationToken::new();
        let accept_cancel = CancellationToken::new();
        let tasks_cancel = CancellationToken::new();

        let ctx = Arc::new(ListenCtx {
            shared: Arc::clone(&shared),
            pty: Arc::clone(&pty),
            attaches: Arc::new(AttachSet::new()),
            meta,
            start_time: Instant::now(),
            shutdown: shutdown.clone(),
        });
        let listener_task = tokio::spawn(Listener::new(listener, ctx).run(accept_cancel.clone()));

        let scheduler = Scheduler {
            shared: Arc::clone(&shared),
            input_tx: pty.input_sender(),
            exit_rx: pty.exit_receiver(),
            cancel: tasks_cancel.clone(),
            window: env::idle_quiesce_window(),
        };
        let scheduler_task = tokio::spawn(scheduler.run());

        if let Some(config) = self.spec.heartbeat.clone() {
            let heartbeat = Heartbeat {
                shared: Arc::clone(&shared),
                config,
                state_rx,
                cancel: tasks_cancel.clone(),
                cwd: self.spec.cwd.clone(),
            };
            tokio::spawn(heartbeat.run());
        }

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut exit_rx = pty.exit_receiver();
        let start = Instant::now();
        info!(agent = %name, socket = %socket_path.display(), "supervisor ready");

        let reason = tokio::select! {
            _ = shutdown.cancelled() => StopReason::Requested,
            _ = sigterm.recv() => StopReason::Requested,
            _ = sigint.recv() => StopReason::Requested,
            _ = child_exited(&mut exit_rx) => StopReason::ChildExit,
        };

        // Stop accepting; existing handlers get the drain grace.
        accept_cancel.cancel();

        match reason {
            StopReason::ChildExit => {
                info!("child exited, shutting down");
                shared.set_exited();
                tasks_cancel.cancel();
            }
            StopReason::Requested => {
                info!("shutdown requested");
                tokio::time::sleep(env::drain_timeout()).await;
                // Abandon any in-flight delivery before killing the child.
                tasks_cancel.cancel();
                pty.terminate();
                let died = tokio::time::timeout(env::kill_grace(), child_exited(&mut exit_rx))
                    .await
                    .is_ok();
                if !died {
                    warn!("child ignored SIGTERM, killing");
                    pty.kill();
                    let _ = tokio::time::timeout(
                        std::time::Duration::from_secs(2),
                        child_exited(&mut exit_rx),
                    )
                    .await;
                }
                shared.set_exited();
            }
        }

        shared.activity.append(
            clock.epoch_ms(),
            ActivityEvent::SessionSummary {
                uptime_secs: start.elapsed().as_secs(),
                delivered: shared.delivered_count(),
                failed: shared.failed_count(),
                exit_code: pty.exit_code(),
            },
        );

        listener_task.abort();
        let _ = scheduler_task.await;
        let _ = std::fs::remove_file(&socket_path);
        let _ = std::fs::remove_file(&pid_path);
        info!("supervisor stopped");
        Ok(())
    }
}

async fn child_exited(rx: &mut watch::Receiver<Option<i32>>) {
    loop {
        if rx.borrow_and_update().is_some() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
