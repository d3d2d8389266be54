// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::time::Duration;

/// Quiet time required in `idle` before idle-priority deliveries fire.
/// Short `idle ↔ active` flips between tool calls stay inside this
/// window and never leak idle messages.
pub fn idle_quiesce_window() -> Duration {
    std::env::var("H2_IDLE_QUIESCE_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(750))
}

/// Soft timeout for reading one request off a control connection.
pub fn request_timeout() -> Duration {
    std::env::var("H2_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

/// Grace given to in-flight handlers after the listener closes.
pub fn drain_timeout() -> Duration {
    std::env::var("H2_DRAIN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(2))
}

/// Time between SIGTERM and SIGKILL at shutdown.
pub fn kill_grace() -> Duration {
    std::env::var("H2_KILL_GRACE_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Concurrent control-connection handler cap.
pub fn max_handlers() -> usize {
    std::env::var("H2_MAX_HANDLERS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(64)
}
