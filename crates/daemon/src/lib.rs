// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! h2-daemon: the per-agent supervisor.
//!
//! One daemon process owns one PTY-hosted child, its control socket, its
//! session directory, and the scheduler that types queued messages into
//! the child's terminal. Everything here is wired together by
//! [`lifecycle::Supervisor`]; the CLI re-execs itself into this library
//! via the hidden `_daemon` subcommand.

pub mod attach;
pub mod env;
pub mod heartbeat;
pub mod lifecycle;
pub mod listener;
pub mod pty;
pub mod queue;
pub mod scheduler;
pub mod scrollback;
pub mod shared;
pub mod state;

pub use lifecycle::{Supervisor, SupervisorError};
pub use queue::PriorityQueue;
pub use shared::Shared;
