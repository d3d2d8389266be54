// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! h2-storage: filesystem conventions of an h2 directory.
//!
//! Discovery (marker-file walk-up and the routes registry), the session
//! directory layout, the per-message JSON store, the append-only activity
//! log, and session metadata. The daemon owns its session directory for
//! its lifetime; everything here is careful to write through tmp+rename
//! so a crash never leaves a torn file.

pub mod activity;
pub mod discover;
pub mod layout;
pub mod messages;
pub mod meta;
pub mod routes;

mod atomic;

pub use activity::{ActivityEntry, ActivityEvent, ActivityLog};
pub use discover::{init_dir, is_h2_dir, resolve_dir, resolve_dir_all, DiscoverError, InitOutcome};
pub use layout::H2Dir;
pub use messages::MessageStore;
pub use meta::SessionMeta;
pub use routes::{derive_prefix, RouteEntry};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error on {path}: {source}")]
    Json {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<std::path::PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub(crate) fn json(path: impl Into<std::path::PathBuf>, source: serde_json::Error) -> Self {
        Self::Json { path: path.into(), source }
    }
}
