// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The routes registry: `routes.jsonl` in the root h2 directory.
//!
//! An append-only list of `{prefix, path}` records mapping short
//! identifiers to h2 directories on this host. Written only by `init`;
//! read by anything that wants to enumerate directories.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::StoreError;

/// Prefix reserved for the home h2 directory.
pub const ROOT_PREFIX: &str = "root";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub prefix: String,
    pub path: PathBuf,
}

/// Read all routes, skipping unparseable (including torn final) lines.
pub fn read_routes(routes_path: &Path) -> Vec<RouteEntry> {
    let Ok(content) = std::fs::read_to_string(routes_path) else {
        return Vec::new();
    };
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

/// Append one route. The registry is append-only; callers must have
/// checked prefix uniqueness first.
pub fn append_route(routes_path: &Path, entry: &RouteEntry) -> Result<(), StoreError> {
    let line = serde_json::to_string(entry).map_err(|e| StoreError::json(routes_path, e))?;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(routes_path)
        .map_err(|e| StoreError::io(routes_path, e))?;
    writeln!(file, "{line}").map_err(|e| StoreError::io(routes_path, e))?;
    Ok(())
}

/// Pick a prefix for a new directory: the basename as-is when free,
/// otherwise `name-2`, `name-3`, … The `root` prefix is never derived.
pub fn derive_prefix(existing: &[RouteEntry], basename: &str) -> String {
    let taken = |candidate: &str| {
        candidate == ROOT_PREFIX || existing.iter().any(|r| r.prefix == candidate)
    };
    if !taken(basename) {
        return basename.to_string();
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{basename}-{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
