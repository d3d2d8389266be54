// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `session.metadata.json`: the durable record of one launch.

use std::path::Path;

use serde::{Deserialize, Serialize};

use h2_core::LaunchSpec;

use crate::atomic::write_json;
use crate::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMeta {
    /// UUID minted per launch.
    pub session_id: String,
    pub created_at_ms: u64,
    #[serde(flatten)]
    pub spec: LaunchSpec,
}

impl SessionMeta {
    pub fn new(spec: LaunchSpec, created_at_ms: u64) -> Self {
        Self { session_id: uuid::Uuid::new_v4().to_string(), created_at_ms, spec }
    }

    pub fn write(&self, path: &Path) -> Result<(), StoreError> {
        write_json(path, self)
    }

    pub fn read(path: &Path) -> Result<Self, StoreError> {
        let bytes = std::fs::read(path).map_err(|e| StoreError::io(path, e))?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::json(path, e))
    }
}
