// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook events posted by the supervised child.
//!
//! The child never talks to the supervisor directly; a hook installed in
//! its config invokes the CLI, which connects to the control socket and
//! submits one of these. Event names arrive as free-form strings and
//! unknown names are preserved rather than rejected.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEventName {
    UserPromptSubmit,
    PreToolUse,
    PostToolUse,
    PermissionRequest,
    PermissionResolved,
    Stop,
    SessionStart,
    SessionEnd,
    Other(String),
}

impl HookEventName {
    pub fn parse(name: &str) -> Self {
        match name {
            "UserPromptSubmit" => Self::UserPromptSubmit,
            "PreToolUse" => Self::PreToolUse,
            "PostToolUse" => Self::PostToolUse,
            "PermissionRequest" => Self::PermissionRequest,
            "PermissionResolved" => Self::PermissionResolved,
            "Stop" => Self::Stop,
            "SessionStart" => Self::SessionStart,
            "SessionEnd" => Self::SessionEnd,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::UserPromptSubmit => "UserPromptSubmit",
            Self::PreToolUse => "PreToolUse",
            Self::PostToolUse => "PostToolUse",
            Self::PermissionRequest => "PermissionRequest",
            Self::PermissionResolved => "PermissionResolved",
            Self::Stop => "Stop",
            Self::SessionStart => "SessionStart",
            Self::SessionEnd => "SessionEnd",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for HookEventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for HookEventName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HookEventName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// One out-of-band notification from the child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookEvent {
    pub name: HookEventName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Raw hook payload, kept for the activity log and usage counters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl HookEvent {
    pub fn named(name: HookEventName) -> Self {
        Self { name, tool_name: None, payload: None }
    }
}

#[cfg(test)]
#[path = "hook_tests.rs"]
mod tests;
