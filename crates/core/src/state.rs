// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent observation states.
//!
//! The transition table is pure: the supervisor owns timestamps and
//! wake-ups, this module only answers "given this hook event, what is the
//! next state". `Exited` is terminal and is entered on child exit, never
//! via a hook.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hook::{HookEvent, HookEventName};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum AgentState {
    Active,
    Idle,
    BlockedOnPermission {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool: Option<String>,
    },
    Exited,
}

impl AgentState {
    /// Next state for a hook event, or `None` when the event causes no
    /// transition (including every event after `Exited`).
    pub fn apply(&self, event: &HookEvent) -> Option<AgentState> {
        if matches!(self, AgentState::Exited) {
            return None;
        }
        let next = match &event.name {
            HookEventName::UserPromptSubmit => AgentState::Active,
            HookEventName::Stop | HookEventName::SessionEnd => AgentState::Idle,
            HookEventName::PreToolUse => AgentState::Active,
            HookEventName::PermissionRequest => {
                AgentState::BlockedOnPermission { tool: event.tool_name.clone() }
            }
            HookEventName::PermissionResolved => AgentState::Active,
            // A tool finishing resolves a pending permission block; in any
            // other state it carries no signal on its own.
            HookEventName::PostToolUse => match self {
                AgentState::BlockedOnPermission { .. } => AgentState::Active,
                _ => return None,
            },
            HookEventName::SessionStart | HookEventName::Other(_) => return None,
        };
        if next == *self {
            None
        } else {
            Some(next)
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentState::Exited)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, AgentState::BlockedOnPermission { .. })
    }

    pub fn blocked_tool(&self) -> Option<&str> {
        match self {
            AgentState::BlockedOnPermission { tool } => tool.as_deref(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentState::Active => "active",
            AgentState::Idle => "idle",
            AgentState::BlockedOnPermission { .. } => "blocked-on-permission",
            AgentState::Exited => "exited",
        }
    }

    /// Human-readable detail for status output.
    pub fn detail(&self) -> String {
        match self {
            AgentState::BlockedOnPermission { tool: Some(tool) } => {
                format!("waiting on permission: {tool}")
            }
            AgentState::BlockedOnPermission { tool: None } => {
                "waiting on permission".to_string()
            }
            other => other.as_str().to_string(),
        }
    }
}

impl Default for AgentState {
    fn default() -> Self {
        AgentState::Idle
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
