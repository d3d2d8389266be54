// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response envelope and DTOs.

use serde::{Deserialize, Serialize};

use h2_core::{Message, MessageStatus, Priority};

/// Snapshot of one supervised agent for `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub name: String,
    pub command: String,
    pub role_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,
    pub state: String,
    pub state_detail: String,
    pub state_secs: u64,
    pub uptime_secs: u64,
    pub queued: usize,
    pub blocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_tool: Option<String>,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_out: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
}

/// Snapshot of one message for `show`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageInfo {
    pub id: String,
    pub from: String,
    pub body: String,
    pub priority: Priority,
    pub raw: bool,
    pub status: MessageStatus,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl From<&Message> for MessageInfo {
    fn from(m: &Message) -> Self {
        Self {
            id: m.id.to_string(),
            from: m.from.clone(),
            body: m.body.clone(),
            priority: m.priority,
            raw: m.raw,
            status: m.status,
            created_at_ms: m.created_at_ms,
            delivered_at_ms: m.delivered_at_ms,
            failure_reason: m.failure_reason.clone(),
        }
    }
}

/// Uniform response envelope. Unknown fields are ignored on decode so
/// older clients keep working against newer daemons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self { ok: true, ..Self::default() }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self { ok: false, error: Some(message.into()), ..Self::default() }
    }

    pub fn with_message_id(id: impl Into<String>) -> Self {
        Self { ok: true, message_id: Some(id.into()), ..Self::default() }
    }

    pub fn with_agent(agent: AgentInfo) -> Self {
        Self { ok: true, agent: Some(agent), ..Self::default() }
    }

    pub fn with_message(message: MessageInfo) -> Self {
        Self { ok: true, message: Some(message), ..Self::default() }
    }
}
