// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message entities and their delivery lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::id::MessageId;

/// Delivery priority, highest first.
///
/// `IdleFirst` is the one queue where newer entries overtake older ones:
/// among idle-first messages the most recently enqueued is typed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Interrupt,
    Normal,
    IdleFirst,
    Idle,
}

impl Priority {
    pub const ALL: [Priority; 4] =
        [Priority::Interrupt, Priority::Normal, Priority::IdleFirst, Priority::Idle];

    /// Rank in delivery order; lower wins.
    pub fn rank(self) -> usize {
        match self {
            Priority::Interrupt => 0,
            Priority::Normal => 1,
            Priority::IdleFirst => 2,
            Priority::Idle => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Interrupt => "interrupt",
            Priority::Normal => "normal",
            Priority::IdleFirst => "idle-first",
            Priority::Idle => "idle",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority: {0} (expected interrupt, normal, idle-first, or idle)")]
pub struct ParsePriorityError(String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "interrupt" => Ok(Priority::Interrupt),
            "normal" => Ok(Priority::Normal),
            "idle-first" => Ok(Priority::IdleFirst),
            "idle" => Ok(Priority::Idle),
            other => Err(ParsePriorityError(other.to_string())),
        }
    }
}

/// Delivery status. Transitions are monotonic:
/// `Queued → Delivering → {Delivered | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Queued,
    Delivering,
    Delivered,
    Failed,
}

impl MessageStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, MessageStatus::Delivered | MessageStatus::Failed)
    }

    /// Whether moving to `next` respects the monotonic lifecycle.
    pub fn can_transition(self, next: MessageStatus) -> bool {
        use MessageStatus::*;
        matches!(
            (self, next),
            (Queued, Delivering) | (Delivering, Delivered) | (Delivering, Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MessageStatus::Queued => "queued",
            MessageStatus::Delivering => "delivering",
            MessageStatus::Delivered => "delivered",
            MessageStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A delivery intent: one message authored once, delivered at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub from: String,
    pub body: String,
    #[serde(default)]
    pub priority: Priority,
    /// When set the body is typed verbatim, without the sender envelope.
    #[serde(default)]
    pub raw: bool,
    pub status: MessageStatus,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl Message {
    pub fn new(from: impl Into<String>, body: impl Into<String>, priority: Priority) -> Self {
        let id = MessageId::new();
        let created_at_ms = id.epoch_ms().unwrap_or_default();
        Self {
            id,
            from: from.into(),
            body: body.into(),
            priority,
            raw: false,
            status: MessageStatus::Queued,
            created_at_ms,
            delivered_at_ms: None,
            failure_reason: None,
        }
    }

    /// The byte sequence typed into the terminal, terminating CR included.
    pub fn rendered(&self) -> Vec<u8> {
        let mut out = if self.raw {
            self.body.clone().into_bytes()
        } else {
            format!("[h2 message from: {}] {}", self.from, self.body).into_bytes()
        };
        out.push(b'\r');
        out
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
