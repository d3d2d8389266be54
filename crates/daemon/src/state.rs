// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent state tracking.
//!
//! Wraps the pure transition table with entry timestamps, the last tool
//! observed, and usage counters scraped from hook payloads. One mutating
//! task at a time: callers hold the tracker's mutex in `Shared`.

use std::time::Instant;

use h2_core::{AgentState, HookEvent, HookEventName};

/// Usage counters aggregated from hook payloads, when the child reports
/// them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Usage {
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub cost_usd: f64,
    pub observed: bool,
}

#[derive(Debug)]
pub struct StateTracker {
    state: AgentState,
    entered_at: Instant,
    last_tool: Option<String>,
    usage: Usage,
}

/// A completed transition, for logging and wake-ups.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: AgentState,
    pub to: AgentState,
}

impl StateTracker {
    pub fn new(now: Instant) -> Self {
        Self { state: AgentState::default(), entered_at: now, last_tool: None, usage: Usage::default() }
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn last_tool(&self) -> Option<&str> {
        self.last_tool.as_deref()
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn time_in_state(&self, now: Instant) -> std::time::Duration {
        now.saturating_duration_since(self.entered_at)
    }

    /// Start of the current idle period, when idle.
    pub fn idle_since(&self) -> Option<Instant> {
        matches!(self.state, AgentState::Idle).then_some(self.entered_at)
    }

    /// Feed one hook event. Returns the transition it caused, if any.
    pub fn apply_hook(&mut self, event: &HookEvent, now: Instant) -> Option<Transition> {
        if let Some(tool) = &event.tool_name {
            if matches!(event.name, HookEventName::PreToolUse | HookEventName::PostToolUse) {
                self.last_tool = Some(tool.clone());
            }
        }
        self.scrape_usage(event);

        let next = self.state.apply(event)?;
        let from = std::mem::replace(&mut self.state, next);
        self.entered_at = now;
        Some(Transition { from, to: self.state.clone() })
    }

    /// Child exit. Idempotent; the first call wins.
    pub fn set_exited(&mut self, now: Instant) -> Option<Transition> {
        if self.state.is_terminal() {
            return None;
        }
        let from = std::mem::replace(&mut self.state, AgentState::Exited);
        self.entered_at = now;
        Some(Transition { from, to: AgentState::Exited })
    }

    /// Pull token/cost counters out of a hook payload when present.
    /// Shapes seen in the wild: `usage.input_tokens` / `usage.output_tokens`
    /// at the top level, and a flat `total_cost_usd`.
    fn scrape_usage(&mut self, event: &HookEvent) {
        let Some(payload) = &event.payload else { return };
        let usage = payload.get("usage").unwrap_or(payload);
        if let Some(n) = usage.get("input_tokens").and_then(|v| v.as_u64()) {
            self.usage.tokens_in += n;
            self.usage.observed = true;
        }
        if let Some(n) = usage.get("output_tokens").and_then(|v| v.as_u64()) {
            self.usage.tokens_out += n;
            self.usage.observed = true;
        }
        if let Some(c) = payload.get("total_cost_usd").and_then(|v| v.as_f64()) {
            self.usage.cost_usd = c;
            self.usage.observed = true;
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
