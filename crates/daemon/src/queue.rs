// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The four-priority message queue.
//!
//! Pure data structure; delivery gating lives in the scheduler. Each
//! priority is FIFO except `idle-first`, which prepends so the most
//! recently enqueued idle-first message is typed first.

use std::collections::VecDeque;

use h2_core::{Message, Priority};

#[derive(Debug, Default)]
pub struct PriorityQueue {
    interrupt: VecDeque<Message>,
    normal: VecDeque<Message>,
    idle_first: VecDeque<Message>,
    idle: VecDeque<Message>,
}

impl PriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        match message.priority {
            Priority::Interrupt => self.interrupt.push_back(message),
            Priority::Normal => self.normal.push_back(message),
            // Newest-first: the latest idle-first message overtakes the rest.
            Priority::IdleFirst => self.idle_first.push_front(message),
            Priority::Idle => self.idle.push_back(message),
        }
    }

    fn deque(&self, priority: Priority) -> &VecDeque<Message> {
        match priority {
            Priority::Interrupt => &self.interrupt,
            Priority::Normal => &self.normal,
            Priority::IdleFirst => &self.idle_first,
            Priority::Idle => &self.idle,
        }
    }

    fn deque_mut(&mut self, priority: Priority) -> &mut VecDeque<Message> {
        match priority {
            Priority::Interrupt => &mut self.interrupt,
            Priority::Normal => &mut self.normal,
            Priority::IdleFirst => &mut self.idle_first,
            Priority::Idle => &mut self.idle,
        }
    }

    pub fn has(&self, priority: Priority) -> bool {
        !self.deque(priority).is_empty()
    }

    pub fn pop(&mut self, priority: Priority) -> Option<Message> {
        self.deque_mut(priority).pop_front()
    }

    pub fn len(&self) -> usize {
        Priority::ALL.iter().map(|p| self.deque(*p).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain every remaining message, highest priority first.
    pub fn drain(&mut self) -> Vec<Message> {
        let mut out = Vec::with_capacity(self.len());
        for priority in Priority::ALL {
            out.extend(self.deque_mut(priority).drain(..));
        }
        out
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
