//! Bounded FIFO of classified action codes
//!
//! The queue itself carries no locking: it lives inside the service's shared
//! state and is only touched while the single input lock is held.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::codes::ActionCode;

/// What to do with a push that arrives while the queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Keep the queued entries and discard the incoming one
    #[default]
    DropNewest,
    /// Evict the oldest queued entry to make room for the incoming one
    DropOldest,
}

/// Fixed-capacity action queue
#[derive(Debug)]
pub struct ActionQueue {
    entries: VecDeque<ActionCode>,
    capacity: usize,
    overflow: OverflowPolicy,
}

impl ActionQueue {
    /// Create an empty queue. A zero capacity is raised to one.
    pub fn new(capacity: usize, overflow: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            overflow,
        }
    }

    /// Append a code, applying the overflow policy when full.
    ///
    /// Returns `true` if `code` ended up in the queue.
    pub fn push(&mut self, code: ActionCode) -> bool {
        if self.entries.len() < self.capacity {
            self.entries.push_back(code);
            return true;
        }

        match self.overflow {
            OverflowPolicy::DropNewest => false,
            OverflowPolicy::DropOldest => {
                self.entries.pop_front();
                self.entries.push_back(code);
                true
            }
        }
    }

    /// Remove and return the oldest code
    pub fn pop(&mut self) -> Option<ActionCode> {
        self.entries.pop_front()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.overflow
    }
}
