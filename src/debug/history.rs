//! Execution history for stepping backwards.
//!
//! Every step records the machine state as it was just before the
//! instruction ran. Popping an entry and restoring it undoes that step
//! exactly. The log is bounded; the oldest entries fall off first.

use std::collections::VecDeque;
use serde::{Serialize, Deserialize};
use crate::vm::Registers;

/// Pre-step machine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub regs: Registers,
    pub memory: Vec<i64>,
    pub call_stack: Vec<usize>,
    pub instruction_count: u64,
}

/// Bounded FIFO of pre-step snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    enabled: bool,
}

impl History {
    pub fn new(capacity: usize, enabled: bool) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            enabled,
        }
    }

    /// Whether `record` would keep an entry.
    pub fn is_recording(&self) -> bool {
        self.enabled && self.capacity > 0
    }

    /// Append an entry, evicting the oldest past capacity. Ignored while disabled.
    pub fn record(&mut self, entry: HistoryEntry) {
        if !self.is_recording() {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Remove and return the most recent entry.
    pub fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop_back()
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

    /// Change the bound, dropping the oldest entries that no longer fit.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.entries.len() > capacity {
            self.entries.pop_front();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabling also discards everything recorded so far.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.entries.clear();
        }
    }

    /// Oldest retained entry.
    pub fn oldest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
