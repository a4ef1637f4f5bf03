//! Read-only state snapshots for front ends.

use serde::{Serialize, Deserialize};
use crate::debug::{ConditionalBreakpoint, WatchValue};
use crate::vm::VmState;

/// Deep copy of the VM state. Holding one never aliases VM internals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmSnapshot {
    pub accumulator: i64,
    pub program_counter: usize,
    pub instruction_register: i64,
    pub memory: Vec<i64>,
    pub call_stack: Vec<usize>,
    pub breakpoints: Vec<usize>,
    pub conditional_breakpoints: Vec<ConditionalBreakpoint>,
    pub watches: Vec<WatchValue>,
    pub history_size: usize,
    pub instruction_count: u64,
    pub running: bool,
    pub state: VmState,
    pub protected: Vec<usize>,
    pub access_counts: Vec<u64>,
}

impl VmSnapshot {
    pub fn to_json(&self) -> String {
        // Plain data with string keys; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use crate::vm::Vm;

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut vm = Vm::new();
        vm.load_words(&[9, 0]);
        let mut snap = vm.snapshot();
        snap.memory[0] = 42;
        snap.call_stack.push(3);
        assert_eq!(vm.memory().peek(0), Some(9));
        assert!(vm.call_stack().is_empty());
    }

    #[test]
    fn test_snapshot_json() {
        let mut vm = Vm::new();
        vm.load_words(&[9, 0]);
        vm.debug_mut().watches.add("acc".parse().unwrap());
        vm.step().unwrap();
        let json = vm.snapshot().to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["accumulator"], 1);
        assert_eq!(value["running"], true);
        assert_eq!(value["watches"][0]["name"], "ACC");
        assert_eq!(value["memory"].as_array().unwrap().len(), 81);
    }
}
