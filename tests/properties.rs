//! Property tests for the codec and the debugger guarantees.

use proptest::prelude::*;
use tritvm::{
    from_balanced_ternary, to_balanced_ternary, HaltReason, MemorySize, RunStop, Vm, VmConfig,
};

fn small_vm() -> Vm {
    Vm::with_config(VmConfig { memory_size: MemorySize::Small, ..VmConfig::default() })
}

/// Words drawn mostly from the opcode range so programs actually do things.
fn program() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-12i64..=12, 1..=27)
}

#[derive(Debug, PartialEq)]
struct State {
    acc: i64,
    pc: usize,
    ir: i64,
    memory: Vec<i64>,
    call_stack: Vec<usize>,
    instruction_count: u64,
}

fn state(vm: &Vm) -> State {
    State {
        acc: vm.accumulator(),
        pc: vm.pc(),
        ir: vm.registers().ir,
        memory: vm.memory().cells().to_vec(),
        call_stack: vm.call_stack().to_vec(),
        instruction_count: vm.instruction_count(),
    }
}

proptest! {
    #[test]
    fn codec_round_trips(n in any::<i64>()) {
        let text = to_balanced_ternary(n);
        prop_assert!(text.chars().all(|c| matches!(c, '+' | '0' | '-')));
        prop_assert_eq!(from_balanced_ternary(&text), Ok(n));
    }

    #[test]
    fn step_back_undoes_every_step(words in program(), steps in 1usize..60) {
        let mut vm = small_vm();
        vm.load_words(&words);

        let mut before = Vec::new();
        for _ in 0..steps {
            let saved = state(&vm);
            let recorded = vm.history_len();
            let _ = vm.step();
            if vm.history_len() > recorded {
                before.push(saved);
            }
        }

        while let Some(expected) = before.pop() {
            prop_assert!(vm.step_back().is_ok());
            prop_assert_eq!(state(&vm), expected);
        }
        prop_assert!(vm.step_back().is_err());
    }

    #[test]
    fn history_keeps_most_recent_entries(max in 1usize..20, extra in 0u64..80) {
        let mut vm = Vm::new();
        vm.set_max_history(max);
        // INC; JMP 0
        vm.load_words(&[9, 3, 0]);

        let total = max as u64 + extra;
        let summary = vm.run(total);
        prop_assert_eq!(summary.stop, RunStop::Budget);
        prop_assert_eq!(vm.history_len(), max);
        let oldest = vm.oldest_history().map(|entry| entry.instruction_count);
        prop_assert_eq!(oldest, Some(total - max as u64));
    }

    #[test]
    fn nested_calls_return_to_callers(depth in 1usize..=10) {
        // main: CALL s1; HALT. Each s_i calls s_{i+1} then returns; the last increments.
        let mut words = vec![7, 3, 0];
        for i in 1..depth {
            let next = 3 + 3 * i as i64;
            words.extend([7, next, -7]);
        }
        words.extend([9, -7]);

        let mut vm = Vm::with_config(VmConfig { memory_size: MemorySize::Medium, ..VmConfig::default() });
        vm.load_words(&words);

        let mut deepest = 0;
        loop {
            match vm.step() {
                Ok(tritvm::StepOutcome::Continue) => deepest = deepest.max(vm.call_stack().len()),
                Ok(tritvm::StepOutcome::Halted(reason)) => {
                    prop_assert_eq!(reason, HaltReason::HaltInstruction);
                    break;
                }
                Err(e) => return Err(TestCaseError::fail(e.to_string())),
            }
        }
        prop_assert_eq!(deepest, depth);
        prop_assert!(vm.call_stack().is_empty());
        prop_assert_eq!(vm.accumulator(), 1);
        prop_assert_eq!(vm.pc(), 2);
    }

    #[test]
    fn breakpoint_stops_before_its_instruction(len in 1usize..20, at in 0usize..20) {
        let at = at % len;
        let mut words = vec![9; len];
        words.push(0);

        let mut vm = Vm::new();
        vm.load_words(&words);
        vm.debug_mut().breakpoints.add(at);

        let summary = vm.run(100);
        prop_assert_eq!(summary.stop, RunStop::Halted(HaltReason::Breakpoint(at)));
        prop_assert!(vm.is_paused());
        prop_assert_eq!(vm.pc(), at);
        prop_assert_eq!(vm.accumulator(), at as i64);

        let summary = vm.run(100);
        prop_assert_eq!(summary.stop, RunStop::Halted(HaltReason::HaltInstruction));
        prop_assert_eq!(vm.accumulator(), len as i64);
    }

    #[test]
    fn protected_cells_never_change(
        words in program(),
        guarded in prop::collection::btree_set(0usize..27, 1..6),
    ) {
        let mut vm = small_vm();
        vm.load_words(&words);
        for &addr in &guarded {
            prop_assert!(vm.memory_mut().protect(addr).is_ok());
        }
        let initial = vm.memory().cells().to_vec();

        vm.run(500);

        for &addr in &guarded {
            prop_assert_eq!(vm.memory().peek(addr), Some(initial[addr]));
        }
    }
}
