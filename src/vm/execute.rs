//! VM execution engine.
//!
//! Implements the fetch-decode-execute cycle, the instruction behaviors and
//! the debugger hooks that run around each step.

use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::config::VmConfig;
use crate::debug::{ConditionalBreakpoint, DebugConfig, History, HistoryEntry, WatchValue};
use crate::vm::decode::Opcode;
use crate::vm::loader::{parse_program, LoadError};
use crate::vm::memory::{Memory, MemoryError, MemorySize};
use crate::vm::observer::VmObserver;
use crate::vm::registers::Registers;
use crate::vm::snapshot::VmSnapshot;

/// VM execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VmState {
    /// Constructed or reset; no step taken yet.
    Idle,
    /// Accepting steps.
    Running,
    /// Stopped for good until reset or load.
    Halted,
    /// Stopped by a breakpoint; stepping continues the run.
    Paused,
}

/// Why a run stopped without an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltReason {
    /// HALT (0) executed.
    HaltInstruction,
    /// PC was outside memory before fetch.
    PcOutOfBounds(usize),
    /// Execution ran past the last memory word.
    EndOfMemory,
    /// Address breakpoint; the instruction there has not run.
    Breakpoint(usize),
    /// Conditional breakpoint held after a step.
    Condition(ConditionalBreakpoint),
}

impl HaltReason {
    pub fn is_breakpoint(&self) -> bool {
        matches!(self, HaltReason::Breakpoint(_) | HaltReason::Condition(_))
    }
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltReason::HaltInstruction => write!(f, "Halt instruction (0) encountered"),
            HaltReason::PcOutOfBounds(pc) => write!(f, "Program counter out of bounds ({})", pc),
            HaltReason::EndOfMemory => write!(f, "End of memory reached"),
            HaltReason::Breakpoint(addr) => write!(f, "Breakpoint hit at address {}", addr),
            HaltReason::Condition(c) => write!(f, "Conditional breakpoint hit: {}", c),
        }
    }
}

/// Result of a step that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// An instruction ran and the machine can keep going.
    Continue,
    /// The run stopped.
    Halted(HaltReason),
}

/// How a call to [`Vm::run`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStop {
    Halted(HaltReason),
    Faulted(VmError),
    /// The step budget ran out with the machine still running.
    Budget,
}

/// Summary of a [`Vm::run`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// `step()` calls that returned without an error.
    pub steps: u64,
    pub stop: RunStop,
}

/// Where control goes after an instruction.
enum Flow {
    Next,
    Jump(usize),
    Halt,
    /// The operand word lies past the end of memory.
    EndOfMemory,
}

/// The virtual machine.
///
/// Execution state (registers, memory, call stack, counters, history) is
/// reinitialized by [`Vm::reset`]. The [`DebugConfig`] is not.
pub struct Vm {
    regs: Registers,
    mem: Memory,
    call_stack: Vec<usize>,
    instruction_count: u64,
    state: VmState,
    /// Address of the breakpoint we are paused at; the next step runs it.
    resume_at: Option<usize>,
    history: History,
    debug: DebugConfig,
    config: VmConfig,
    observers: Vec<Box<dyn VmObserver>>,
}

impl Vm {
    /// Create a VM with default settings.
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        let mut mem = Memory::new(config.memory_size);
        mem.set_tracking(config.heatmap_enabled);
        Self {
            regs: Registers::new(),
            mem,
            call_stack: Vec::with_capacity(config.max_call_depth),
            instruction_count: 0,
            state: VmState::Idle,
            resume_at: None,
            history: History::new(config.max_history, config.history_enabled),
            debug: DebugConfig::default(),
            config,
            observers: Vec::new(),
        }
    }

    /// Reinitialize execution state. Breakpoints and watches are kept.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.call_stack.clear();
        self.instruction_count = 0;
        self.state = VmState::Idle;
        self.resume_at = None;
        self.history.clear();
        info!(memory = self.mem.len(), "vm reset");
    }

    /// Reset, then load program text. Returns the number of words written.
    ///
    /// Tokens beyond the end of memory are dropped.
    pub fn load_program(&mut self, text: &str) -> Result<usize, VmError> {
        self.reset();
        let words = parse_program(text)?;
        Ok(self.write_program(&words))
    }

    /// Reset, then copy words into memory from address 0.
    pub fn load_words(&mut self, words: &[i64]) -> usize {
        self.reset();
        self.write_program(words)
    }

    fn write_program(&mut self, words: &[i64]) -> usize {
        let count = self.mem.load_image(words);
        if count < words.len() {
            warn!(loaded = count, dropped = words.len() - count, "program truncated to memory size");
        }
        info!(words = count, "program loaded");
        count
    }

    /// Rebuild memory with a new size. Rejected while running.
    pub fn resize(&mut self, size: MemorySize) -> Result<(), VmError> {
        if self.state == VmState::Running {
            return Err(VmError::ResizeWhileRunning);
        }
        self.config.memory_size = size;
        self.mem = Memory::new(size);
        self.mem.set_tracking(self.config.heatmap_enabled);
        self.reset();
        info!(words = size.words(), "memory resized");
        Ok(())
    }

    /// Execute a single instruction.
    pub fn step(&mut self) -> Result<StepOutcome, VmError> {
        if self.state == VmState::Halted {
            return Err(VmError::NotRunning(self.state));
        }

        if self.instruction_count >= self.config.max_instructions {
            return Err(self.fault(VmError::InstructionLimit(self.config.max_instructions)));
        }

        let pc = self.regs.pc;
        let resuming = self.resume_at.take() == Some(pc);
        if !resuming && self.debug.breakpoints.contains(pc) {
            self.resume_at = Some(pc);
            return Ok(self.halt(HaltReason::Breakpoint(pc)));
        }

        self.state = VmState::Running;

        // Fetch
        let Some(word) = self.mem.peek(pc) else {
            return Ok(self.halt(HaltReason::PcOutOfBounds(pc)));
        };
        if self.history.is_recording() {
            let entry = self.capture();
            self.history.record(entry);
        }
        self.regs.ir = word;

        // Decode + execute
        let flow = match self.execute(word) {
            Ok(flow) => flow,
            Err(e) => return Err(self.fault(e)),
        };
        self.instruction_count += 1;
        trace!(pc, word, acc = self.regs.acc, depth = self.call_stack.len(), "step");

        let mut reason = match flow {
            Flow::Next => {
                self.regs.advance_pc();
                None
            }
            Flow::Jump(target) => {
                self.regs.jump(target);
                None
            }
            Flow::Halt => Some(HaltReason::HaltInstruction),
            Flow::EndOfMemory => Some(HaltReason::EndOfMemory),
        };

        if reason.is_none() && self.regs.pc >= self.mem.len() {
            reason = Some(HaltReason::EndOfMemory);
        }

        if reason.is_none() {
            reason = self
                .debug
                .breakpoints
                .first_hit(self.regs.acc, self.mem.cells())
                .cloned()
                .map(HaltReason::Condition);
        }

        self.notify_state_change();

        Ok(match reason {
            Some(reason) => self.halt(reason),
            None => StepOutcome::Continue,
        })
    }

    /// Undo the most recent step.
    pub fn step_back(&mut self) -> Result<(), VmError> {
        let entry = self.history.pop().ok_or(VmError::NoHistory)?;
        self.regs = entry.regs;
        self.mem.restore(&entry.memory);
        self.call_stack = entry.call_stack;
        self.instruction_count = entry.instruction_count;
        self.state = VmState::Running;
        self.resume_at = None;
        debug!(pc = self.regs.pc, remaining = self.history.len(), "stepped back");
        self.notify_state_change();
        Ok(())
    }

    /// Step until the run stops or `max_steps` steps have been taken.
    pub fn run(&mut self, max_steps: u64) -> RunSummary {
        let mut steps = 0;
        while steps < max_steps {
            match self.step() {
                Ok(StepOutcome::Continue) => steps += 1,
                Ok(StepOutcome::Halted(reason)) => {
                    steps += 1;
                    return RunSummary { steps, stop: RunStop::Halted(reason) };
                }
                Err(e) => return RunSummary { steps, stop: RunStop::Faulted(e) },
            }
        }
        RunSummary { steps, stop: RunStop::Budget }
    }

    fn execute(&mut self, word: i64) -> Result<Flow, VmError> {
        let Some(op) = Opcode::decode(word) else {
            // Unknown words are data.
            return Ok(Flow::Next);
        };

        let operand = if op.has_operand() {
            self.regs.advance_pc();
            match self.mem.peek(self.regs.pc) {
                Some(value) => value,
                None => return Ok(Flow::EndOfMemory),
            }
        } else {
            0
        };
        let target = self.mem.address(operand);

        match op {
            // ==================== Control ====================

            Opcode::Halt => return Ok(Flow::Halt),

            Opcode::Jmp => return Ok(Self::jump_if(true, target)),
            Opcode::Jz => return Ok(Self::jump_if(self.regs.acc == 0, target)),
            Opcode::Jnz => return Ok(Self::jump_if(self.regs.acc != 0, target)),
            Opcode::Jnp => return Ok(Self::jump_if(self.regs.acc > 0, target)),

            Opcode::Call => {
                if self.call_stack.len() >= self.config.max_call_depth {
                    return Err(VmError::CallStackOverflow(self.config.max_call_depth));
                }
                if let Some(target) = target {
                    // PC sits on the operand word; return past it.
                    self.call_stack.push(self.regs.pc + 1);
                    return Ok(Flow::Jump(target));
                }
            }

            Opcode::Ret => {
                let addr = self.call_stack.pop().ok_or(VmError::EmptyCallStack)?;
                return Ok(Flow::Jump(addr));
            }

            // ==================== Arithmetic ====================

            Opcode::Add => self.regs.acc = self.regs.acc.wrapping_add(operand),
            Opcode::Sub => self.regs.acc = self.regs.acc.wrapping_sub(operand),
            Opcode::Shl => self.regs.acc = self.regs.acc.wrapping_mul(3),
            Opcode::Shr => self.regs.acc = self.regs.acc.div_euclid(3),
            Opcode::Neg => self.regs.acc = self.regs.acc.wrapping_neg(),
            Opcode::Inc => self.regs.acc = self.regs.acc.wrapping_add(1),
            Opcode::Dec => self.regs.acc = self.regs.acc.wrapping_sub(1),

            // ==================== Data Transfer ====================

            Opcode::Load => {
                if let Some(addr) = target {
                    self.regs.acc = self.mem.load(addr)?;
                }
            }

            Opcode::Store => {
                if let Some(addr) = target {
                    self.mem.store(addr, self.regs.acc)?;
                }
            }

            Opcode::LoadI => {
                if let Some(addr) = self.indirect(target)? {
                    self.regs.acc = self.mem.load(addr)?;
                }
            }

            Opcode::StoreI => {
                if let Some(addr) = self.indirect(target)? {
                    self.mem.store(addr, self.regs.acc)?;
                }
            }
        }

        Ok(Flow::Next)
    }

    fn jump_if(condition: bool, target: Option<usize>) -> Flow {
        match target {
            Some(target) if condition => Flow::Jump(target),
            _ => Flow::Next,
        }
    }

    /// Follow the pointer stored at `pointer`, if both are in range.
    fn indirect(&mut self, pointer: Option<usize>) -> Result<Option<usize>, VmError> {
        let Some(pointer) = pointer else {
            return Ok(None);
        };
        let value = self.mem.load(pointer)?;
        Ok(self.mem.address(value))
    }

    fn capture(&self) -> HistoryEntry {
        HistoryEntry {
            regs: self.regs,
            memory: self.mem.cells().to_vec(),
            call_stack: self.call_stack.clone(),
            instruction_count: self.instruction_count,
        }
    }

    /// Stop the run with an error and report it.
    fn fault(&mut self, error: VmError) -> VmError {
        self.state = VmState::Halted;
        warn!(pc = self.regs.pc, %error, "execution fault");
        let message = error.to_string();
        for observer in &mut self.observers {
            observer.on_error(&message);
        }
        error
    }

    /// Stop the run without an error and report it.
    fn halt(&mut self, reason: HaltReason) -> StepOutcome {
        self.state = if reason.is_breakpoint() { VmState::Paused } else { VmState::Halted };
        if reason.is_breakpoint() {
            debug!(pc = self.regs.pc, %reason, "paused");
        } else {
            info!(pc = self.regs.pc, steps = self.instruction_count, %reason, "halted");
        }
        let message = reason.to_string();
        for observer in &mut self.observers {
            observer.on_halt(&message);
        }
        StepOutcome::Halted(reason)
    }

    fn notify_state_change(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for observer in &mut self.observers {
            observer.on_state_change(&snapshot);
        }
    }

    // ==================== Observation ====================

    /// Register a callback receiver.
    pub fn add_observer(&mut self, observer: Box<dyn VmObserver>) {
        self.observers.push(observer);
    }

    /// Deep copy of everything a front end displays.
    pub fn snapshot(&self) -> VmSnapshot {
        VmSnapshot {
            accumulator: self.regs.acc,
            program_counter: self.regs.pc,
            instruction_register: self.regs.ir,
            memory: self.mem.cells().to_vec(),
            call_stack: self.call_stack.clone(),
            breakpoints: self.debug.breakpoints.addresses().collect(),
            conditional_breakpoints: self.debug.breakpoints.conditions().to_vec(),
            watches: self.watch_values(),
            history_size: self.history.len(),
            instruction_count: self.instruction_count,
            running: self.state == VmState::Running,
            state: self.state,
            protected: self.mem.protected().collect(),
            access_counts: self.mem.access_counts().to_vec(),
        }
    }

    /// Current value of every watch, in list order.
    pub fn watch_values(&self) -> Vec<WatchValue> {
        self.debug.watches.evaluate(self.regs.acc, self.mem.cells())
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn accumulator(&self) -> i64 {
        self.regs.acc
    }

    pub fn pc(&self) -> usize {
        self.regs.pc
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    /// Direct memory access for editors and protection management.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.mem
    }

    pub fn call_stack(&self) -> &[usize] {
        &self.call_stack
    }

    pub fn instruction_count(&self) -> u64 {
        self.instruction_count
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == VmState::Running
    }

    pub fn is_halted(&self) -> bool {
        self.state == VmState::Halted
    }

    pub fn is_paused(&self) -> bool {
        self.state == VmState::Paused
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn oldest_history(&self) -> Option<&HistoryEntry> {
        self.history.oldest()
    }

    pub fn debug(&self) -> &DebugConfig {
        &self.debug
    }

    pub fn debug_mut(&mut self) -> &mut DebugConfig {
        &mut self.debug
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    // ==================== Configuration ====================

    /// Turning history off discards what was recorded.
    pub fn set_history_enabled(&mut self, enabled: bool) {
        self.config.history_enabled = enabled;
        self.history.set_enabled(enabled);
    }

    pub fn set_max_history(&mut self, max: usize) {
        self.config.max_history = max;
        self.history.set_capacity(max);
    }

    pub fn set_heatmap_enabled(&mut self, enabled: bool) {
        self.config.heatmap_enabled = enabled;
        self.mem.set_tracking(enabled);
    }

    pub fn set_max_call_depth(&mut self, depth: usize) {
        self.config.max_call_depth = depth;
    }

    pub fn set_max_instructions(&mut self, max: u64) {
        self.config.max_instructions = max;
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Vm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vm")
            .field("state", &self.state)
            .field("instruction_count", &self.instruction_count)
            .field("regs", &self.regs)
            .field("call_stack", &self.call_stack)
            .field("history", &self.history.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Errors that can occur during VM operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("VM not running: {0:?}")]
    NotRunning(VmState),

    #[error("Instruction limit of {0} reached (possible infinite loop)")]
    InstructionLimit(u64),

    #[error("Call stack overflow (max depth {0})")]
    CallStackOverflow(usize),

    #[error("Return with empty call stack")]
    EmptyCallStack,

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("No history to step back to")]
    NoHistory,

    #[error("Cannot change memory size while running")]
    ResizeWhileRunning,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::{Comparison, Probe};
    use crate::vm::{EventLog, VmEvent};

    fn vm_with(words: &[i64]) -> Vm {
        let mut vm = Vm::with_config(VmConfig { memory_size: MemorySize::Small, ..VmConfig::default() });
        vm.load_words(words);
        vm
    }

    #[test]
    fn test_halt() {
        let mut vm = vm_with(&[0]);
        assert_eq!(vm.step().unwrap(), StepOutcome::Halted(HaltReason::HaltInstruction));
        assert!(vm.is_halted());
        assert_eq!(vm.pc(), 0);
        assert_eq!(vm.instruction_count(), 1);
        assert_eq!(vm.step(), Err(VmError::NotRunning(VmState::Halted)));
    }

    #[test]
    fn test_idle_then_running() {
        let mut vm = vm_with(&[9, 0]);
        assert_eq!(vm.state(), VmState::Idle);
        assert_eq!(vm.step().unwrap(), StepOutcome::Continue);
        assert!(vm.is_running());
    }

    #[test]
    fn test_immediate_arithmetic() {
        // ADD 5; SUB 7; NEG; INC; DEC; DEC; HALT
        let mut vm = vm_with(&[1, 5, -1, 7, 8, 9, -9, -9, 0]);
        let summary = vm.run(100);
        assert_eq!(summary.stop, RunStop::Halted(HaltReason::HaltInstruction));
        assert_eq!(vm.accumulator(), 1);
        assert_eq!(summary.steps, 7);
    }

    #[test]
    fn test_shr_floors() {
        // ADD -4; SHR; HALT
        let mut vm = vm_with(&[1, -4, -6, 0]);
        vm.run(10);
        assert_eq!(vm.accumulator(), -2);
    }

    #[test]
    fn test_load_store() {
        // ADD 4; STORE 20; LOAD 21; HALT
        let mut vm = vm_with(&[1, 4, -2, 20, 2, 21, 0]);
        vm.memory_mut().poke(21, -13).unwrap();
        vm.run(10);
        assert_eq!(vm.memory().peek(20), Some(4));
        assert_eq!(vm.accumulator(), -13);
    }

    #[test]
    fn test_out_of_range_operands_are_ignored() {
        // LOAD 99; STORE -1; JMP 500; INC; HALT
        let mut vm = vm_with(&[2, 99, -2, -1, 3, 500, 9, 0]);
        let summary = vm.run(10);
        assert_eq!(summary.stop, RunStop::Halted(HaltReason::HaltInstruction));
        assert_eq!(vm.accumulator(), 1);
    }

    #[test]
    fn test_conditional_jumps() {
        let mut vm = vm_with(&[4, 3, 0, 9, -4, 7, 0, 5, 10, 0, 8, 0]);
        // 0: JZ 3 -> taken (acc 0)
        // 3: INC -> 1
        // 4: JNZ 7 -> taken
        // 7: JNP 10 -> taken (acc 1 > 0)
        // 10: NEG -> -1
        // 11: HALT
        let summary = vm.run(20);
        assert_eq!(summary.stop, RunStop::Halted(HaltReason::HaltInstruction));
        assert_eq!(vm.accumulator(), -1);
        assert_eq!(vm.pc(), 11);
        assert_eq!(summary.steps, 6);
    }

    #[test]
    fn test_jump_not_taken_skips_operand() {
        // INC; JZ 0; HALT
        let mut vm = vm_with(&[9, 4, 0, 0]);
        vm.run(10);
        assert_eq!(vm.pc(), 3);
    }

    #[test]
    fn test_indirect() {
        // LOADI 10; STOREI 11; HALT
        let mut vm = vm_with(&[10, 10, -10, 11, 0]);
        vm.memory_mut().poke(10, 12).unwrap();
        vm.memory_mut().poke(12, 77).unwrap();
        vm.memory_mut().poke(11, 13).unwrap();
        vm.run(10);
        assert_eq!(vm.accumulator(), 77);
        assert_eq!(vm.memory().peek(13), Some(77));
    }

    #[test]
    fn test_call_ret() {
        // 0: CALL 4; 2: HALT; 4: INC; 5: RET
        let mut vm = vm_with(&[7, 4, 0, 0, 9, -7]);
        assert_eq!(vm.step().unwrap(), StepOutcome::Continue);
        assert_eq!(vm.pc(), 4);
        assert_eq!(vm.call_stack(), &[2]);
        vm.run(10);
        assert_eq!(vm.accumulator(), 1);
        assert!(vm.call_stack().is_empty());
        assert_eq!(vm.pc(), 2);
    }

    #[test]
    fn test_call_overflow() {
        // 0: CALL 0 recurses forever
        let mut vm = vm_with(&[7, 0]);
        vm.set_max_call_depth(3);
        let summary = vm.run(100);
        assert_eq!(summary.stop, RunStop::Faulted(VmError::CallStackOverflow(3)));
        assert_eq!(vm.call_stack().len(), 3);
        assert!(vm.is_halted());
    }

    #[test]
    fn test_ret_empty_stack() {
        let mut vm = vm_with(&[-7]);
        assert_eq!(vm.step(), Err(VmError::EmptyCallStack));
        assert!(vm.is_halted());
    }

    #[test]
    fn test_instruction_limit() {
        // JMP 0
        let mut vm = vm_with(&[3, 0]);
        vm.set_max_instructions(5);
        let summary = vm.run(100);
        assert_eq!(summary.steps, 5);
        assert_eq!(summary.stop, RunStop::Faulted(VmError::InstructionLimit(5)));
        assert_eq!(vm.instruction_count(), 5);
    }

    #[test]
    fn test_end_of_memory() {
        let mut vm = vm_with(&[9; 27]);
        let summary = vm.run(100);
        assert_eq!(summary.stop, RunStop::Halted(HaltReason::EndOfMemory));
        assert_eq!(vm.accumulator(), 27);
    }

    #[test]
    fn test_missing_operand_is_end_of_memory() {
        let mut words = vec![100; 27];
        words[26] = 1; // ADD with no operand word
        let mut vm = vm_with(&words);
        vm.run(100);
        assert_eq!(vm.accumulator(), 0);
        assert!(vm.is_halted());
    }

    #[test]
    fn test_protected_store() {
        // ADD 5; STORE 20; HALT
        let mut vm = vm_with(&[1, 5, -2, 20, 0]);
        vm.memory_mut().poke(20, 1).unwrap();
        vm.memory_mut().protect(20).unwrap();
        let summary = vm.run(10);
        assert_eq!(summary.stop, RunStop::Faulted(VmError::Memory(MemoryError::Protected(20))));
        assert_eq!(vm.memory().peek(20), Some(1));
        // PC stays on the consumed operand word
        assert_eq!(vm.pc(), 3);
        assert_eq!(vm.instruction_count(), 1);
    }

    #[test]
    fn test_breakpoint_pauses_before_execution() {
        // INC; INC; INC; HALT
        let mut vm = vm_with(&[9, 9, 9, 0]);
        vm.debug_mut().breakpoints.add(1);
        vm.step().unwrap();
        assert_eq!(vm.step().unwrap(), StepOutcome::Halted(HaltReason::Breakpoint(1)));
        assert!(vm.is_paused());
        assert_eq!(vm.accumulator(), 1);
        assert_eq!(vm.history_len(), 1);

        // Continue runs the breakpointed instruction exactly once.
        assert_eq!(vm.step().unwrap(), StepOutcome::Continue);
        assert_eq!(vm.accumulator(), 2);
        assert_eq!(vm.pc(), 2);
    }

    #[test]
    fn test_conditional_breakpoint() {
        // INC x4; HALT
        let mut vm = vm_with(&[9, 9, 9, 9, 0]);
        vm.debug_mut()
            .breakpoints
            .add_condition(ConditionalBreakpoint::new(Probe::Accumulator, Comparison::Ge, 2));
        let summary = vm.run(10);
        match summary.stop {
            RunStop::Halted(HaltReason::Condition(c)) => assert_eq!(c.to_string(), "ACC >= 2"),
            other => panic!("unexpected stop: {:?}", other),
        }
        assert_eq!(vm.accumulator(), 2);
        assert_eq!(vm.pc(), 2);
        assert!(vm.is_paused());
    }

    #[test]
    fn test_step_back_restores_everything() {
        // CALL 4; HALT; pad; STORE 10; RET
        let mut vm = vm_with(&[7, 4, 0, 0, -2, 10, -7]);
        vm.memory_mut().poke(10, 5).unwrap();
        let before = vm.snapshot();
        for _ in 0..3 {
            vm.step().unwrap();
        }
        for _ in 0..3 {
            vm.step_back().unwrap();
        }
        let after = vm.snapshot();
        assert_eq!(after.memory, before.memory);
        assert_eq!(after.call_stack, before.call_stack);
        assert_eq!(after.program_counter, before.program_counter);
        assert_eq!(after.accumulator, before.accumulator);
        assert_eq!(after.instruction_count, 0);
        assert_eq!(vm.step_back(), Err(VmError::NoHistory));
    }

    #[test]
    fn test_step_back_after_halt() {
        let mut vm = vm_with(&[9, 0]);
        vm.run(10);
        assert!(vm.is_halted());
        vm.step_back().unwrap();
        assert!(vm.is_running());
        assert_eq!(vm.pc(), 1);
        assert_eq!(vm.step().unwrap(), StepOutcome::Halted(HaltReason::HaltInstruction));
    }

    #[test]
    fn test_reset_keeps_debug_config() {
        let mut vm = vm_with(&[9, 0]);
        vm.debug_mut().breakpoints.add(1);
        vm.debug_mut().watches.add("acc".parse().unwrap());
        vm.debug_mut().breakpoints.add_condition("acc > 3".parse().unwrap());
        vm.step().unwrap();
        vm.reset();
        assert!(vm.debug().breakpoints.contains(1));
        assert_eq!(vm.debug().watches.len(), 1);
        assert_eq!(
            vm.debug().breakpoints.conditions(),
            &[ConditionalBreakpoint::new(Probe::Accumulator, Comparison::Gt, 3)]
        );
        assert_eq!(vm.history_len(), 0);
        assert_eq!(vm.state(), VmState::Idle);
        assert_eq!(vm.memory().peek(0), Some(0));
    }

    #[test]
    fn test_resize_guard() {
        let mut vm = vm_with(&[9, 9, 0]);
        vm.step().unwrap();
        assert_eq!(vm.resize(MemorySize::Large), Err(VmError::ResizeWhileRunning));
        vm.run(10);
        vm.resize(MemorySize::Large).unwrap();
        assert_eq!(vm.memory().len(), 243);
        assert_eq!(vm.state(), VmState::Idle);
    }

    #[test]
    fn test_heatmap_counts_data_access() {
        // LOAD 20; STORE 20; HALT
        let mut vm = vm_with(&[2, 20, -2, 20, 0]);
        vm.set_heatmap_enabled(true);
        vm.run(10);
        assert_eq!(vm.memory().access_counts()[20], 2);
        assert_eq!(vm.memory().access_counts()[0], 0);
    }

    #[test]
    fn test_protected_indirect_store() {
        // INC; STOREI 10; HALT, with mem[10] pointing at protected 12
        let events = EventLog::new();
        let mut vm = vm_with(&[9, -10, 10, 0]);
        vm.add_observer(Box::new(events.clone()));
        vm.memory_mut().poke(10, 12).unwrap();
        vm.memory_mut().poke(12, 5).unwrap();
        vm.memory_mut().protect(12).unwrap();

        let summary = vm.run(10);
        assert_eq!(summary.stop, RunStop::Faulted(VmError::Memory(MemoryError::Protected(12))));
        assert_eq!(vm.memory().peek(12), Some(5));
        assert_eq!(vm.pc(), 2);

        let log = events.drain();
        let errors: Vec<_> = log.iter().filter(|e| matches!(e, VmEvent::Error(_))).collect();
        assert_eq!(errors, vec![&VmEvent::Error("memory protection violation at address 12".into())]);
        assert!(!log.iter().any(|e| matches!(e, VmEvent::Halt(_))));
    }

    #[test]
    fn test_zero_history_capacity() {
        let mut vm = vm_with(&[9, 9, 0]);
        vm.set_max_history(0);
        vm.step().unwrap();
        assert_eq!(vm.history_len(), 0);
        assert_eq!(vm.step_back(), Err(VmError::NoHistory));
        assert_eq!(vm.accumulator(), 1);
    }

    #[test]
    fn test_disabling_history() {
        let mut vm = vm_with(&[9, 9, 0]);
        vm.step().unwrap();
        assert_eq!(vm.history_len(), 1);
        vm.set_history_enabled(false);
        assert_eq!(vm.history_len(), 0);
        vm.step().unwrap();
        assert_eq!(vm.step_back(), Err(VmError::NoHistory));
    }
}
