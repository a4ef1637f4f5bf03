//! # tritvm
//!
//! A small balanced ternary virtual machine with developer tooling:
//! breakpoints, conditional breakpoints, watch expressions and
//! step-back through a bounded execution history.
//!
//! The machine has one accumulator, one program counter and one flat memory
//! of 27, 81 or 243 words. Programs are whitespace-separated balanced ternary
//! tokens (`+`, `0`, `-`), one per memory word.

pub mod ternary;
pub mod vm;
pub mod debug;
pub mod asm;
pub mod config;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use ternary::{Trit, to_balanced_ternary, from_balanced_ternary, validate_ternary, NumeralError};
pub use vm::{
    Vm, VmError, VmState, HaltReason, StepOutcome, RunStop, RunSummary,
    Memory, MemorySize, Opcode, VmObserver, VmSnapshot, LoadError,
};
pub use debug::{Breakpoints, ConditionalBreakpoint, Comparison, Probe, Watch, WatchValue};
pub use asm::{assemble, disassemble, to_program_text, AsmError};
pub use config::{VmConfig, ConfigError};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
