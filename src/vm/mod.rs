//! The balanced ternary virtual machine.
//!
//! - One accumulator, a program counter and an instruction register
//! - A flat memory of 27, 81 or 243 signed words
//! - A bounded call stack for CALL/RET
//! - 18 opcodes; every other word is inert data

pub mod memory;
pub mod registers;
pub mod decode;
pub mod loader;
pub mod execute;
pub mod observer;
pub mod snapshot;

pub use memory::{Memory, MemoryError, MemorySize};
pub use registers::Registers;
pub use decode::Opcode;
pub use loader::{parse_program, LoadError};
pub use execute::{Vm, VmError, VmState, HaltReason, StepOutcome, RunStop, RunSummary};
pub use observer::{VmObserver, VmEvent, EventLog};
pub use snapshot::VmSnapshot;
