//! Assembler and disassembler for VM programs.
//!
//! This module provides:
//! - A two-pass assembler (mnemonics → memory words / ternary program text)
//! - A disassembler (memory words → readable text)

pub mod assembler;
pub mod disasm;

pub use assembler::{assemble, to_program_text, AsmError};
pub use disasm::{disassemble, disassemble_at, listing};
