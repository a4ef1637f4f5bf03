//! VM registers.
//!
//! The machine has three registers:
//! - ACC: the accumulator (main computation register)
//! - PC: the program counter, an index into memory
//! - IR: the instruction register, holding the last fetched word

use serde::{Serialize, Deserialize};

/// The register file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// Accumulator
    pub acc: i64,
    /// Program counter
    pub pc: usize,
    /// Instruction register (raw word, which is its own opcode)
    pub ir: i64,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Increment the program counter by 1.
    pub fn advance_pc(&mut self) {
        self.pc += 1;
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: usize) {
        self.pc = addr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_pc() {
        let mut regs = Registers::new();
        regs.pc = 10;

        regs.advance_pc();
        assert_eq!(regs.pc, 11);
    }

    #[test]
    fn test_reset() {
        let mut regs = Registers { acc: -4, pc: 7, ir: 9 };
        regs.reset();
        assert_eq!(regs, Registers::new());
    }
}
