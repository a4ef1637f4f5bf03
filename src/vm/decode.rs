//! Opcode decoder.
//!
//! A machine word is its own opcode: there is no operand bit field. Two-word
//! instructions take their operand from the word that follows. Words that
//! match no opcode are inert data and execute as no-ops.

use serde::{Serialize, Deserialize};

/// The closed opcode set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    // ==================== Control ====================

    /// Stop execution
    Halt,
    /// Unconditional jump: PC := [PC+1]
    Jmp,
    /// Jump if ACC = 0
    Jz,
    /// Jump if ACC != 0
    Jnz,
    /// Jump if ACC > 0
    Jnp,
    /// Push return address and jump
    Call,
    /// Pop return address
    Ret,

    // ==================== Arithmetic ====================

    /// ACC := ACC + [PC+1] (immediate)
    Add,
    /// ACC := ACC - [PC+1] (immediate)
    Sub,
    /// ACC := ACC * 3
    Shl,
    /// ACC := floor(ACC / 3)
    Shr,
    /// ACC := -ACC
    Neg,
    /// ACC := ACC + 1
    Inc,
    /// ACC := ACC - 1
    Dec,

    // ==================== Data Transfer ====================

    /// ACC := M[[PC+1]]
    Load,
    /// M[[PC+1]] := ACC
    Store,
    /// ACC := M[M[[PC+1]]]
    LoadI,
    /// M[M[[PC+1]]] := ACC
    StoreI,
}

impl Opcode {
    /// Every opcode, in table order.
    pub const ALL: [Opcode; 18] = [
        Opcode::Halt,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Load,
        Opcode::Store,
        Opcode::Jmp,
        Opcode::Jz,
        Opcode::Jnz,
        Opcode::Jnp,
        Opcode::Shl,
        Opcode::Shr,
        Opcode::Call,
        Opcode::Ret,
        Opcode::Neg,
        Opcode::Inc,
        Opcode::Dec,
        Opcode::LoadI,
        Opcode::StoreI,
    ];

    /// Decode a machine word. `None` means the word is plain data.
    pub const fn decode(word: i64) -> Option<Self> {
        let op = match word {
            0 => Opcode::Halt,
            1 => Opcode::Add,
            -1 => Opcode::Sub,
            2 => Opcode::Load,
            -2 => Opcode::Store,
            3 => Opcode::Jmp,
            4 => Opcode::Jz,
            -4 => Opcode::Jnz,
            5 => Opcode::Jnp,
            6 => Opcode::Shl,
            -6 => Opcode::Shr,
            7 => Opcode::Call,
            -7 => Opcode::Ret,
            8 => Opcode::Neg,
            9 => Opcode::Inc,
            -9 => Opcode::Dec,
            10 => Opcode::LoadI,
            -10 => Opcode::StoreI,
            _ => return None,
        };
        Some(op)
    }

    /// The word that encodes this opcode.
    pub const fn encode(self) -> i64 {
        match self {
            Opcode::Halt => 0,
            Opcode::Add => 1,
            Opcode::Sub => -1,
            Opcode::Load => 2,
            Opcode::Store => -2,
            Opcode::Jmp => 3,
            Opcode::Jz => 4,
            Opcode::Jnz => -4,
            Opcode::Jnp => 5,
            Opcode::Shl => 6,
            Opcode::Shr => -6,
            Opcode::Call => 7,
            Opcode::Ret => -7,
            Opcode::Neg => 8,
            Opcode::Inc => 9,
            Opcode::Dec => -9,
            Opcode::LoadI => 10,
            Opcode::StoreI => -10,
        }
    }

    /// True for opcodes that consume the following word as operand.
    pub const fn has_operand(self) -> bool {
        matches!(
            self,
            Opcode::Add
                | Opcode::Sub
                | Opcode::Load
                | Opcode::Store
                | Opcode::Jmp
                | Opcode::Jz
                | Opcode::Jnz
                | Opcode::Jnp
                | Opcode::Call
                | Opcode::LoadI
                | Opcode::StoreI
        )
    }

    /// Number of memory words the instruction occupies.
    pub const fn width(self) -> usize {
        if self.has_operand() { 2 } else { 1 }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Halt => "HALT",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Load => "LOAD",
            Opcode::Store => "STORE",
            Opcode::Jmp => "JMP",
            Opcode::Jz => "JZ",
            Opcode::Jnz => "JNZ",
            Opcode::Jnp => "JNP",
            Opcode::Shl => "SHL",
            Opcode::Shr => "SHR",
            Opcode::Call => "CALL",
            Opcode::Ret => "RET",
            Opcode::Neg => "NEG",
            Opcode::Inc => "INC",
            Opcode::Dec => "DEC",
            Opcode::LoadI => "LOADI",
            Opcode::StoreI => "STOREI",
        }
    }

    /// Look up a mnemonic, case-insensitively. Accepts `HLT`, `LDA` and `STA`
    /// as aliases.
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        match upper.as_str() {
            "HLT" => Some(Opcode::Halt),
            "LDA" => Some(Opcode::Load),
            "STA" => Some(Opcode::Store),
            other => Opcode::ALL.into_iter().find(|op| op.mnemonic() == other),
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_halt() {
        assert_eq!(Opcode::decode(0), Some(Opcode::Halt));
    }

    #[test]
    fn test_table_is_consistent() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::decode(op.encode()), Some(op), "{}", op);
            assert_eq!(Opcode::from_mnemonic(op.mnemonic()), Some(op));
        }
    }

    #[test]
    fn test_unknown_words_are_data() {
        for word in [11, -3, -5, -8, 12, 100, i64::MIN] {
            assert_eq!(Opcode::decode(word), None);
        }
    }

    #[test]
    fn test_widths() {
        assert_eq!(Opcode::Add.width(), 2);
        assert_eq!(Opcode::Call.width(), 2);
        assert_eq!(Opcode::Ret.width(), 1);
        assert_eq!(Opcode::Shl.width(), 1);
        assert_eq!(Opcode::Halt.width(), 1);
    }

    #[test]
    fn test_aliases() {
        assert_eq!(Opcode::from_mnemonic("hlt"), Some(Opcode::Halt));
        assert_eq!(Opcode::from_mnemonic("lda"), Some(Opcode::Load));
        assert_eq!(Opcode::from_mnemonic("sta"), Some(Opcode::Store));
        assert_eq!(Opcode::from_mnemonic("MUL"), None);
    }
}
