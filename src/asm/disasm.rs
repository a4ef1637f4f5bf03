//! Disassembler for VM programs.
//!
//! Walks memory the way the CPU would: two-word instructions print their
//! operand and the walk skips over it.

use crate::ternary::to_balanced_ternary;
use crate::vm::Opcode;

/// Disassemble the instruction at `addr`.
///
/// Returns the text and the number of words it occupies. Words that are not
/// opcodes print as `DAT`.
pub fn disassemble_at(words: &[i64], addr: usize) -> (String, usize) {
    let Some(&word) = words.get(addr) else {
        return ("???".to_string(), 1);
    };
    match Opcode::decode(word) {
        Some(op) if op.has_operand() => match words.get(addr + 1) {
            Some(operand) => (format!("{} {}", op, operand), 2),
            None => (format!("{} ???", op), 1),
        },
        Some(op) => (op.to_string(), 1),
        None => (format!("DAT {}", word), 1),
    }
}

/// Operand-aware listing: (address, text, width) per instruction.
pub fn listing(words: &[i64]) -> Vec<(usize, String, usize)> {
    let mut lines = Vec::new();
    let mut addr = 0;
    while addr < words.len() {
        let (text, width) = disassemble_at(words, addr);
        lines.push((addr, text, width));
        addr += width;
    }
    lines
}

/// Disassemble a program to readable text.
pub fn disassemble(words: &[i64]) -> String {
    let mut output = String::new();
    output.push_str("; tritvm disassembly\n");
    output.push_str("; ------------------\n\n");

    for (addr, text, width) in listing(words) {
        let raw = words[addr..addr + width]
            .iter()
            .map(|&w| to_balanced_ternary(w))
            .collect::<Vec<_>>()
            .join(" ");
        output.push_str(&format!("{:03}: {:<12} ; {}\n", addr, text, raw));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_at() {
        let words = [1, 3, 6, 0, 42, 7];
        assert_eq!(disassemble_at(&words, 0), ("ADD 3".to_string(), 2));
        assert_eq!(disassemble_at(&words, 2), ("SHL".to_string(), 1));
        assert_eq!(disassemble_at(&words, 4), ("DAT 42".to_string(), 1));
        assert_eq!(disassemble_at(&words, 5), ("CALL ???".to_string(), 1));
    }

    #[test]
    fn test_listing_skips_operands() {
        let words = [1, 3, 6, -6, 0];
        let addrs: Vec<usize> = listing(&words).into_iter().map(|(a, _, _)| a).collect();
        assert_eq!(addrs, vec![0, 2, 3, 4]);
    }

    #[test]
    fn test_disassemble_text() {
        let text = disassemble(&[1, 3, 0]);
        assert!(text.contains("000: ADD 3"));
        assert!(text.contains("; + +0"));
        assert!(text.contains("002: HALT"));
    }
}
