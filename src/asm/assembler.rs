//! Simple assembler for VM programs.
//!
//! Syntax:
//! ```text
//! ; Comment
//! START:          ; Define a label
//!     ADD 5       ; Add immediate 5
//!     STORE COUNT ; Store to a labeled cell
//!     CALL SUB    ; Call a subroutine
//!     HALT
//! COUNT: DAT 0    ; Define a data word
//! ```
//!
//! Operands are decimal, `0t`-prefixed balanced ternary, or label names.

use std::collections::HashMap;
use thiserror::Error;
use crate::ternary::{from_balanced_ternary, to_balanced_ternary};
use crate::vm::Opcode;

/// Assemble source code to memory words.
pub fn assemble(source: &str) -> Result<Vec<i64>, AsmError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// Render words as loader-ready program text (one token per word).
pub fn to_program_text(words: &[i64]) -> String {
    words.iter().map(|&w| to_balanced_ternary(w)).collect::<Vec<_>>().join(" ")
}

/// An operand waiting for pass 2.
enum Operand {
    Value(i64),
    Label(String),
}

/// The assembler state.
struct Assembler {
    /// Symbol table (label -> address).
    symbols: HashMap<String, i64>,
    /// Pending references: (output index, label, source line).
    pending: Vec<(usize, String, usize)>,
    /// Output words.
    output: Vec<i64>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            pending: Vec::new(),
            output: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<Vec<i64>, AsmError> {
        // Pass 1: collect labels and emit code
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        // Pass 2: resolve label references
        self.resolve_references()?;

        Ok(std::mem::take(&mut self.output))
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AsmError> {
        let line = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let mut line = line.trim();

        if let Some(colon_idx) = line.find(':') {
            let label = line[..colon_idx].trim().to_uppercase();
            if label.is_empty() || label.contains(char::is_whitespace) {
                return Err(AsmError::Syntax { line: line_num, message: format!("bad label '{}'", label) });
            }
            if self.symbols.insert(label.clone(), self.output.len() as i64).is_some() {
                return Err(AsmError::DuplicateLabel { line: line_num, label });
            }
            line = line[colon_idx + 1..].trim();
        }

        if line.is_empty() {
            return Ok(());
        }
        self.process_instruction(line, line_num)
    }

    fn process_instruction(&mut self, line: &str, line_num: usize) -> Result<(), AsmError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let mnemonic = parts[0].to_uppercase();
        if parts.len() > 2 {
            return Err(AsmError::Syntax { line: line_num, message: format!("unexpected '{}'", parts[2]) });
        }
        let operand = parts.get(1).copied();

        if mnemonic == "DAT" || mnemonic == "DATA" {
            let value = operand.ok_or_else(|| AsmError::Syntax {
                line: line_num,
                message: "DAT requires a value".into(),
            })?;
            return self.emit_operand(value, line_num);
        }

        let op = Opcode::from_mnemonic(&mnemonic).ok_or_else(|| AsmError::UnknownMnemonic {
            line: line_num,
            mnemonic: mnemonic.clone(),
        })?;
        self.output.push(op.encode());

        match (op.has_operand(), operand) {
            (true, Some(value)) => self.emit_operand(value, line_num),
            (true, None) => Err(AsmError::Syntax {
                line: line_num,
                message: format!("{} requires an operand", op),
            }),
            (false, Some(extra)) => Err(AsmError::Syntax {
                line: line_num,
                message: format!("{} takes no operand, found '{}'", op, extra),
            }),
            (false, None) => Ok(()),
        }
    }

    fn emit_operand(&mut self, text: &str, line_num: usize) -> Result<(), AsmError> {
        match parse_operand(text, line_num)? {
            Operand::Value(v) => self.output.push(v),
            Operand::Label(label) => {
                self.pending.push((self.output.len(), label, line_num));
                self.output.push(0);
            }
        }
        Ok(())
    }

    fn resolve_references(&mut self) -> Result<(), AsmError> {
        for (out_idx, label, line_num) in &self.pending {
            let addr = self.symbols.get(label).ok_or_else(|| AsmError::UndefinedLabel {
                line: *line_num,
                label: label.clone(),
            })?;
            self.output[*out_idx] = *addr;
        }
        Ok(())
    }
}

fn parse_operand(text: &str, line_num: usize) -> Result<Operand, AsmError> {
    if let Some(digits) = text.strip_prefix("0t").or_else(|| text.strip_prefix("0T")) {
        return from_balanced_ternary(digits)
            .map(Operand::Value)
            .map_err(|e| AsmError::Syntax {
                line: line_num,
                message: format!("invalid ternary literal: {}", e),
            });
    }

    if let Ok(num) = text.parse::<i64>() {
        return Ok(Operand::Value(num));
    }

    let is_label = text.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if is_label {
        Ok(Operand::Label(text.to_uppercase()))
    } else {
        Err(AsmError::Syntax { line: line_num, message: format!("bad operand '{}'", text) })
    }
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmError {
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("duplicate label on line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },
}
