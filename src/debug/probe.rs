//! Probes and comparisons shared by conditional breakpoints and watches.

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use crate::debug::ExprError;
use crate::ternary::from_balanced_ternary;

/// A machine location that can be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Probe {
    /// The accumulator
    Accumulator,
    /// A memory cell
    Memory(usize),
}

impl Probe {
    /// Current value, or `None` when the cell is outside memory.
    pub fn read(self, acc: i64, memory: &[i64]) -> Option<i64> {
        match self {
            Probe::Accumulator => Some(acc),
            Probe::Memory(addr) => memory.get(addr).copied(),
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Probe::Accumulator => write!(f, "ACC"),
            Probe::Memory(addr) => write!(f, "MEM[{}]", addr),
        }
    }
}

impl FromStr for Probe {
    type Err = ExprError;

    /// `acc`, `mem[12]` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "acc" {
            return Ok(Probe::Accumulator);
        }
        let inner = lower
            .strip_prefix("mem[")
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| ExprError::UnknownProbe(s.trim().to_string()))?;
        let addr = inner
            .trim()
            .parse::<usize>()
            .map_err(|_| ExprError::BadAddress(inner.trim().to_string()))?;
        Ok(Probe::Memory(addr))
    }
}

/// Comparison operators for conditional breakpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl Comparison {
    /// Two-character operators come first so `>=` is not read as `>`.
    pub const ALL: [Comparison; 6] = [
        Comparison::Eq,
        Comparison::Ne,
        Comparison::Ge,
        Comparison::Le,
        Comparison::Gt,
        Comparison::Lt,
    ];

    pub const fn symbol(self) -> &'static str {
        match self {
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Gt => ">",
            Comparison::Lt => "<",
            Comparison::Ge => ">=",
            Comparison::Le => "<=",
        }
    }

    /// Apply `lhs <op> rhs`.
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Comparison::Eq => lhs == rhs,
            Comparison::Ne => lhs != rhs,
            Comparison::Gt => lhs > rhs,
            Comparison::Lt => lhs < rhs,
            Comparison::Ge => lhs >= rhs,
            Comparison::Le => lhs <= rhs,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Parse an integer literal: decimal, or balanced ternary with a `0t` prefix.
pub(crate) fn parse_value(s: &str) -> Result<i64, ExprError> {
    let s = s.trim();
    if let Some(digits) = s.strip_prefix("0t").or_else(|| s.strip_prefix("0T")) {
        return from_balanced_ternary(digits).map_err(|_| ExprError::BadValue(s.to_string()));
    }
    s.parse::<i64>().map_err(|_| ExprError::BadValue(s.to_string()))
}
