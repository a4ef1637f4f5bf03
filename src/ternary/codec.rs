//! Conversion between integers and balanced ternary digit strings.
//!
//! Strings are written most significant digit first, e.g. `+-0` = 9 - 3 + 0 = 6.

use crate::ternary::Trit;
use thiserror::Error;

/// Errors produced while reading a balanced ternary string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumeralError {
    #[error("invalid ternary digit '{ch}' at position {position}")]
    InvalidDigit { ch: char, position: usize },

    #[error("ternary value '{0}' does not fit in a machine word")]
    Overflow(String),
}

/// Digits of `n`, most significant first. Zero yields a single `O` digit.
pub fn to_trits(n: i64) -> Vec<Trit> {
    if n == 0 {
        return vec![Trit::O];
    }

    // Work on the magnitude in u128 so that i64::MIN has a representation.
    let mut value = n.unsigned_abs() as u128;
    let mut trits = Vec::new();
    while value > 0 {
        let (trit, carry) = match value % 3 {
            0 => (Trit::O, 0),
            1 => (Trit::P, 0),
            _ => (Trit::N, 1),
        };
        trits.push(trit);
        value = value / 3 + carry;
    }

    if n < 0 {
        for t in &mut trits {
            *t = t.neg();
        }
    }
    trits.reverse();
    trits
}

/// Render `n` as its minimal balanced ternary string.
pub fn to_balanced_ternary(n: i64) -> String {
    to_trits(n).into_iter().map(Trit::to_char).collect()
}

/// Parse a balanced ternary string.
///
/// Accepts `-`/`−` for -1, `0` for 0 and `+`/`1` for +1. The empty string is 0.
pub fn from_balanced_ternary(s: &str) -> Result<i64, NumeralError> {
    let overflow = || NumeralError::Overflow(s.to_string());
    let trits = s
        .chars()
        .enumerate()
        .map(|(position, ch)| Trit::from_char(ch).ok_or(NumeralError::InvalidDigit { ch, position }))
        .collect::<Result<Vec<_>, _>>()?;

    // i64 extremes need 41 digits whose top place value exceeds i64, so
    // accumulate wide and narrow at the end.
    let mut result: i128 = 0;
    let mut power: Option<i128> = Some(1);

    for trit in trits.into_iter().rev() {
        if !trit.is_zero() {
            let place = power.ok_or_else(overflow)?;
            result = result
                .checked_add(trit.to_i8() as i128 * place)
                .ok_or_else(overflow)?;
        }
        power = power.and_then(|p| p.checked_mul(3));
    }

    i64::try_from(result).map_err(|_| overflow())
}

/// True if `s` contains only whitespace and ternary digit glyphs.
pub fn validate_ternary(s: &str) -> bool {
    s.chars().all(|c| c.is_whitespace() || Trit::from_char(c).is_some())
}
