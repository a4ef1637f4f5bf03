//! Program loader.
//!
//! Program text is a whitespace-separated list of balanced ternary tokens.
//! Token `i` becomes memory word `i`.

use crate::ternary::{from_balanced_ternary, validate_ternary, NumeralError};
use thiserror::Error;

/// Parse program text into memory words.
///
/// Stops at the first bad token. Empty text yields no words.
pub fn parse_program(text: &str) -> Result<Vec<i64>, LoadError> {
    text.split_whitespace()
        .enumerate()
        .map(|(index, token)| parse_token(index, token))
        .collect()
}

fn parse_token(index: usize, token: &str) -> Result<i64, LoadError> {
    if !validate_ternary(token) {
        return Err(LoadError::InvalidToken { index, token: token.to_string() });
    }
    from_balanced_ternary(token).map_err(|source| LoadError::Numeral {
        index,
        token: token.to_string(),
        source,
    })
}

/// Errors that can occur while loading program text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("invalid ternary at token {index}: '{token}'")]
    InvalidToken { index: usize, token: String },

    #[error("bad value at token {index} ('{token}'): {source}")]
    Numeral {
        index: usize,
        token: String,
        #[source]
        source: NumeralError,
    },
}

impl LoadError {
    /// Zero-based index of the offending token.
    pub fn index(&self) -> usize {
        match self {
            LoadError::InvalidToken { index, .. } | LoadError::Numeral { index, .. } => *index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        assert_eq!(parse_program("+ +0 + - 0").unwrap(), vec![1, 3, 1, -1, 0]);
    }

    #[test]
    fn test_parse_mixed_whitespace() {
        assert_eq!(parse_program("  +-0\n\t-+0 \r\n 10 ").unwrap(), vec![6, -6, 3]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_program("").unwrap().is_empty());
        assert!(parse_program(" \n ").unwrap().is_empty());
    }

    #[test]
    fn test_first_bad_token_wins() {
        let err = parse_program("+ +2 x").unwrap_err();
        assert_eq!(err, LoadError::InvalidToken { index: 1, token: "+2".into() });
        assert_eq!(err.index(), 1);
        assert_eq!(err.to_string(), "invalid ternary at token 1: '+2'");
    }

    #[test]
    fn test_overflowing_token() {
        let text = format!("0 {}", "+".repeat(50));
        let err = parse_program(&text).unwrap_err();
        assert!(matches!(err, LoadError::Numeral { index: 1, .. }));
    }
}
