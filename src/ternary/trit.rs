//! Single balanced ternary digit (trit).
//!
//! A trit holds one of three values: -1, 0, or +1. Program text spells them
//! with the glyphs below:
//! - `-` or `−` (U+2212) = -1
//! - `0` = 0
//! - `+` or `1` = +1

use std::fmt;
use serde::{Serialize, Deserialize};

/// The typographic minus sign accepted as an alternate spelling of `-`.
pub const ALT_MINUS: char = '\u{2212}';

/// A single balanced ternary digit.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum Trit {
    /// Negative (-1)
    N = -1,
    /// Zero (0)
    O = 0,
    /// Positive (+1)
    P = 1,
}

impl Trit {
    /// All possible trit values in order: N, O, P
    pub const ALL: [Trit; 3] = [Trit::N, Trit::O, Trit::P];

    /// Parse a digit glyph. Returns `None` for anything outside the
    /// three symbol classes.
    #[inline]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '-' | ALT_MINUS => Some(Trit::N),
            '0' => Some(Trit::O),
            '+' | '1' => Some(Trit::P),
            _ => None,
        }
    }

    /// The canonical glyph for this digit.
    #[inline]
    pub const fn to_char(self) -> char {
        match self {
            Trit::N => '-',
            Trit::O => '0',
            Trit::P => '+',
        }
    }

    /// Convert to integer value.
    #[inline]
    pub const fn to_i8(self) -> i8 {
        self as i8
    }

    /// Negate the trit (flip N ↔ P, O stays O).
    #[inline]
    pub const fn neg(self) -> Self {
        match self {
            Trit::N => Trit::P,
            Trit::O => Trit::O,
            Trit::P => Trit::N,
        }
    }

    /// Returns true if this trit is zero.
    #[inline]
    pub const fn is_zero(self) -> bool {
        matches!(self, Trit::O)
    }
}

impl Default for Trit {
    fn default() -> Self {
        Trit::O
    }
}

impl fmt::Debug for Trit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trit::N => write!(f, "N"),
            Trit::O => write!(f, "O"),
            Trit::P => write!(f, "P"),
        }
    }
}

impl fmt::Display for Trit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

impl std::ops::Neg for Trit {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Trit::neg(self)
    }
}

impl From<Trit> for i8 {
    fn from(trit: Trit) -> Self {
        trit.to_i8()
    }
}

impl TryFrom<char> for Trit {
    type Error = char;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        Trit::from_char(c).ok_or(c)
    }
}
