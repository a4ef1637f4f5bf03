//! Balanced ternary number system primitives.
//!
//! This module provides:
//! - [`Trit`] - A single balanced ternary digit (-1, 0, +1)
//! - The numeral codec converting machine words to and from digit strings

mod trit;
pub mod codec;

pub use trit::{Trit, ALT_MINUS};
pub use codec::{to_trits, to_balanced_ternary, from_balanced_ternary, validate_ternary, NumeralError};
