//! Debugger machinery layered over the VM.
//!
//! - [`Breakpoints`] - address breakpoints and conditional breakpoints
//! - [`Watches`] - live projections of the accumulator or memory
//! - [`History`] - bounded pre-step snapshots for stepping backwards
//!
//! Breakpoints and watches form the [`DebugConfig`], which outlives resets.
//! History is execution state and is cleared with it.

pub mod probe;
pub mod breakpoint;
pub mod watch;
pub mod history;

pub use probe::{Probe, Comparison};
pub use breakpoint::{Breakpoints, ConditionalBreakpoint};
pub use watch::{Watch, Watches, WatchValue};
pub use history::{History, HistoryEntry};

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Debugging configuration that survives `reset`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugConfig {
    pub breakpoints: Breakpoints,
    pub watches: Watches,
}

/// Errors from parsing breakpoint and watch expressions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("unknown location '{0}' (expected 'acc' or 'mem[N]')")]
    UnknownProbe(String),

    #[error("bad memory address '{0}'")]
    BadAddress(String),

    #[error("bad value '{0}'")]
    BadValue(String),

    #[error("missing comparison operator in '{0}'")]
    MissingOperator(String),
}
