//! TUI debugger for the ternary VM.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register view with trit coloring
//! - Memory view with protection markers and an access heat map
//! - Step/step-back/run/breakpoint controls
//! - Watch and conditional breakpoint panel

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
