// src/report/mod.rs

//! Failure diagnostics.
//!
//! - [`demangle`] finds quoted mangled symbols in tool output.
//! - [`diagnostics`] renders and prints the single failure report.

pub mod demangle;
pub mod diagnostics;

pub use demangle::{demangle_symbol, mangled_tokens};
pub use diagnostics::{render_failure, DiagnosticsReporter};
