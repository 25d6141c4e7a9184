// src/output.rs

//! User-facing build output (echoed actions, diagnostics).
//!
//! Kept separate from `tracing`: logs go to stderr, this goes to stdout.

use std::fmt::Debug;
use std::io::Write;

use tracing::warn;

/// Sink for user-facing text. One `print` call is one uninterrupted block.
pub trait Console: Send + Sync + Debug {
    fn print(&self, block: &str);
}

#[derive(Debug, Clone, Default)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn print(&self, block: &str) {
        let mut out = std::io::stdout().lock();
        let res = out.write_all(block.as_bytes()).and_then(|_| out.flush());
        if let Err(e) = res {
            warn!(error = %e, "failed to write to stdout");
        }
    }
}
