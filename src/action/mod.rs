// src/action/mod.rs

//! Action classification.
//!
//! A raw instruction string is turned into an [`ActionKind`] by a pure
//! function of its prefix. See [`classify`].

pub mod classify;

use std::fmt;
use std::path::PathBuf;

pub use classify::{classify, split_command, TEST_TMP_FLAG};

/// What a work item asks the worker to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Write placeholder content to the target. No process.
    Dummy,
    /// In-process file copy.
    Copy { from: PathBuf, to: PathBuf },
    /// Test binary invocation; `argv` already carries the `--tmp=` flag.
    Test { argv: Vec<String> },
    /// Any other executable invocation.
    Generic { argv: Vec<String> },
}

impl ActionKind {
    pub fn is_test(&self) -> bool {
        matches!(self, ActionKind::Test { .. })
    }

    pub fn argv(&self) -> Option<&[String]> {
        match self {
            ActionKind::Test { argv } | ActionKind::Generic { argv } => Some(argv),
            _ => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Dummy => write!(f, "DUMMY"),
            ActionKind::Copy { from, to } => {
                write!(f, "COPY {} {}", from.display(), to.display())
            }
            ActionKind::Test { argv } => write!(f, "TEST {}", argv.join(" ")),
            ActionKind::Generic { argv } => write!(f, "{}", argv.join(" ")),
        }
    }
}
