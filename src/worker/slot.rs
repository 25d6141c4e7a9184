// src/worker/slot.rs

use std::path::{Path, PathBuf};

/// A worker's identity and its private scratch paths.
///
/// Everything is keyed by `index`, so concurrent workers never touch the
/// same scratch file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSlot {
    pub index: usize,
    pub name: String,
    /// Combined stdout/stderr of the current child: `<tmp>/worker<i>`.
    pub results_path: PathBuf,
    /// Scratch directory handed to test binaries: `<tmp>/worker<i>-test`.
    pub test_dir: PathBuf,
}

impl WorkerSlot {
    pub fn new(index: usize, tmp_dir: &Path) -> Self {
        let name = format!("worker{index}");
        Self {
            index,
            results_path: tmp_dir.join(&name),
            test_dir: tmp_dir.join(format!("{name}-test")),
            name,
        }
    }
}
