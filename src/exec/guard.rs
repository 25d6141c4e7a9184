// src/exec/guard.rs

//! Artifact guard: no stale or partial target survives an attempt.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::Result;
use crate::fs::FileSystem;

#[derive(Debug, Clone)]
pub struct ArtifactGuard {
    fs: Arc<dyn FileSystem>,
}

impl ArtifactGuard {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Delete every target before an attempt.
    ///
    /// Errors propagate: if a stale target cannot be removed the attempt must
    /// not start.
    pub fn prepare(&self, targets: &[PathBuf]) -> Result<()> {
        for target in targets {
            if self.fs.remove_file_if_exists(target)? {
                debug!(target = %target.display(), "removed stale target");
            }
        }
        Ok(())
    }

    /// Delete every target after a failed attempt.
    ///
    /// Best effort: every target is tried, failures are logged. Returns the
    /// number of targets that could not be removed.
    pub fn discard(&self, targets: &[PathBuf]) -> usize {
        let mut failed = 0;
        for target in targets {
            match self.fs.remove_file_if_exists(target) {
                Ok(true) => debug!(target = %target.display(), "removed partial target"),
                Ok(false) => {}
                Err(e) => {
                    failed += 1;
                    warn!(target = %target.display(), error = %e, "failed to remove target after failure");
                }
            }
        }
        failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn prepare_removes_existing_targets_only() {
        let fs = MockFileSystem::new();
        fs.add_file("out/a.o", "stale");
        let guard = ArtifactGuard::new(Arc::new(fs.clone()));

        guard
            .prepare(&[PathBuf::from("out/a.o"), PathBuf::from("out/b.o")])
            .unwrap();

        assert!(!fs.exists(std::path::Path::new("out/a.o")));
    }

    #[test]
    fn prepare_fails_when_target_is_a_directory() {
        let fs = MockFileSystem::new();
        fs.add_dir("out");
        let guard = ArtifactGuard::new(Arc::new(fs));
        assert!(guard.prepare(&[PathBuf::from("out")]).is_err());
    }

    #[test]
    fn discard_keeps_going_after_an_error() {
        let fs = MockFileSystem::new();
        fs.add_dir("weird");
        fs.add_file("b.o", "partial");
        let guard = ArtifactGuard::new(Arc::new(fs.clone()));

        let failed = guard.discard(&[PathBuf::from("weird"), PathBuf::from("b.o")]);

        assert_eq!(failed, 1);
        assert!(!fs.exists(std::path::Path::new("b.o")));
    }
}
