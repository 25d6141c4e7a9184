#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use buildworker::config::{ActionEntry, WorkerConfig};
use buildworker::fs::RealFileSystem;
use buildworker::killer::{CancellationCoordinator, Killer};
use buildworker::protocol::{PlannerMessage, WorkItem};
use buildworker::worker::SharedServices;

use crate::capture::CaptureConsole;

/// Builder for `WorkItem`s / `Work` messages.
pub struct WorkBuilder {
    action: String,
    command: String,
    targets: Vec<PathBuf>,
}

impl WorkBuilder {
    pub fn new(action: &str, command: &str) -> Self {
        Self {
            action: action.to_string(),
            command: command.to_string(),
            targets: Vec::new(),
        }
    }

    pub fn target(mut self, path: impl AsRef<Path>) -> Self {
        self.targets.push(path.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> WorkItem {
        WorkItem {
            action: self.action,
            command: self.command,
            targets: self.targets,
        }
    }

    pub fn message(self) -> PlannerMessage {
        self.build().to_message()
    }

    pub fn entry(self) -> ActionEntry {
        ActionEntry {
            label: self.action,
            command: self.command,
            targets: self
                .targets
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Real filesystem, a fresh killer and a capturing console, with handles to
/// inspect the latter two.
pub struct TestServices {
    pub services: SharedServices,
    pub killer: Arc<Killer>,
    pub console: CaptureConsole,
}

impl TestServices {
    pub fn new() -> Self {
        let killer = Arc::new(Killer::new());
        let console = CaptureConsole::new();
        let services = SharedServices {
            fs: Arc::new(RealFileSystem),
            killer: Arc::clone(&killer) as Arc<dyn CancellationCoordinator>,
            console: Arc::new(console.clone()),
        };
        Self {
            services,
            killer,
            console,
        }
    }
}

impl Default for TestServices {
    fn default() -> Self {
        Self::new()
    }
}

pub fn worker_config(tmp_dir: &Path, workers: usize) -> WorkerConfig {
    WorkerConfig {
        workers,
        tmp_dir: tmp_dir.to_path_buf(),
        print_actions: false,
    }
}
