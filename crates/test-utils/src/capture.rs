use std::sync::{Arc, Mutex};

use buildworker::output::Console;

/// Console that records every printed block.
#[derive(Debug, Clone, Default)]
pub struct CaptureConsole {
    blocks: Arc<Mutex<Vec<String>>>,
}

impl CaptureConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> Vec<String> {
        self.blocks.lock().unwrap().clone()
    }

    /// Blocks that look like failure reports (non-test actions end with a
    /// `FAILED:` summary).
    pub fn failure_reports(&self) -> Vec<String> {
        self.blocks()
            .into_iter()
            .filter(|b| b.contains("FAILED: "))
            .collect()
    }
}

impl Console for CaptureConsole {
    fn print(&self, block: &str) {
        self.blocks.lock().unwrap().push(block.to_string());
    }
}
