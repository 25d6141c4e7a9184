// src/worker/mod.rs

//! Worker processes: identity, shared services and the message loop.
//!
//! - [`slot`] holds the per-worker identity and scratch paths.
//! - [`adapter`] is the `Running → Terminated` message loop that turns
//!   `Work` messages into `Success`/`Bailed` reports.

pub mod adapter;
pub mod slot;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::WorkerConfig;
use crate::exec::Supervisor;
use crate::fs::{FileSystem, RealFileSystem};
use crate::killer::{CancellationCoordinator, Killer};
use crate::output::{Console, StdoutConsole};
use crate::protocol::{PlannerMessage, WorkerReport};

pub use adapter::{Worker, WorkerExit};
pub use slot::WorkerSlot;

/// Services every worker shares. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct SharedServices {
    pub fs: Arc<dyn FileSystem>,
    pub killer: Arc<dyn CancellationCoordinator>,
    pub console: Arc<dyn Console>,
}

impl SharedServices {
    /// Real filesystem, stdout console and a fresh killer.
    pub fn real() -> Self {
        Self {
            fs: Arc::new(RealFileSystem),
            killer: Arc::new(Killer::new()),
            console: Arc::new(StdoutConsole),
        }
    }
}

/// Build a production worker for slot `index`.
pub fn build_worker(
    index: usize,
    config: &WorkerConfig,
    services: SharedServices,
    work_rx: mpsc::Receiver<PlannerMessage>,
    report_tx: mpsc::Sender<WorkerReport>,
) -> Worker<Supervisor> {
    let slot = WorkerSlot::new(index, &config.tmp_dir);
    let killer = Arc::clone(&services.killer);
    let supervisor = Supervisor::new(slot.clone(), config.print_actions, services);
    Worker::new(slot, supervisor, killer, work_rx, report_tx)
}
