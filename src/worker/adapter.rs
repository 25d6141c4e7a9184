// src/worker/adapter.rs

//! The worker message loop.
//!
//! `Running`: receive one `Work`, execute it, report `Success`, repeat.
//! `Terminated` is entered when the planner closes the channel, when an
//! action fails, or on any other error. Whichever way the loop ends, exactly
//! one `Bailed` is sent afterwards.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::errors::{Result, WorkerError};
use crate::exec::{ActionSignal, ExecutorBackend};
use crate::killer::CancellationCoordinator;
use crate::protocol::{PlannerMessage, WorkItem, WorkerMessage, WorkerReport};
use crate::worker::WorkerSlot;

/// Why a worker stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// The planner closed the work channel (or stopped listening).
    ChannelClosed,
    /// This worker's own action failed.
    ActionFailed { action: String },
    /// An unclassified error ended the loop.
    Unexpected { action: String },
}

pub struct Worker<E: ExecutorBackend> {
    slot: WorkerSlot,
    executor: E,
    killer: Arc<dyn CancellationCoordinator>,
    work_rx: mpsc::Receiver<PlannerMessage>,
    report_tx: mpsc::Sender<WorkerReport>,
}

impl<E: ExecutorBackend> fmt::Debug for Worker<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Worker<E> {
    pub fn new(
        slot: WorkerSlot,
        executor: E,
        killer: Arc<dyn CancellationCoordinator>,
        work_rx: mpsc::Receiver<PlannerMessage>,
        report_tx: mpsc::Sender<WorkerReport>,
    ) -> Self {
        Self {
            slot,
            executor,
            killer,
            work_rx,
            report_tx,
        }
    }

    /// Run until terminated, then send the single `Bailed`.
    ///
    /// Configuration errors are returned as `Err` so the caller can stop the
    /// whole program; `Bailed` has been sent by then.
    pub async fn run(mut self) -> Result<WorkerExit> {
        info!(worker = %self.slot.name, "worker started");

        let exit = self.serve().await;
        self.send(WorkerMessage::Bailed).await;

        match &exit {
            Ok(reason) => info!(worker = %self.slot.name, ?reason, "worker terminated"),
            Err(e) => error!(worker = %self.slot.name, error = %e, "worker terminated by fatal error"),
        }
        exit
    }

    async fn serve(&mut self) -> Result<WorkerExit> {
        loop {
            let Some(msg) = self.work_rx.recv().await else {
                debug!(worker = %self.slot.name, "work channel closed");
                return Ok(WorkerExit::ChannelClosed);
            };
            let item = WorkItem::from_message(msg);

            match self.executor.execute(&item).await {
                Ok(ActionSignal::Built) => {
                    let success = WorkerMessage::Success {
                        action: item.action.clone(),
                    };
                    if !self.send(success).await {
                        return Ok(WorkerExit::ChannelClosed);
                    }
                }
                Ok(ActionSignal::Bail) => {
                    return Ok(WorkerExit::ActionFailed {
                        action: item.action,
                    });
                }
                Err(e) if e.is_fatal() => {
                    self.killer.bail();
                    return Err(e);
                }
                Err(e) => {
                    error!(
                        worker = %self.slot.name,
                        action = %item.action,
                        error = %format!("{e:#}"),
                        "unexpected error while executing action"
                    );
                    self.killer.bail();
                    return Ok(WorkerExit::Unexpected {
                        action: item.action,
                    });
                }
            }
        }
    }

    /// Returns false if the planner is gone.
    async fn send(&mut self, message: WorkerMessage) -> bool {
        let report = WorkerReport {
            worker: self.slot.index,
            message,
        };
        match self.report_tx.send(report).await {
            Ok(()) => true,
            Err(e) => {
                debug!(worker = %self.slot.name, message = ?e.0.message, "planner no longer listening");
                false
            }
        }
    }
}

/// Map a join failure of a worker task onto the crate error.
pub fn join_error(worker: usize, err: tokio::task::JoinError) -> WorkerError {
    WorkerError::Other(anyhow::anyhow!("worker{worker} task failed: {err}"))
}
