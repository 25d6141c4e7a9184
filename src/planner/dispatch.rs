// src/planner/dispatch.rs

use std::collections::VecDeque;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{ActionEntry, WorkerConfig};
use crate::config::validate::validate_worker_config;
use crate::errors::Result;
use crate::protocol::{join_targets, PlannerMessage, WorkerMessage, WorkerReport};
use crate::worker::adapter::join_error;
use crate::worker::{build_worker, SharedServices, WorkerExit};

/// What happened to a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Labels of successful actions, in completion order.
    pub built: Vec<String>,
    /// Whether some worker bailed while it still had work.
    pub failed: bool,
}

struct WorkerHandle {
    work_tx: Option<mpsc::Sender<PlannerMessage>>,
    current: Option<String>,
    join: JoinHandle<Result<WorkerExit>>,
}

/// Run `actions` on `config.workers` workers and wait for all of them to
/// bail.
pub async fn run_build(
    actions: Vec<ActionEntry>,
    config: &WorkerConfig,
    services: SharedServices,
) -> Result<BuildSummary> {
    validate_worker_config(config)?;
    std::fs::create_dir_all(&config.tmp_dir)?;

    let (report_tx, mut report_rx) = mpsc::channel::<WorkerReport>(config.workers * 2);
    let mut workers: Vec<WorkerHandle> = (0..config.workers)
        .map(|index| {
            let (work_tx, work_rx) = mpsc::channel::<PlannerMessage>(1);
            let worker = build_worker(index, config, services.clone(), work_rx, report_tx.clone());
            WorkerHandle {
                work_tx: Some(work_tx),
                current: None,
                join: tokio::spawn(worker.run()),
            }
        })
        .collect();
    drop(report_tx);

    info!(workers = workers.len(), actions = actions.len(), "build started");

    let mut pending: VecDeque<ActionEntry> = actions.into();
    let mut idle: VecDeque<usize> = (0..workers.len()).collect();
    let mut summary = BuildSummary::default();

    loop {
        if !summary.failed {
            dispatch_ready(&mut workers, &mut idle, &mut pending, &mut summary).await;
        }

        let all_idle = workers.iter().all(|w| w.current.is_none());
        if summary.failed || (pending.is_empty() && all_idle) {
            // Closing the work channels lets every remaining worker bail.
            for w in workers.iter_mut() {
                w.work_tx = None;
            }
        }

        let Some(report) = report_rx.recv().await else {
            break;
        };
        let handle = &mut workers[report.worker];
        match report.message {
            WorkerMessage::Success { action } => {
                debug!(worker = report.worker, %action, "action built");
                handle.current = None;
                summary.built.push(action);
                idle.push_back(report.worker);
            }
            WorkerMessage::Bailed => {
                if let Some(action) = handle.current.take() {
                    warn!(worker = report.worker, %action, "worker bailed with work in flight");
                    summary.failed = true;
                }
                handle.work_tx = None;
                idle.retain(|&i| i != report.worker);
            }
        }
    }

    let mut fatal = None;
    for (index, w) in workers.into_iter().enumerate() {
        match w.join.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                fatal.get_or_insert(e);
            }
            Err(e) => {
                fatal.get_or_insert(join_error(index, e));
            }
        }
    }
    if let Some(e) = fatal {
        return Err(e);
    }

    info!(built = summary.built.len(), failed = summary.failed, "build finished");
    Ok(summary)
}

async fn dispatch_ready(
    workers: &mut [WorkerHandle],
    idle: &mut VecDeque<usize>,
    pending: &mut VecDeque<ActionEntry>,
    summary: &mut BuildSummary,
) {
    while !pending.is_empty() {
        let Some(index) = idle.pop_front() else {
            return;
        };
        let handle = &mut workers[index];
        let Some(tx) = handle.work_tx.as_ref() else {
            continue;
        };
        let Some(action) = pending.pop_front() else {
            return;
        };

        let msg = PlannerMessage::Work {
            action: action.label.clone(),
            command: action.command.clone(),
            targets: join_targets(action.targets.as_slice()),
        };
        if tx.send(msg).await.is_err() {
            warn!(worker = index, action = %action.label, "worker gone before dispatch");
            summary.failed = true;
            return;
        }
        debug!(worker = index, action = %action.label, "dispatched");
        handle.current = Some(action.label);
    }
}
