// src/exec/child.rs

//! Spawn one child process with its output captured to a file, and wait for
//! it while listening for a kill request from the cancellation coordinator.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::killer::{CancellationCoordinator, ChildHandle};

/// Result of one spawned attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub succeeded: bool,
    /// File holding the child's combined stdout/stderr.
    pub captured_output: PathBuf,
}

#[derive(Debug)]
enum ChildExit {
    Exited(ExitStatus),
    Killed,
}

/// Run `argv` with stdin inherited and stdout+stderr truncated into
/// `results`.
///
/// The child is registered with `killer` under `worker` for the whole wait.
/// Spawn or wait errors count as failure; the error text is appended to the
/// results file so it shows up in diagnostics.
pub async fn run_captured(
    argv: &[String],
    results: &Path,
    worker: &str,
    killer: &dyn CancellationCoordinator,
) -> ExecutionOutcome {
    let succeeded = match spawn_and_wait(argv, results, worker, killer).await {
        Ok(ChildExit::Exited(status)) => {
            info!(
                worker,
                exit_code = status.code().unwrap_or(-1),
                success = status.success(),
                "child process exited"
            );
            status.success()
        }
        Ok(ChildExit::Killed) => false,
        Err(err) => {
            error!(worker, error = %format!("{err:#}"), "child process execution error");
            record_error(results, &err);
            false
        }
    };

    ExecutionOutcome {
        succeeded,
        captured_output: results.to_path_buf(),
    }
}

async fn spawn_and_wait(
    argv: &[String],
    results: &Path,
    worker: &str,
    killer: &dyn CancellationCoordinator,
) -> Result<ChildExit> {
    let (program, args) = argv.split_first().context("empty argument vector")?;

    if let Some(parent) = results.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating dir {:?}", parent))?;
        }
    }
    let stdout = File::create(results).with_context(|| format!("creating file {:?}", results))?;
    let stderr = stdout
        .try_clone()
        .with_context(|| format!("duplicating handle for {:?}", results))?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .kill_on_drop(true);

    info!(worker, cmd = %argv.join(" "), "starting child process");
    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning '{program}'"))?;

    let (handle, mut kill_signal) = ChildHandle::new();
    let id = handle.id();
    killer.launched(worker, handle);

    // A dropped kill sender only disables the second branch.
    let exit = tokio::select! {
        status = child.wait() => {
            status
                .with_context(|| format!("waiting for '{program}'"))
                .map(ChildExit::Exited)
        }
        Ok(()) = &mut kill_signal => {
            info!(worker, "kill requested by coordinator; killing child process");
            if let Err(e) = child.kill().await {
                warn!(worker, error = %e, "failed to kill child process");
            }
            Ok(ChildExit::Killed)
        }
    };

    killer.completed(worker, id);
    exit
}

fn record_error(results: &Path, err: &anyhow::Error) {
    let res = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(results)
        .and_then(|mut f| writeln!(f, "error: {err:#}"));
    if let Err(e) = res {
        warn!(path = %results.display(), error = %e, "could not record error in results file");
    }
}
