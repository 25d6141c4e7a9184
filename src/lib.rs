// src/lib.rs

pub mod action;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod killer;
pub mod logging;
pub mod output;
pub mod planner;
pub mod protocol;
pub mod report;
pub mod worker;

use tracing::{debug, info};

use crate::action::classify;
use crate::cli::CliArgs;
use crate::config::validate::validate_worker_config;
use crate::config::{load_and_validate, Manifest, WorkerConfig};
use crate::errors::Result;
use crate::planner::{run_build, BuildSummary};
use crate::worker::{SharedServices, WorkerSlot};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - manifest loading + CLI overrides
/// - the shared killer, console and filesystem
/// - the worker pool and the dispatching planner
pub async fn run(args: CliArgs) -> Result<BuildSummary> {
    let manifest = load_and_validate(&args.config)?;
    let config = apply_overrides(manifest.worker.clone(), &args);
    validate_worker_config(&config)?;

    if args.dry_run {
        print_dry_run(&manifest, &config);
        return Ok(BuildSummary::default());
    }

    info!(
        manifest = %args.config.display(),
        workers = config.workers,
        tmp_dir = %config.tmp_dir.display(),
        "starting build"
    );
    run_build(manifest.actions, &config, SharedServices::real()).await
}

fn apply_overrides(mut config: WorkerConfig, args: &CliArgs) -> WorkerConfig {
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(ref tmp_dir) = args.tmp_dir {
        config.tmp_dir = tmp_dir.clone();
    }
    config.print_actions |= args.print_actions;
    config
}

/// Dry-run output: worker settings and how each action classifies.
fn print_dry_run(manifest: &Manifest, config: &WorkerConfig) {
    println!("buildworker dry-run");
    println!("  worker.workers = {}", config.workers);
    println!("  worker.tmp_dir = {}", config.tmp_dir.display());
    println!("  worker.print_actions = {}", config.print_actions);
    println!();

    // Classification depends on the slot only through the test dir.
    let slot = WorkerSlot::new(0, &config.tmp_dir);

    println!("actions ({}):", manifest.actions.len());
    for action in manifest.actions.iter() {
        println!("  - {}", action.label);
        match classify(&action.command, &slot.test_dir) {
            Ok(kind) => println!("      runs: {kind}"),
            Err(e) => println!("      invalid: {e}"),
        }
        println!("      targets: {:?}", action.targets);
    }

    debug!("dry-run complete (no execution)");
}
