// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `buildworker`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "buildworker",
    version,
    about = "Execute a pre-ordered stream of build actions on a pool of workers.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the build manifest (TOML).
    #[arg(long, value_name = "PATH", default_value = "Buildworker.toml")]
    pub config: PathBuf,

    /// Number of concurrent workers (overrides `[worker].workers`).
    #[arg(long, short = 'j', value_name = "N")]
    pub workers: Option<usize>,

    /// Scratch directory for per-worker results files and test directories
    /// (overrides `[worker].tmp_dir`).
    #[arg(long, value_name = "DIR")]
    pub tmp_dir: Option<PathBuf>,

    /// Echo each action label, its resolved command line, and the output of
    /// successful non-test actions.
    #[arg(long)]
    pub print_actions: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDWORKER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print how every action would be classified, but
    /// don't execute anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
