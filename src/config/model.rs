// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level build manifest as read from a TOML file.
///
/// ```toml
/// [worker]
/// workers = 2
/// tmp_dir = "tmp"
/// print_actions = true
///
/// [[action]]
/// label = "compile foo"
/// command = "cc -c foo.c -o foo.o"
/// targets = ["foo.o"]
/// ```
///
/// The `[[action]]` list is consumed in file order; it is expected to be
/// a valid build order already.
#[derive(Debug, Clone, Deserialize)]
pub struct RawManifest {
    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default, rename = "action")]
    pub actions: Vec<ActionEntry>,
}

/// Validated manifest. Only constructed through `TryFrom<RawManifest>`.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub worker: WorkerConfig,
    pub actions: Vec<ActionEntry>,
}

impl Manifest {
    pub(crate) fn new_unchecked(worker: WorkerConfig, actions: Vec<ActionEntry>) -> Self {
        Self { worker, actions }
    }
}

/// `[worker]` section: settings shared by every worker in the pool.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Number of concurrent workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Directory holding `worker<i>` results files and `worker<i>-test`
    /// scratch directories.
    #[serde(default = "default_tmp_dir")]
    pub tmp_dir: PathBuf,

    /// Echo action labels, resolved command lines and the output of
    /// successful non-test actions.
    #[serde(default)]
    pub print_actions: bool,
}

fn default_workers() -> usize {
    1
}

fn default_tmp_dir() -> PathBuf {
    PathBuf::from("tmp")
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            tmp_dir: default_tmp_dir(),
            print_actions: false,
        }
    }
}

/// One `[[action]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionEntry {
    /// Human-readable label reported back on success.
    pub label: String,

    /// Raw instruction in the action mini-language
    /// (`DUMMY`, `COPY a b`, `TEST cmd...`, or a plain command line).
    pub command: String,

    /// Output paths this action is expected to produce.
    pub targets: Vec<String>,
}
