// src/exec/mod.rs

//! Action execution layer.
//!
//! - [`supervisor`] runs one classified action for one worker slot.
//! - [`child`] spawns a child process with captured output and waits for it
//!   while honouring kill requests from the coordinator.
//! - [`guard`] removes stale and partial targets.
//! - [`backend`] provides the `ExecutorBackend` trait the worker loop uses,
//!   so tests can substitute a scripted executor.

pub mod backend;
pub mod child;
pub mod guard;
pub mod supervisor;

pub use backend::{ActionSignal, ExecutorBackend};
pub use child::{run_captured, ExecutionOutcome};
pub use guard::ArtifactGuard;
pub use supervisor::Supervisor;
