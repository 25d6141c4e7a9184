// src/planner/mod.rs

//! Minimal planner used by the `buildworker` binary.
//!
//! It does not order anything: manifest actions are handed out in file
//! order, one at a time per worker, to whichever worker is idle.

pub mod dispatch;

pub use dispatch::{run_build, BuildSummary};
