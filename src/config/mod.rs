// src/config/mod.rs

//! Configuration loading and validation for buildworker.
//!
//! Responsibilities:
//! - Define the TOML-backed manifest model (`model.rs`).
//! - Load a manifest from disk (`loader.rs`).
//! - Validate basic invariants like non-empty target lists (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ActionEntry, Manifest, RawManifest, WorkerConfig};
