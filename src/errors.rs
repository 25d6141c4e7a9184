// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    /// Malformed action or manifest. Fatal to the whole run, never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WorkerError {
    /// Whether this error must stop the whole program rather than just the
    /// worker that hit it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WorkerError::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, WorkerError>;
