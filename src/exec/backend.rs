// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The worker loop talks to an `ExecutorBackend` instead of the supervisor
//! directly, so protocol tests can script outcomes without spawning
//! processes. [`Supervisor`](super::Supervisor) is the production backend.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::protocol::WorkItem;

/// What the worker loop should do after one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionSignal {
    /// The action succeeded; report it and wait for more work.
    Built,
    /// The action failed and the bail has been arbitrated; stop.
    Bail,
}

/// Trait abstracting how a single work item is executed.
///
/// `Err` is reserved for configuration errors and unexpected failures;
/// ordinary action failures come back as `Ok(ActionSignal::Bail)`.
pub trait ExecutorBackend: Send {
    fn execute<'a>(
        &'a mut self,
        item: &'a WorkItem,
    ) -> Pin<Box<dyn Future<Output = Result<ActionSignal>> + Send + 'a>>;
}
