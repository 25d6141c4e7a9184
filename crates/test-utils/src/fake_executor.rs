use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use buildworker::errors::{Result, WorkerError};
use buildworker::exec::{ActionSignal, ExecutorBackend};
use buildworker::protocol::WorkItem;

/// Scripted result for one call to `execute`.
#[derive(Debug)]
pub enum Scripted {
    Built,
    Bail,
    Fatal(String),
    Unexpected(String),
}

/// A fake executor that:
/// - records which actions were "run"
/// - answers each call with the next scripted result (default: `Built`).
#[derive(Debug, Clone, Default)]
pub struct ScriptedExecutor {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl ScriptedExecutor {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            executed: Arc::default(),
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl ExecutorBackend for ScriptedExecutor {
    fn execute<'a>(
        &'a mut self,
        item: &'a WorkItem,
    ) -> Pin<Box<dyn Future<Output = Result<ActionSignal>> + Send + 'a>> {
        self.executed.lock().unwrap().push(item.action.clone());
        let next = self.script.lock().unwrap().pop_front().unwrap_or(Scripted::Built);

        Box::pin(async move {
            match next {
                Scripted::Built => Ok(ActionSignal::Built),
                Scripted::Bail => Ok(ActionSignal::Bail),
                Scripted::Fatal(msg) => Err(WorkerError::Configuration(msg)),
                Scripted::Unexpected(msg) => Err(WorkerError::Other(anyhow::anyhow!(msg))),
            }
        })
    }
}
