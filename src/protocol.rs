// src/protocol.rs

//! Messages exchanged between the planner and its workers.
//!
//! Each worker owns one receiving end for [`PlannerMessage`]s and a sender
//! for [`WorkerReport`]s. A worker sends any number of `Success` messages
//! followed by exactly one `Bailed`.

use std::path::{Path, PathBuf};

/// Separator used to join target paths in a `Work` message.
pub const TARGET_DELIMITER: char = '|';

/// Planner → worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannerMessage {
    Work {
        action: String,
        command: String,
        /// One or more output paths joined by `|`.
        targets: String,
    },
}

/// Worker → planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerMessage {
    Success { action: String },
    Bailed,
}

/// A [`WorkerMessage`] tagged with the index of the worker that sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker: usize,
    pub message: WorkerMessage,
}

/// One unit of build work, as received by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub action: String,
    pub command: String,
    pub targets: Vec<PathBuf>,
}

impl WorkItem {
    pub fn new(
        action: impl Into<String>,
        command: impl Into<String>,
        targets: impl IntoIterator<Item = impl Into<PathBuf>>,
    ) -> Self {
        Self {
            action: action.into(),
            command: command.into(),
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_message(msg: PlannerMessage) -> Self {
        match msg {
            PlannerMessage::Work {
                action,
                command,
                targets,
            } => Self {
                action,
                command,
                targets: split_targets(&targets),
            },
        }
    }

    pub fn to_message(&self) -> PlannerMessage {
        PlannerMessage::Work {
            action: self.action.clone(),
            command: self.command.clone(),
            targets: join_targets(self.targets.as_slice()),
        }
    }
}

/// Split a `|`-joined target field into paths, dropping empty segments.
pub fn split_targets(field: &str) -> Vec<PathBuf> {
    field
        .split(TARGET_DELIMITER)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

pub fn join_targets<P: AsRef<Path>>(targets: &[P]) -> String {
    targets
        .iter()
        .map(|p| p.as_ref().to_string_lossy())
        .collect::<Vec<_>>()
        .join(&TARGET_DELIMITER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_drops_empty_segments() {
        assert_eq!(
            split_targets("a.o||b/c.o|"),
            vec![PathBuf::from("a.o"), PathBuf::from("b/c.o")]
        );
        assert!(split_targets("").is_empty());
    }

    #[test]
    fn work_message_keeps_target_order() {
        let item = WorkItem::from_message(PlannerMessage::Work {
            action: "link".into(),
            command: "ld -o app a.o".into(),
            targets: "app|app.map".into(),
        });
        assert_eq!(item.targets, vec![PathBuf::from("app"), PathBuf::from("app.map")]);
        assert_eq!(item.to_message(), PlannerMessage::Work {
            action: "link".into(),
            command: "ld -o app a.o".into(),
            targets: "app|app.map".into(),
        });
    }
}
