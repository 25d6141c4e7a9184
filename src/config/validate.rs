// src/config/validate.rs

use crate::config::model::{ActionEntry, Manifest, RawManifest, WorkerConfig};
use crate::errors::{Result, WorkerError};
use crate::protocol::TARGET_DELIMITER;

impl TryFrom<RawManifest> for Manifest {
    type Error = WorkerError;

    fn try_from(raw: RawManifest) -> std::result::Result<Self, Self::Error> {
        validate_worker_config(&raw.worker)?;
        for action in raw.actions.iter() {
            validate_action(action)?;
        }
        Ok(Manifest::new_unchecked(raw.worker, raw.actions))
    }
}

/// Checks that apply to the worker settings alone. Also used after CLI
/// overrides have been applied.
pub fn validate_worker_config(cfg: &WorkerConfig) -> Result<()> {
    if cfg.workers == 0 {
        return Err(WorkerError::Configuration(
            "[worker].workers must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.tmp_dir.as_os_str().is_empty() {
        return Err(WorkerError::Configuration(
            "[worker].tmp_dir must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_action(action: &ActionEntry) -> Result<()> {
    if action.label.trim().is_empty() {
        return Err(WorkerError::Configuration(format!(
            "action with command '{}' has an empty label",
            action.command
        )));
    }
    if action.command.trim().is_empty() {
        return Err(WorkerError::Configuration(format!(
            "action '{}' has an empty command",
            action.label
        )));
    }
    if action.targets.is_empty() {
        return Err(WorkerError::Configuration(format!(
            "action '{}' must list at least one target",
            action.label
        )));
    }
    for target in action.targets.iter() {
        if target.is_empty() || target.contains(TARGET_DELIMITER) {
            return Err(WorkerError::Configuration(format!(
                "action '{}' has invalid target '{}'",
                action.label, target
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(toml_src: &str) -> RawManifest {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn defaults_apply_when_worker_section_missing() {
        let manifest = Manifest::try_from(raw(
            r#"
[[action]]
label = "a"
command = "DUMMY"
targets = ["a.out"]
"#,
        ))
        .unwrap();

        assert_eq!(manifest.worker.workers, 1);
        assert_eq!(manifest.worker.tmp_dir, std::path::PathBuf::from("tmp"));
        assert!(!manifest.worker.print_actions);
        assert_eq!(manifest.actions.len(), 1);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = Manifest::try_from(raw("[worker]\nworkers = 0\n")).unwrap_err();
        assert!(matches!(err, WorkerError::Configuration(msg) if msg.contains("workers")));
    }

    #[test]
    fn action_without_targets_is_rejected() {
        let err = Manifest::try_from(raw(
            r#"
[[action]]
label = "a"
command = "DUMMY"
targets = []
"#,
        ))
        .unwrap_err();
        assert!(matches!(err, WorkerError::Configuration(msg) if msg.contains("at least one target")));
    }

    #[test]
    fn target_containing_delimiter_is_rejected() {
        let err = Manifest::try_from(raw(
            r#"
[[action]]
label = "a"
command = "DUMMY"
targets = ["x|y"]
"#,
        ))
        .unwrap_err();
        assert!(matches!(err, WorkerError::Configuration(msg) if msg.contains("x|y")));
    }
}
