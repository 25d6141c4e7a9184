// src/action/classify.rs

use std::path::Path;

use crate::action::ActionKind;
use crate::errors::{Result, WorkerError};

const DUMMY: &str = "DUMMY";
const COPY_PREFIX: &str = "COPY ";
const TEST_PREFIX: &str = "TEST ";

/// Flag appended to every test invocation, pointing at the worker's private
/// test scratch directory.
pub const TEST_TMP_FLAG: &str = "--tmp=";

/// Classify a raw instruction.
///
/// Rules, first match wins:
/// - exactly `DUMMY` → [`ActionKind::Dummy`]
/// - `COPY <src> <dst>` → [`ActionKind::Copy`]; any other token count is a
///   configuration error
/// - `TEST <cmd...>` → [`ActionKind::Test`] with `--tmp=<test_dir>` appended
/// - anything else → [`ActionKind::Generic`]
///
/// A `TEST` with nothing after the prefix, or a blank command, still
/// classifies; it fails later at spawn like any other missing program.
///
/// Commands are split on whitespace only. There is no quoting or escaping.
pub fn classify(command: &str, test_dir: &Path) -> Result<ActionKind> {
    if command == DUMMY {
        return Ok(ActionKind::Dummy);
    }

    if let Some(rest) = command.strip_prefix(COPY_PREFIX) {
        let args = split_command(rest);
        return match args.as_slice() {
            [from, to] => Ok(ActionKind::Copy {
                from: from.into(),
                to: to.into(),
            }),
            _ => Err(WorkerError::Configuration(format!(
                "COPY expects exactly 2 arguments, got {}: '{}'",
                args.len(),
                command
            ))),
        };
    }

    if let Some(rest) = command.strip_prefix(TEST_PREFIX) {
        let mut argv = split_command(rest);
        argv.push(format!("{TEST_TMP_FLAG}{}", test_dir.display()));
        return Ok(ActionKind::Test { argv });
    }

    Ok(ActionKind::Generic {
        argv: split_command(command),
    })
}

/// Whitespace split into an argument vector.
pub fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_dir() -> PathBuf {
        PathBuf::from("tmp/worker3-test")
    }

    #[test]
    fn dummy_must_match_exactly() {
        assert_eq!(classify("DUMMY", &test_dir()).unwrap(), ActionKind::Dummy);
        assert_eq!(
            classify("DUMMY extra", &test_dir()).unwrap(),
            ActionKind::Generic {
                argv: vec!["DUMMY".into(), "extra".into()]
            }
        );
    }

    #[test]
    fn copy_takes_two_tokens() {
        assert_eq!(
            classify("COPY  src/a.txt   out/a.txt ", &test_dir()).unwrap(),
            ActionKind::Copy {
                from: "src/a.txt".into(),
                to: "out/a.txt".into()
            }
        );
    }

    #[test]
    fn copy_with_wrong_arity_is_configuration_error() {
        for cmd in ["COPY a", "COPY a b c", "COPY "] {
            let err = classify(cmd, &test_dir()).unwrap_err();
            assert!(err.is_fatal(), "{cmd} should be fatal, got {err:?}");
        }
    }

    #[test]
    fn test_appends_scratch_flag() {
        let kind = classify("TEST ./unit_tests --fast", &test_dir()).unwrap();
        assert_eq!(
            kind,
            ActionKind::Test {
                argv: vec![
                    "./unit_tests".into(),
                    "--fast".into(),
                    "--tmp=tmp/worker3-test".into()
                ]
            }
        );
    }

    #[test]
    fn prefixes_are_case_sensitive() {
        let kind = classify("copy a b", &test_dir()).unwrap();
        assert!(matches!(kind, ActionKind::Generic { .. }));
    }

    #[test]
    fn generic_splits_without_quoting() {
        let kind = classify("cc -DNAME=\"a b\" -c x.c", &test_dir()).unwrap();
        assert_eq!(
            kind.argv().unwrap(),
            ["cc", "-DNAME=\"a", "b\"", "-c", "x.c"]
        );
    }

    #[test]
    fn test_without_command_keeps_only_the_flag() {
        assert_eq!(
            classify("TEST ", &test_dir()).unwrap(),
            ActionKind::Test {
                argv: vec!["--tmp=tmp/worker3-test".into()]
            }
        );
    }

    #[test]
    fn blank_command_is_generic_with_empty_argv() {
        assert_eq!(
            classify("   ", &test_dir()).unwrap(),
            ActionKind::Generic { argv: vec![] }
        );
    }
}
