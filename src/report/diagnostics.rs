// src/report/diagnostics.rs

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::action::ActionKind;
use crate::fs::FileSystem;
use crate::output::Console;
use crate::protocol::WorkItem;
use crate::report::demangle::{demangle_symbol, mangled_tokens};

/// Render the failure report for one action.
///
/// Test output is shown verbatim. For everything else each line is followed
/// by the demangled form of any quoted symbol on it, and a short summary
/// naming the action and its command closes the block.
pub fn render_failure(kind: &ActionKind, item: &WorkItem, output: &str) -> String {
    if kind.is_test() {
        return output.to_string();
    }

    let mut block = String::with_capacity(output.len() + 128);
    for line in output.lines() {
        block.push_str(line);
        block.push('\n');
        for raw in mangled_tokens(line) {
            if let Some(demangled) = demangle_symbol(raw) {
                block.push_str("    [");
                block.push_str(&demangled);
                block.push_str("]\n");
            }
        }
    }
    block.push_str(&format!("FAILED: {}\n  {}\n", item.action, item.command));
    block
}

/// Prints failure reports. Only the worker that won the bail calls this.
#[derive(Debug, Clone)]
pub struct DiagnosticsReporter {
    console: Arc<dyn Console>,
    fs: Arc<dyn FileSystem>,
}

impl DiagnosticsReporter {
    pub fn new(console: Arc<dyn Console>, fs: Arc<dyn FileSystem>) -> Self {
        Self { console, fs }
    }

    pub fn report(&self, kind: &ActionKind, item: &WorkItem, captured: &Path) {
        let output = match self.fs.read_to_string(captured) {
            Ok(s) => s,
            Err(e) => {
                warn!(action = %item.action, error = %e, "captured output unavailable");
                String::new()
            }
        };
        self.console.print(&render_failure(kind, item, &output));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(command: &str) -> WorkItem {
        WorkItem::new("link app", command, ["app"])
    }

    #[test]
    fn test_output_is_verbatim() {
        let kind = ActionKind::Test {
            argv: vec!["./t".into()],
        };
        let out = "assertion failed `_ZN3foo3barEv'\n";
        assert_eq!(render_failure(&kind, &item("TEST ./t"), out), out);
    }

    #[test]
    fn generic_output_gets_demangled_lines_and_summary() {
        let kind = ActionKind::Generic {
            argv: vec!["ld".into()],
        };
        let out = "a.o: undefined reference to `_ZN3foo3barEv'\nld: link failed\n";
        let block = render_failure(&kind, &item("ld -o app a.o"), out);
        assert_eq!(
            block,
            "a.o: undefined reference to `_ZN3foo3barEv'\n    [foo::bar()]\nld: link failed\nFAILED: link app\n  ld -o app a.o\n"
        );
    }

    #[test]
    fn undemanglable_tokens_add_nothing() {
        let kind = ActionKind::Generic {
            argv: vec!["ld".into()],
        };
        let block = render_failure(&kind, &item("ld"), "missing `_oops'\n");
        assert_eq!(block, "missing `_oops'\nFAILED: link app\n  ld\n");
    }
}
