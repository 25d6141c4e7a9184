// src/exec/supervisor.rs

//! Process supervisor: runs one classified action for one worker slot.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::action::{classify, ActionKind};
use crate::errors::{Result, WorkerError};
use crate::exec::backend::{ActionSignal, ExecutorBackend};
use crate::exec::child::{run_captured, ExecutionOutcome};
use crate::exec::guard::ArtifactGuard;
use crate::protocol::WorkItem;
use crate::report::DiagnosticsReporter;
use crate::worker::{SharedServices, WorkerSlot};

/// Content written by `DUMMY` actions.
pub const DUMMY_CONTENT: &[u8] = b"dummy\n";

/// Trailer appended to a passing test's results.
pub const TEST_PASSED: &[u8] = b"PASSED\n";

#[derive(Debug)]
pub struct Supervisor {
    slot: WorkerSlot,
    print_actions: bool,
    services: SharedServices,
    guard: ArtifactGuard,
    reporter: DiagnosticsReporter,
}

impl Supervisor {
    pub fn new(slot: WorkerSlot, print_actions: bool, services: SharedServices) -> Self {
        let guard = ArtifactGuard::new(Arc::clone(&services.fs));
        let reporter =
            DiagnosticsReporter::new(Arc::clone(&services.console), Arc::clone(&services.fs));
        Self {
            slot,
            print_actions,
            services,
            guard,
            reporter,
        }
    }

    /// Classify and run one work item.
    pub async fn run(&self, item: &WorkItem) -> Result<ActionSignal> {
        let kind = classify(&item.command, &self.slot.test_dir)?;

        if self.print_actions {
            self.services
                .console
                .print(&format!("{}\n    {}\n", item.action, kind));
        }
        debug!(worker = %self.slot.name, action = %item.action, %kind, "running action");

        match &kind {
            ActionKind::Dummy => {
                self.write_dummy(item)?;
                Ok(ActionSignal::Built)
            }
            ActionKind::Copy { from, to } => {
                self.copy(from, to)?;
                Ok(ActionSignal::Built)
            }
            ActionKind::Test { argv } | ActionKind::Generic { argv } => {
                self.run_process(&kind, argv, item).await
            }
        }
    }

    fn write_dummy(&self, item: &WorkItem) -> Result<()> {
        for target in item.targets.iter() {
            self.services.fs.write(target, DUMMY_CONTENT)?;
        }
        Ok(())
    }

    /// In-process copy; mtime becomes now and the executable bit follows the
    /// source where the platform has one.
    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        let fs = &self.services.fs;
        fs.copy_file(from, to)?;
        fs.touch_now(to)?;
        if let Some(executable) = fs.executable_bit(from)? {
            fs.set_executable_bit(to, executable)?;
        }
        Ok(())
    }

    async fn run_process(
        &self,
        kind: &ActionKind,
        argv: &[String],
        item: &WorkItem,
    ) -> Result<ActionSignal> {
        let fs = &self.services.fs;
        self.guard.prepare(&item.targets)?;
        if kind.is_test() && fs.remove_dir_all_if_exists(&self.slot.test_dir)? {
            debug!(worker = %self.slot.name, "removed leftover test scratch dir");
        }

        let outcome = run_captured(
            argv,
            &self.slot.results_path,
            &self.slot.name,
            self.services.killer.as_ref(),
        )
        .await;

        if !outcome.succeeded {
            self.handle_failure(kind, item, &outcome);
            return Ok(ActionSignal::Bail);
        }

        if kind.is_test() {
            self.finish_test(item)?;
        } else {
            self.finish_generic()?;
        }
        Ok(ActionSignal::Built)
    }

    fn handle_failure(&self, kind: &ActionKind, item: &WorkItem, outcome: &ExecutionOutcome) {
        self.guard.discard(&item.targets);

        if self.services.killer.bail() {
            info!(
                worker = %self.slot.name,
                action = %item.action,
                "action failed after build already bailed; diagnostics suppressed"
            );
            return;
        }

        warn!(worker = %self.slot.name, action = %item.action, "action failed; bailing build");
        self.reporter.report(kind, item, &outcome.captured_output);
    }

    /// The results file, with a pass receipt appended, becomes the target.
    /// The receipt goes on before the move so a target never exists without
    /// it.
    fn finish_test(&self, item: &WorkItem) -> Result<()> {
        let fs = &self.services.fs;
        fs.remove_dir_all_if_exists(&self.slot.test_dir)?;

        let target = match item.targets.as_slice() {
            [target] => target,
            targets => {
                return Err(WorkerError::Configuration(format!(
                    "test action '{}' must have exactly one target, got {}",
                    item.action,
                    targets.len()
                )));
            }
        };

        fs.append(&self.slot.results_path, TEST_PASSED)?;
        fs.rename(&self.slot.results_path, target)?;
        Ok(())
    }

    fn finish_generic(&self) -> Result<()> {
        let fs = &self.services.fs;
        if self.print_actions {
            let output = fs.read_to_string(&self.slot.results_path)?;
            if !output.is_empty() {
                self.services.console.print(&output);
            }
        }
        fs.remove_file_if_exists(&self.slot.results_path)?;
        Ok(())
    }
}

impl ExecutorBackend for Supervisor {
    fn execute<'a>(
        &'a mut self,
        item: &'a WorkItem,
    ) -> Pin<Box<dyn Future<Output = Result<ActionSignal>> + Send + 'a>> {
        Box::pin(self.run(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use crate::fs::mock::MockFileSystem;
    use crate::fs::FileSystem;
    use crate::killer::Killer;
    use crate::output::Console;

    #[derive(Debug, Default)]
    struct Recorded(Mutex<Vec<String>>);

    impl Console for Recorded {
        fn print(&self, block: &str) {
            self.0.lock().unwrap().push(block.to_string());
        }
    }

    fn supervisor(fs: &MockFileSystem) -> Supervisor {
        let services = SharedServices {
            fs: Arc::new(fs.clone()),
            killer: Arc::new(Killer::new()),
            console: Arc::new(Recorded::default()),
        };
        Supervisor::new(WorkerSlot::new(0, Path::new("tmp")), false, services)
    }

    fn copy_item(from: &str, to: &str) -> WorkItem {
        WorkItem::new("copy", format!("COPY {from} {to}"), [to])
    }

    #[tokio::test]
    async fn copy_propagates_exec_bit_and_touches_target() {
        let fs = MockFileSystem::new();
        fs.add_executable("bin/tool", "#!/bin/sh\n");

        let signal = supervisor(&fs).run(&copy_item("bin/tool", "out/tool")).await.unwrap();

        assert_eq!(signal, ActionSignal::Built);
        assert!(fs.is_executable("out/tool"));
        assert!(fs.was_touched("out/tool"));
        assert_eq!(fs.read_to_string(Path::new("out/tool")).unwrap(), "#!/bin/sh\n");
    }

    #[tokio::test]
    async fn copy_of_plain_file_stays_plain() {
        let fs = MockFileSystem::new();
        fs.add_file("data.txt", "x");

        supervisor(&fs).run(&copy_item("data.txt", "out/data.txt")).await.unwrap();

        assert!(!fs.is_executable("out/data.txt"));
        assert_eq!(fs.executable_updates(), 1);
    }

    #[tokio::test]
    async fn copy_without_exec_concept_skips_permission_update() {
        let fs = MockFileSystem::without_executable_concept();
        fs.add_executable("bin/tool", "x");

        let signal = supervisor(&fs).run(&copy_item("bin/tool", "out/tool")).await.unwrap();

        assert_eq!(signal, ActionSignal::Built);
        assert!(fs.exists(Path::new("out/tool")));
        assert!(fs.was_touched("out/tool"));
        assert_eq!(fs.executable_updates(), 0);
    }

    #[tokio::test]
    async fn dummy_writes_every_target() {
        let fs = MockFileSystem::new();
        let targets = ["gen/a.h", "gen/b.h", "gen/c.h"];
        let item = WorkItem::new("headers", "DUMMY", targets);

        let signal = supervisor(&fs).run(&item).await.unwrap();

        assert_eq!(signal, ActionSignal::Built);
        for target in targets {
            assert_eq!(fs.read_to_string(Path::new(target)).unwrap(), "dummy\n");
        }
    }

    #[test]
    fn passing_test_receipt_ends_with_passed() {
        let fs = MockFileSystem::new();
        let sup = supervisor(&fs);
        fs.add_file(&sup.slot.results_path, "ok 3 tests\n");
        let item = WorkItem::new("unit", "TEST ./t", ["t.result"]);

        sup.finish_test(&item).unwrap();

        assert!(!fs.exists(&sup.slot.results_path));
        assert_eq!(
            fs.read_to_string(Path::new("t.result")).unwrap(),
            "ok 3 tests\nPASSED\n"
        );
    }

    #[test]
    fn receipt_failure_leaves_no_target() {
        let fs = MockFileSystem::new();
        let sup = supervisor(&fs);
        fs.add_dir(&sup.slot.results_path);
        let target = PathBuf::from("t.result");
        let item = WorkItem::new("unit", "TEST ./t", [target.clone()]);

        assert!(sup.finish_test(&item).is_err());
        assert!(!fs.exists(&target));
    }
}
