#![cfg(unix)]

use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tokio::sync::mpsc;

use buildworker::killer::CancellationCoordinator;
use buildworker::planner::run_build;
use buildworker::protocol::{WorkerMessage, WorkerReport};
use buildworker::worker::build_worker;
use buildworker_test_utils::builders::{worker_config, TestServices, WorkBuilder};
use buildworker_test_utils::{init_tracing, with_timeout};

fn failing_script(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("fail.sh");
    // Give the sleepers a head start so the kill path, not the
    // launch-after-bail path, is usually exercised.
    fs::write(&path, "#!/bin/sh\nsleep 0.2\necho boom\nexit 1\n").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test]
async fn first_failure_kills_siblings_and_reports_once() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let test = TestServices::new();
    let config = worker_config(&dir.path().join("tmp"), 3);
    let fail = failing_script(&dir);

    let actions = vec![
        WorkBuilder::new("sleep a", "sleep 30").target(dir.path().join("a.out")).entry(),
        WorkBuilder::new("sleep b", "sleep 30").target(dir.path().join("b.out")).entry(),
        WorkBuilder::new("explode", &fail.display().to_string())
            .target(dir.path().join("c.out"))
            .entry(),
        WorkBuilder::new("never", "DUMMY").target(dir.path().join("d.out")).entry(),
    ];

    let started = Instant::now();
    let summary = with_timeout(run_build(actions, &config, test.services.clone()))
        .await
        .unwrap();

    assert!(summary.failed);
    assert!(summary.built.is_empty());
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(test.killer.is_bailed());
    assert_eq!(test.killer.in_flight(), 0);

    let reports = test.console.failure_reports();
    assert_eq!(reports.len(), 1, "reports: {reports:?}");
    assert!(reports[0].contains("boom\n"));
    assert!(reports[0].contains("FAILED: explode"));

    for name in ["a.out", "b.out", "c.out", "d.out"] {
        assert!(!dir.path().join(name).exists(), "{name} should not exist");
    }
}

#[tokio::test]
async fn every_worker_sends_exactly_one_bailed() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let test = TestServices::new();
    let config = worker_config(&dir.path().join("tmp"), 3);
    fs::create_dir_all(&config.tmp_dir).unwrap();
    let fail = failing_script(&dir);

    let (report_tx, mut report_rx) = mpsc::channel::<WorkerReport>(16);
    let mut work_txs = Vec::new();
    let mut joins = Vec::new();
    for index in 0..3 {
        let (work_tx, work_rx) = mpsc::channel(1);
        let worker = build_worker(index, &config, test.services.clone(), work_rx, report_tx.clone());
        joins.push(tokio::spawn(worker.run()));
        work_txs.push(work_tx);
    }
    drop(report_tx);

    let commands = ["sleep 30".to_string(), "sleep 30".to_string(), fail.display().to_string()];
    for (index, command) in commands.iter().enumerate() {
        let msg = WorkBuilder::new(&format!("job{index}"), command)
            .target(dir.path().join(format!("job{index}.out")))
            .message();
        work_txs[index].send(msg).await.unwrap();
    }

    let mut bailed: HashMap<usize, usize> = HashMap::new();
    let collect = async {
        while let Some(report) = report_rx.recv().await {
            match report.message {
                WorkerMessage::Bailed => *bailed.entry(report.worker).or_default() += 1,
                WorkerMessage::Success { action } => panic!("unexpected success of {action}"),
            }
        }
    };
    with_timeout(collect).await;

    assert_eq!(bailed, HashMap::from([(0, 1), (1, 1), (2, 1)]));
    for join in joins {
        join.await.unwrap().unwrap();
    }
    assert_eq!(test.console.failure_reports().len(), 1);
}
