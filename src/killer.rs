// src/killer.rs

//! Fleet-wide bail arbitration.
//!
//! The [`Killer`] is the only mutable state shared between workers. It holds:
//! - a one-way `Normal → Bailed` flag; exactly one `bail()` call observes the
//!   transition,
//! - a registry of in-flight children keyed by worker name.
//!
//! On the first bail every registered child is sent a kill request straight
//! away, from the bailing worker's thread. The owning worker then kills the
//! process the next time its supervisor future is polled, so latency is a
//! scheduler tick rather than a timer. A child registered *after* the bail is
//! killed on registration.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Identity of one spawned child, unique for the life of the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildId(u64);

static NEXT_CHILD_ID: AtomicU64 = AtomicU64::new(1);

/// Registry entry: lets the coordinator ask a worker to kill its child.
#[derive(Debug)]
pub struct ChildHandle {
    id: ChildId,
    kill: oneshot::Sender<()>,
}

/// Worker-side end of a [`ChildHandle`]; resolves when a kill is requested.
pub type KillSignal = oneshot::Receiver<()>;

impl ChildHandle {
    pub fn new() -> (Self, KillSignal) {
        let (kill, signal) = oneshot::channel();
        let id = ChildId(NEXT_CHILD_ID.fetch_add(1, Ordering::Relaxed));
        (Self { id, kill }, signal)
    }

    pub fn id(&self) -> ChildId {
        self.id
    }

    /// Returns false if the worker already stopped listening.
    fn kill(self) -> bool {
        self.kill.send(()).is_ok()
    }
}

/// Contract every worker relies on. Injected as `Arc<dyn CancellationCoordinator>`.
pub trait CancellationCoordinator: Send + Sync + Debug {
    /// Register the in-flight child of `worker`.
    fn launched(&self, worker: &str, child: ChildHandle);

    /// Deregister it again once it has been waited on.
    fn completed(&self, worker: &str, child: ChildId);

    /// Attempt `Normal → Bailed`. Returns `true` if the state was already
    /// `Bailed` (someone else reports), `false` if this call made the
    /// transition (the caller reports).
    fn bail(&self) -> bool;

    fn is_bailed(&self) -> bool;
}

#[derive(Debug, Default)]
pub struct Killer {
    bailed: AtomicBool,
    children: Mutex<HashMap<String, ChildHandle>>,
}

impl Killer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of children currently registered.
    pub fn in_flight(&self) -> usize {
        self.lock_children().len()
    }

    fn lock_children(&self) -> std::sync::MutexGuard<'_, HashMap<String, ChildHandle>> {
        // A panic while holding the lock cannot leave the map inconsistent.
        self.children
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CancellationCoordinator for Killer {
    fn launched(&self, worker: &str, child: ChildHandle) {
        let mut children = self.lock_children();

        // Checked under the lock so a concurrent bail either sees this child
        // in the registry or we see its flag.
        if self.bailed.load(Ordering::SeqCst) {
            info!(worker, "build already bailed; killing newly launched child");
            child.kill();
            return;
        }

        if let Some(previous) = children.insert(worker.to_string(), child) {
            warn!(
                worker,
                child = ?previous.id(),
                "worker registered a second child; previous registration dropped"
            );
        }
    }

    fn completed(&self, worker: &str, child: ChildId) {
        let mut children = self.lock_children();
        match children.get(worker) {
            Some(handle) if handle.id() == child => {
                children.remove(worker);
            }
            _ => debug!(worker, ?child, "child was not registered (already killed?)"),
        }
    }

    fn bail(&self) -> bool {
        let already = self.bailed.swap(true, Ordering::SeqCst);
        if already {
            debug!("bail requested but build already bailed");
            return true;
        }

        let victims: Vec<(String, ChildHandle)> = self.lock_children().drain().collect();
        info!(count = victims.len(), "build bailed; killing in-flight children");
        for (worker, handle) in victims {
            if !handle.kill() {
                debug!(worker = %worker, "child finished before kill request arrived");
            }
        }
        false
    }

    fn is_bailed(&self) -> bool {
        self.bailed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn exactly_one_bail_is_first() {
        let killer = Arc::new(Killer::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let killer = Arc::clone(&killer);
                std::thread::spawn(move || killer.bail())
            })
            .collect();

        let firsts = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|already| !already)
            .count();
        assert_eq!(firsts, 1);
        assert!(killer.is_bailed());
    }

    #[test]
    fn bail_kills_registered_children() {
        let killer = Killer::new();
        let (a, mut a_signal) = ChildHandle::new();
        let (b, mut b_signal) = ChildHandle::new();
        killer.launched("worker0", a);
        killer.launched("worker1", b);
        assert_eq!(killer.in_flight(), 2);

        assert!(!killer.bail());
        assert_eq!(a_signal.try_recv(), Ok(()));
        assert_eq!(b_signal.try_recv(), Ok(()));
        assert_eq!(killer.in_flight(), 0);
    }

    #[test]
    fn completed_children_are_not_killed() {
        let killer = Killer::new();
        let (a, mut a_signal) = ChildHandle::new();
        let id = a.id();
        killer.launched("worker0", a);
        killer.completed("worker0", id);

        killer.bail();
        assert!(a_signal.try_recv().is_err());
    }

    #[test]
    fn stale_completion_keeps_newer_registration() {
        let killer = Killer::new();
        let (old, _old_signal) = ChildHandle::new();
        let old_id = old.id();
        killer.launched("worker0", old);
        killer.completed("worker0", old_id);

        let (new, _new_signal) = ChildHandle::new();
        killer.launched("worker0", new);
        killer.completed("worker0", old_id);
        assert_eq!(killer.in_flight(), 1);
    }

    #[test]
    fn launch_after_bail_is_killed_immediately() {
        let killer = Killer::new();
        killer.bail();

        let (late, mut signal) = ChildHandle::new();
        killer.launched("worker2", late);
        assert_eq!(signal.try_recv(), Ok(()));
        assert_eq!(killer.in_flight(), 0);
    }
}
