// src/engine/termination.rs
// =============================================================================
// Deciding when the crawl is actually finished is the trickiest part of the
// whole engine. "The frontier looks empty" is not enough: another worker may
// be mid-fetch and about to push a dozen new pages.
//
// The rule implemented here:
//
//     shut down when ALL workers are idle at the same time
//     AND the frontier is empty.
//
// Only an active (non-idle) worker can push new work, so once every worker is
// idle and the queue is empty, no new work can ever appear. The detector is a
// single-use barrier: it fires exactly once per run.
//
// Two signals keep workers from busy-waiting:
// - work_available: pushed-to when new work arrives, wakes one parked worker
// - shutdown_signal: broadcast once, wakes every parked worker to exit
//
// An earlier design that sleeps for a fixed delay and re-checks the queue
// once is rejected: it can terminate while a sibling is mid-fetch (missed
// pages) or hang around for the full delay after the crawl is really done.
//
// Rust concepts:
// - AtomicUsize/AtomicBool: Lock-free counters and flags shared by workers
// - tokio::sync::Notify: Async condition-variable-style wakeups
// =============================================================================

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

// Coordinates worker idle/active transitions and fires the shutdown barrier.
pub struct TerminationDetector {
    pool_size: usize,
    idle_workers: AtomicUsize,
    shutdown: AtomicBool,
    work_available: Notify,
    shutdown_signal: Notify,
}

impl TerminationDetector {
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool_size,
            idle_workers: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
            work_available: Notify::new(),
            shutdown_signal: Notify::new(),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    // Called after every frontier push so at least one parked worker wakes up
    // and takes the new work, instead of waiting for an unrelated timeout.
    pub fn notify_push(&self) {
        self.work_available.notify_one();
    }

    // A future that resolves when new work is pushed.
    //
    // Callers must enable() the returned future BEFORE their final emptiness
    // check on the frontier, otherwise a push landing between the check and
    // the park would be missed.
    pub fn work_signal(&self) -> Notified<'_> {
        self.work_available.notified()
    }

    // Marks the calling worker idle and returns the new idle count.
    // If the count equals the pool size and the frontier is empty, the caller
    // is responsible for triggering shutdown.
    pub fn enter_idle(&self) -> usize {
        self.idle_workers.fetch_add(1, Ordering::SeqCst) + 1
    }

    // Marks the calling worker active again after a wakeup.
    pub fn leave_idle(&self) {
        self.idle_workers.fetch_sub(1, Ordering::SeqCst);
    }

    // Broadcasts shutdown to every worker. Safe to call more than once;
    // the barrier only fires the first time.
    pub fn trigger_shutdown(&self) {
        if !self.shutdown.swap(true, Ordering::SeqCst) {
            self.shutdown_signal.notify_waiters();
            // Wake parked workers waiting for work too, so none sleeps
            // through the shutdown.
            self.work_available.notify_waiters();
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    // Waits until shutdown has been triggered.
    //
    // notify_waiters() only reaches tasks that are already registered, so we
    // register first and then re-check the flag to close the gap.
    pub async fn wait_for_shutdown(&self) {
        let signal = self.shutdown_signal.notified();
        tokio::pin!(signal);
        signal.as_mut().enable();
        if self.shutdown.load(Ordering::SeqCst) {
            return;
        }
        signal.await;
    }
}
