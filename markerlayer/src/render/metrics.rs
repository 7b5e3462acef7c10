//! Scheduler counters and point-in-time snapshots.
//!
//! ```text
//! RenderScheduler ─────► SchedulerMetrics ─────► SchedulerSnapshot ─────► Views
//!                        (atomic counters)       (point-in-time copy)      (CLI, etc.)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free lifetime counters for one scheduler.
#[derive(Debug, Default)]
pub struct SchedulerMetrics {
    enqueued: AtomicU64,
    duplicates: AtomicU64,
    succeeded: AtomicU64,
    failed_attempts: AtomicU64,
    exhausted: AtomicU64,
    cancelled: AtomicU64,
}

impl SchedulerMetrics {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn task_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn duplicate_ignored(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn task_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn attempt_failed(&self) {
        self.failed_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn task_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn tasks_cancelled(&self, count: u64) {
        self.cancelled.fetch_add(count, Ordering::Relaxed);
    }

    /// Copies the counters together with the current queue gauges.
    pub fn snapshot(&self, pending: usize, in_flight: usize, executing: usize) -> SchedulerSnapshot {
        SchedulerSnapshot {
            pending,
            in_flight,
            executing,
            enqueued: self.enqueued.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed_attempts: self.failed_attempts.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of a scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerSnapshot {
    /// Tasks waiting for a slot.
    pub pending: usize,
    /// Tasks armed or executing (counted against the bound).
    pub in_flight: usize,
    /// Subset of `in_flight` whose callback is running.
    pub executing: usize,
    /// Tasks accepted by `enqueue`.
    pub enqueued: u64,
    /// `enqueue` calls ignored because the callback was already queued.
    pub duplicates: u64,
    /// Tasks that eventually rendered.
    pub succeeded: u64,
    /// Individual failed attempts.
    pub failed_attempts: u64,
    /// Tasks discarded after the attempt ceiling.
    pub exhausted: u64,
    /// Tasks withdrawn by `cancel` or shutdown.
    pub cancelled: u64,
}

impl SchedulerSnapshot {
    /// Returns true if nothing is queued or running.
    pub fn is_idle(&self) -> bool {
        self.pending == 0 && self.in_flight == 0
    }
}

impl std::fmt::Display for SchedulerSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pending={} in_flight={} executing={} succeeded={} failed_attempts={} exhausted={} cancelled={}",
            self.pending,
            self.in_flight,
            self.executing,
            self.succeeded,
            self.failed_attempts,
            self.exhausted,
            self.cancelled
        )
    }
}
