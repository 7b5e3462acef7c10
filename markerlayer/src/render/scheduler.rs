//! Deferred, bounded-concurrency render scheduler.
//!
//! # Architecture
//!
//! ```text
//! enqueue(handle) ──► ┌──────────────┐
//!                     │ PendingQueue │  FIFO, one entry per handle identity
//!                     └──────┬───────┘
//!                            │ dispatch: while in_flight < max_concurrent
//!                            ▼
//!                     ┌──────────────┐
//!                     │    Armed     │  timer (initial or steady-state delay)
//!                     └──────┬───────┘    cancel() aborts here
//!                            ▼
//!                     ┌──────────────┐
//!                     │  Executing   │  callback runs in its own task
//!                     └──────┬───────┘
//!             Ok ◄───────────┴───────────► Err / panic / timeout
//!          (discard)                 attempts += 1
//!                                    < max_attempts ──► tail of PendingQueue
//!                                    ≥ max_attempts ──► discard + report
//! ```
//!
//! Every completion, cancellation, and enqueue re-runs the dispatch step, so
//! freed slots are refilled immediately.
//!
//! # Example
//!
//! ```ignore
//! use markerlayer::render::{RenderHandle, RenderScheduler, SchedulerConfig};
//!
//! let scheduler = RenderScheduler::current(SchedulerConfig::default())?;
//! let draw = RenderHandle::from_fn("draw-marker", || async { Ok(()) });
//!
//! scheduler.enqueue(draw.clone());
//! scheduler.enqueue(draw); // ignored: already pending
//!
//! scheduler.set_steady_state(true);
//! scheduler.wait_idle().await;
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::config::SchedulerConfig;
use super::error::{RenderError, SchedulerError};
use super::metrics::{SchedulerMetrics, SchedulerSnapshot};
use super::queue::{PendingQueue, PendingTask};
use super::reporter::{RenderReporter, TracingReporter};
use super::task::{RenderHandle, RenderId};

/// A task holding a concurrency slot.
#[derive(Debug)]
struct InFlight {
    /// Distinguishes this arming from any earlier one of the same handle.
    ticket: u64,
    /// Set once the timer fired and the callback started.
    executing: bool,
    /// Abort handle for the armed timer; cleared once executing.
    timer: Option<AbortHandle>,
}

#[derive(Debug, Default)]
struct SchedulerState {
    pending: PendingQueue,
    in_flight: HashMap<RenderId, InFlight>,
    shut_down: bool,
}

impl SchedulerState {
    fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.in_flight.is_empty()
    }

    fn executing(&self) -> usize {
        self.in_flight.values().filter(|e| e.executing).count()
    }
}

struct Inner {
    config: SchedulerConfig,
    runtime: Handle,
    reporter: Arc<dyn RenderReporter>,
    metrics: SchedulerMetrics,
    state: Mutex<SchedulerState>,
    steady_state: AtomicBool,
    next_ticket: AtomicU64,
    idle: Notify,
    shutdown: CancellationToken,
}

/// Runs render callbacks after a delay, at most `max_concurrent` at a time,
/// retrying failures up to `max_attempts`.
///
/// Cloning is cheap; clones drive the same queue.
#[derive(Clone)]
pub struct RenderScheduler {
    inner: Arc<Inner>,
}

impl RenderScheduler {
    /// Creates a scheduler that spawns its timers and callbacks on `runtime`
    /// and reports outcomes through `tracing`.
    pub fn new(config: SchedulerConfig, runtime: Handle) -> Self {
        Self::with_reporter(config, runtime, Arc::new(TracingReporter))
    }

    /// Creates a scheduler on the runtime of the calling thread.
    pub fn current(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        Ok(Self::new(config, Handle::try_current()?))
    }

    /// Creates a scheduler with a custom outcome reporter.
    pub fn with_reporter(
        config: SchedulerConfig,
        runtime: Handle,
        reporter: Arc<dyn RenderReporter>,
    ) -> Self {
        let config = SchedulerConfig {
            max_concurrent: config.max_concurrent.max(1),
            ..config
        };

        info!(
            max_concurrent = config.max_concurrent,
            max_attempts = config.max_attempts,
            initial_delay_ms = config.initial_delay.as_millis() as u64,
            steady_state_delay_ms = config.steady_state_delay.as_millis() as u64,
            steady_state = config.steady_state,
            "Render scheduler created"
        );

        let steady_state = AtomicBool::new(config.steady_state);
        Self {
            inner: Arc::new(Inner {
                config,
                runtime,
                reporter,
                metrics: SchedulerMetrics::new(),
                state: Mutex::new(SchedulerState::default()),
                steady_state,
                next_ticket: AtomicU64::new(0),
                idle: Notify::new(),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Returns the scheduler configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// Returns true if the short steady-state delay is in effect.
    pub fn is_steady_state(&self) -> bool {
        self.inner.steady_state.load(Ordering::Acquire)
    }

    /// Switches between the startup and steady-state delay regimes.
    ///
    /// Applies to tasks armed after the call; armed timers keep their delay.
    pub fn set_steady_state(&self, steady: bool) {
        let previous = self.inner.steady_state.swap(steady, Ordering::AcqRel);
        if previous != steady {
            info!(steady_state = steady, "Render scheduler delay regime changed");
        }
    }

    /// Queues `handle` for rendering.
    ///
    /// Ignored (returns false) if the same handle is already pending or in
    /// flight, or after shutdown. Fire-and-forget otherwise: completion is
    /// only visible through the callback itself or the reporter.
    pub fn enqueue(&self, handle: RenderHandle) -> bool {
        {
            let mut state = self.inner.state.lock();
            if state.shut_down {
                warn!(
                    render_id = %handle.id(),
                    label = handle.label(),
                    "Render enqueued after shutdown, ignoring"
                );
                return false;
            }

            let id = handle.id();
            if state.pending.contains(id) || state.in_flight.contains_key(&id) {
                self.inner.metrics.duplicate_ignored();
                trace!(render_id = %id, "Render already pending");
                return false;
            }

            trace!(render_id = %id, label = handle.label(), "Render enqueued");
            state.pending.push_back(PendingTask::new(handle));
            self.inner.metrics.task_enqueued();
        }

        self.inner.dispatch();
        true
    }

    /// Withdraws `handle` if it has not started executing.
    ///
    /// Removes it from the queue or aborts its armed timer. A callback that
    /// is already running is left alone. Returns true if anything was
    /// withdrawn.
    pub fn cancel(&self, handle: &RenderHandle) -> bool {
        let id = handle.id();
        let withdrawn = {
            let mut state = self.inner.state.lock();
            let mut withdrawn = state.pending.remove(id) > 0;

            let armed = matches!(state.in_flight.get(&id), Some(entry) if !entry.executing);
            if armed {
                if let Some(timer) = state.in_flight.remove(&id).and_then(|e| e.timer) {
                    timer.abort();
                }
                withdrawn = true;
            }
            withdrawn
        };

        if withdrawn {
            self.inner.metrics.tasks_cancelled(1);
            debug!(render_id = %id, label = handle.label(), "Render cancelled");
            self.inner.dispatch();
        }
        withdrawn
    }

    /// Returns true if `handle` is queued, armed, or executing.
    pub fn is_scheduled(&self, handle: &RenderHandle) -> bool {
        let id = handle.id();
        let state = self.inner.state.lock();
        state.pending.contains(id) || state.in_flight.contains_key(&id)
    }

    /// Returns a point-in-time view of queue sizes and lifetime counters.
    pub fn snapshot(&self) -> SchedulerSnapshot {
        let (pending, in_flight, executing) = {
            let state = self.inner.state.lock();
            (state.pending.len(), state.in_flight.len(), state.executing())
        };
        self.inner.metrics.snapshot(pending, in_flight, executing)
    }

    /// Resolves once nothing is pending or in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let idle = self.inner.state.lock().is_idle();
            if idle {
                return;
            }
            notified.await;
        }
    }

    /// Stops the scheduler.
    ///
    /// Pending tasks are dropped and armed timers aborted. Callbacks already
    /// executing run to completion but are not retried. Later `enqueue`
    /// calls are ignored.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();

        let dropped = {
            let mut state = self.inner.state.lock();
            if state.shut_down {
                return;
            }
            state.shut_down = true;

            let mut dropped = state.pending.drain().len() as u64;
            let armed: Vec<RenderId> = state
                .in_flight
                .iter()
                .filter(|(_, entry)| !entry.executing)
                .map(|(id, _)| *id)
                .collect();
            for id in armed {
                if let Some(timer) = state.in_flight.remove(&id).and_then(|e| e.timer) {
                    timer.abort();
                }
                dropped += 1;
            }
            dropped
        };

        self.inner.metrics.tasks_cancelled(dropped);
        info!(dropped, "Render scheduler shut down");
        self.inner.notify_if_idle();
    }

    /// Returns true once [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }
}

impl std::fmt::Debug for RenderScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderScheduler")
            .field("config", &self.inner.config)
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

impl Inner {
    fn current_delay(&self) -> Duration {
        self.config
            .delay_for(self.steady_state.load(Ordering::Acquire))
    }

    /// Fills free slots from the head of the queue.
    fn dispatch(self: &Arc<Self>) {
        let mut discarded = Vec::new();
        let idle = {
            let mut state = self.state.lock();
            if !state.shut_down {
                while state.in_flight.len() < self.config.max_concurrent {
                    let Some(task) = state.pending.pop_front() else {
                        break;
                    };

                    if task.attempts >= self.config.max_attempts {
                        discarded.push(task);
                        continue;
                    }

                    let id = task.id();
                    let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
                    let delay = self.current_delay();
                    trace!(
                        render_id = %id,
                        attempt = task.attempts + 1,
                        waited_ms = task.wait_time().as_millis() as u64,
                        delay_ms = delay.as_millis() as u64,
                        "Render armed"
                    );

                    let join = self
                        .runtime
                        .spawn(Arc::clone(self).run_task(task, ticket, delay));
                    state.in_flight.insert(
                        id,
                        InFlight {
                            ticket,
                            executing: false,
                            timer: Some(join.abort_handle()),
                        },
                    );
                }
            }
            state.is_idle()
        };

        for task in discarded {
            self.metrics.task_exhausted();
            self.reporter.on_exhausted(&task.handle, task.attempts, None);
        }

        if idle {
            self.idle.notify_waiters();
        }
    }

    fn notify_if_idle(&self) {
        let idle = self.state.lock().is_idle();
        if idle {
            self.idle.notify_waiters();
        }
    }

    /// Waits out the delay, runs one attempt, and settles the outcome.
    async fn run_task(self: Arc<Self>, mut task: PendingTask, ticket: u64, delay: Duration) {
        tokio::select! {
            _ = self.shutdown.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }

        let id = task.id();
        {
            let mut state = self.state.lock();
            match state.in_flight.get_mut(&id) {
                Some(entry) if entry.ticket == ticket => {
                    entry.executing = true;
                    entry.timer = None;
                }
                // Cancelled while armed
                _ => return,
            }
        }

        let attempt = task.attempts + 1;
        trace!(render_id = %id, attempt, "Render executing");
        let result = self.execute(&task.handle).await;
        task.attempts = attempt;

        let handle = task.handle.clone();
        let (will_retry, shut_down) = {
            let mut state = self.state.lock();
            state.in_flight.remove(&id);
            let will_retry =
                result.is_err() && attempt < self.config.max_attempts && !state.shut_down;
            if will_retry {
                state.pending.push_back(task);
            }
            (will_retry, state.shut_down)
        };

        match &result {
            Ok(()) => {
                self.metrics.task_succeeded();
                self.reporter.on_success(&handle, attempt);
            }
            Err(err) => {
                self.metrics.attempt_failed();
                self.reporter.on_failure(&handle, attempt, err, will_retry);
                if attempt >= self.config.max_attempts {
                    self.metrics.task_exhausted();
                    self.reporter.on_exhausted(&handle, attempt, Some(err));
                } else if shut_down {
                    self.metrics.tasks_cancelled(1);
                }
            }
        }

        self.dispatch();
    }

    /// Runs the callback in its own task so a panic is contained.
    async fn execute(&self, handle: &RenderHandle) -> Result<(), RenderError> {
        let callback = handle.callback();
        let mut join = self
            .runtime
            .spawn(async move { callback.render().await });

        let outcome = match self.config.callback_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut join).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    join.abort();
                    return Err(RenderError::TimedOut(limit));
                }
            },
            None => join.await,
        };

        match outcome {
            Ok(result) => result,
            Err(err) if err.is_panic() => Err(RenderError::Panicked(panic_message(err.into_panic()))),
            Err(err) => Err(RenderError::failed(err)),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Semaphore;

    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Success(String, u32),
        Failure(String, u32, bool),
        Exhausted(String, u32, Option<RenderError>),
    }

    #[derive(Default)]
    struct RecordingReporter {
        events: parking_lot::Mutex<Vec<Event>>,
    }

    impl RecordingReporter {
        fn events(&self) -> Vec<Event> {
            self.events.lock().clone()
        }
    }

    impl RenderReporter for RecordingReporter {
        fn on_success(&self, handle: &RenderHandle, attempts: u32) {
            self.events
                .lock()
                .push(Event::Success(handle.label().to_string(), attempts));
        }

        fn on_failure(&self, handle: &RenderHandle, attempt: u32, _: &RenderError, will_retry: bool) {
            self.events
                .lock()
                .push(Event::Failure(handle.label().to_string(), attempt, will_retry));
        }

        fn on_exhausted(&self, handle: &RenderHandle, attempts: u32, last: Option<&RenderError>) {
            self.events.lock().push(Event::Exhausted(
                handle.label().to_string(),
                attempts,
                last.cloned(),
            ));
        }
    }

    fn fast_config() -> SchedulerConfig {
        SchedulerConfig::default()
            .with_delays(Duration::from_millis(1), Duration::from_millis(1))
            .with_steady_state(true)
    }

    fn scheduler(config: SchedulerConfig) -> (RenderScheduler, Arc<RecordingReporter>) {
        let reporter = Arc::new(RecordingReporter::default());
        let scheduler = RenderScheduler::with_reporter(
            config,
            Handle::current(),
            Arc::clone(&reporter) as Arc<dyn RenderReporter>,
        );
        (scheduler, reporter)
    }

    fn counting(label: &str, counter: Arc<AtomicUsize>) -> RenderHandle {
        RenderHandle::from_fn(label, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    async fn settle(scheduler: &RenderScheduler) {
        tokio::time::timeout(TEST_TIMEOUT, scheduler.wait_idle())
            .await
            .expect("scheduler did not go idle");
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(TEST_TIMEOUT, async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("condition not reached");
    }

    #[tokio::test]
    async fn test_enqueue_runs_callback() {
        let (scheduler, reporter) = scheduler(fast_config());
        let count = Arc::new(AtomicUsize::new(0));

        assert!(scheduler.enqueue(counting("draw", Arc::clone(&count))));
        settle(&scheduler).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(reporter.events(), vec![Event::Success("draw".into(), 1)]);
        let snap = scheduler.snapshot();
        assert_eq!(snap.succeeded, 1);
        assert!(snap.is_idle());
    }

    #[tokio::test]
    async fn test_duplicate_enqueue_runs_once() {
        let config = SchedulerConfig::default()
            .with_delays(Duration::from_millis(30), Duration::from_millis(30));
        let (scheduler, _) = scheduler(config);
        let count = Arc::new(AtomicUsize::new(0));
        let handle = counting("draw", Arc::clone(&count));

        assert!(scheduler.enqueue(handle.clone()));
        assert!(!scheduler.enqueue(handle.clone()));
        assert!(scheduler.is_scheduled(&handle));
        settle(&scheduler).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.snapshot().duplicates, 1);
    }

    #[tokio::test]
    async fn test_reenqueue_after_completion_runs_again() {
        let (scheduler, _) = scheduler(fast_config());
        let count = Arc::new(AtomicUsize::new(0));
        let handle = counting("draw", Arc::clone(&count));

        scheduler.enqueue(handle.clone());
        settle(&scheduler).await;
        assert!(scheduler.enqueue(handle));
        settle(&scheduler).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrency_bound() {
        let (scheduler, _) = scheduler(fast_config().with_max_concurrent(3));
        let gate = Arc::new(Semaphore::new(0));
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let done = Arc::new(AtomicUsize::new(0));

        for i in 0..6 {
            let gate = Arc::clone(&gate);
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            let done = Arc::clone(&done);
            scheduler.enqueue(RenderHandle::from_fn(format!("block-{}", i), move || {
                let gate = Arc::clone(&gate);
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                let done = Arc::clone(&done);
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    if let Ok(permit) = gate.acquire().await {
                        permit.forget();
                    }
                    running.fetch_sub(1, Ordering::SeqCst);
                    done.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }));
        }

        wait_until(|| scheduler.snapshot().executing == 3).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let snap = scheduler.snapshot();
        assert_eq!(snap.in_flight, 3);
        assert_eq!(snap.pending, 3);
        assert_eq!(running.load(Ordering::SeqCst), 3);

        gate.add_permits(6);
        settle(&scheduler).await;

        assert_eq!(done.load(Ordering::SeqCst), 6);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_always_failing_callback_exhausts() {
        let (scheduler, reporter) = scheduler(fast_config().with_max_attempts(3));
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        scheduler.enqueue(RenderHandle::from_fn("broken", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(RenderError::failed("surface unavailable")) }
        }));
        settle(&scheduler).await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        let snap = scheduler.snapshot();
        assert_eq!(snap.failed_attempts, 3);
        assert_eq!(snap.exhausted, 1);
        assert_eq!(snap.succeeded, 0);
        assert_eq!(
            reporter.events(),
            vec![
                Event::Failure("broken".into(), 1, true),
                Event::Failure("broken".into(), 2, true),
                Event::Failure("broken".into(), 3, false),
                Event::Exhausted(
                    "broken".into(),
                    3,
                    Some(RenderError::failed("surface unavailable"))
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_fail_then_succeed() {
        let (scheduler, reporter) = scheduler(fast_config().with_max_attempts(5));
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        scheduler.enqueue(RenderHandle::from_fn("flaky", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n <= 2 {
                    Err(RenderError::failed("transient"))
                } else {
                    Ok(())
                }
            }
        }));
        settle(&scheduler).await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        let snap = scheduler.snapshot();
        assert_eq!(snap.failed_attempts, 2);
        assert_eq!(snap.succeeded, 1);
        assert_eq!(snap.exhausted, 0);
        assert_eq!(
            reporter.events().last(),
            Some(&Event::Success("flaky".into(), 3))
        );
    }

    #[tokio::test]
    async fn test_failed_task_retries_behind_later_work() {
        let (scheduler, _) = scheduler(fast_config().with_max_concurrent(1));
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let t1_runs = Arc::new(AtomicUsize::new(0));

        let log = Arc::clone(&order);
        let runs = Arc::clone(&t1_runs);
        let t1 = RenderHandle::from_fn("t1", move || {
            log.lock().push("t1");
            let first = runs.fetch_add(1, Ordering::SeqCst) == 0;
            async move {
                if first {
                    Err(RenderError::failed("once"))
                } else {
                    Ok(())
                }
            }
        });

        let log = Arc::clone(&order);
        let t2 = RenderHandle::from_fn("t2", move || {
            log.lock().push("t2");
            async { Ok(()) }
        });

        scheduler.enqueue(t1);
        scheduler.enqueue(t2);
        settle(&scheduler).await;

        assert_eq!(*order.lock(), vec!["t1", "t2", "t1"]);
    }

    #[tokio::test]
    async fn test_cancel_armed_task() {
        let config = SchedulerConfig::default()
            .with_delays(Duration::from_secs(30), Duration::from_secs(30));
        let (scheduler, _) = scheduler(config);
        let count = Arc::new(AtomicUsize::new(0));
        let handle = counting("draw", Arc::clone(&count));

        scheduler.enqueue(handle.clone());
        assert_eq!(scheduler.snapshot().in_flight, 1);

        assert!(scheduler.cancel(&handle));
        assert!(!scheduler.is_scheduled(&handle));
        settle(&scheduler).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.snapshot().cancelled, 1);
        assert!(!scheduler.cancel(&handle));
    }

    #[tokio::test]
    async fn test_cancel_queued_task() {
        let config = SchedulerConfig::default()
            .with_max_concurrent(1)
            .with_delays(Duration::from_secs(30), Duration::from_secs(30));
        let (scheduler, _) = scheduler(config);
        let first = RenderHandle::from_fn("first", || async { Ok(()) });
        let second = RenderHandle::from_fn("second", || async { Ok(()) });

        scheduler.enqueue(first.clone());
        scheduler.enqueue(second.clone());
        assert_eq!(scheduler.snapshot().pending, 1);

        assert!(scheduler.cancel(&second));
        let snap = scheduler.snapshot();
        assert_eq!(snap.pending, 0);
        assert_eq!(snap.in_flight, 1);

        scheduler.cancel(&first);
        settle(&scheduler).await;
    }

    #[tokio::test]
    async fn test_cancel_frees_slot_for_next_task() {
        let config = SchedulerConfig::default()
            .with_max_concurrent(1)
            .with_delays(Duration::from_millis(50), Duration::from_millis(50));
        let (scheduler, _) = scheduler(config);
        let count = Arc::new(AtomicUsize::new(0));
        let first = counting("first", Arc::clone(&count));
        let second = counting("second", Arc::clone(&count));

        scheduler.enqueue(first.clone());
        scheduler.enqueue(second.clone());
        scheduler.cancel(&first);

        assert!(scheduler.is_scheduled(&second));
        assert_eq!(scheduler.snapshot().in_flight, 1);
        settle(&scheduler).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_does_not_interrupt_executing() {
        let (scheduler, _) = scheduler(fast_config());
        let gate = Arc::new(Semaphore::new(0));
        let finished = Arc::new(AtomicUsize::new(0));

        let g = Arc::clone(&gate);
        let f = Arc::clone(&finished);
        let handle = RenderHandle::from_fn("slow", move || {
            let g = Arc::clone(&g);
            let f = Arc::clone(&f);
            async move {
                if let Ok(permit) = g.acquire().await {
                    permit.forget();
                }
                f.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        scheduler.enqueue(handle.clone());
        wait_until(|| scheduler.snapshot().executing == 1).await;

        assert!(!scheduler.cancel(&handle));
        gate.add_permits(1);
        settle(&scheduler).await;

        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.snapshot().succeeded, 1);
    }

    #[tokio::test]
    async fn test_panic_counts_as_failure() {
        let (scheduler, reporter) = scheduler(fast_config().with_max_attempts(2));

        scheduler.enqueue(RenderHandle::from_fn("panicky", || async {
            let texture: Option<&str> = None;
            texture.expect("marker texture missing");
            Ok(())
        }));
        settle(&scheduler).await;

        let snap = scheduler.snapshot();
        assert_eq!(snap.failed_attempts, 2);
        assert_eq!(snap.exhausted, 1);
        match reporter.events().last() {
            Some(Event::Exhausted(_, 2, Some(RenderError::Panicked(msg)))) => {
                assert!(msg.contains("marker texture missing"));
            }
            other => panic!("unexpected last event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_callback_timeout_is_a_failure() {
        let config = fast_config()
            .with_max_attempts(1)
            .with_callback_timeout(Some(Duration::from_millis(20)));
        let (scheduler, reporter) = scheduler(config);

        scheduler.enqueue(RenderHandle::from_fn("hung", || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }));
        settle(&scheduler).await;

        assert_eq!(
            reporter.events().last(),
            Some(&Event::Exhausted(
                "hung".into(),
                1,
                Some(RenderError::TimedOut(Duration::from_millis(20)))
            ))
        );
    }

    #[tokio::test]
    async fn test_zero_attempts_discards_without_running() {
        let (scheduler, reporter) = scheduler(fast_config().with_max_attempts(0));
        let count = Arc::new(AtomicUsize::new(0));

        scheduler.enqueue(counting("never", Arc::clone(&count)));
        settle(&scheduler).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(
            reporter.events(),
            vec![Event::Exhausted("never".into(), 0, None)]
        );
    }

    #[tokio::test]
    async fn test_steady_state_switch_shortens_delay() {
        let config = SchedulerConfig::default()
            .with_delays(Duration::from_secs(30), Duration::from_millis(1))
            .with_steady_state(false);
        let (scheduler, _) = scheduler(config);
        assert!(!scheduler.is_steady_state());

        scheduler.set_steady_state(true);
        assert!(scheduler.is_steady_state());

        let count = Arc::new(AtomicUsize::new(0));
        scheduler.enqueue(counting("draw", Arc::clone(&count)));
        settle(&scheduler).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_drops_work_and_rejects_enqueue() {
        let config = SchedulerConfig::default()
            .with_max_concurrent(1)
            .with_delays(Duration::from_secs(30), Duration::from_secs(30));
        let (scheduler, _) = scheduler(config);
        let count = Arc::new(AtomicUsize::new(0));

        scheduler.enqueue(counting("a", Arc::clone(&count)));
        scheduler.enqueue(counting("b", Arc::clone(&count)));

        scheduler.shutdown();
        assert!(scheduler.is_shut_down());
        settle(&scheduler).await;

        assert_eq!(scheduler.snapshot().cancelled, 2);
        assert!(!scheduler.enqueue(counting("c", Arc::clone(&count))));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_current_requires_runtime() {
        assert!(matches!(
            RenderScheduler::current(SchedulerConfig::default()),
            Err(SchedulerError::NoRuntime(_))
        ));
    }
}
