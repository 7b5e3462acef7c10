//! Scheduler configuration.
//!
//! Two delay regimes are supported: a long `initial_delay` used while the
//! application is still starting up, and a short `steady_state_delay` used
//! once the caller flags startup as complete.

use std::time::Duration;

// =============================================================================
// Defaults
// =============================================================================

/// Default bound on concurrently scheduled or executing renders.
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

/// Default number of attempts before a render is discarded.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default wait before each attempt while the application starts up.
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1500;

/// Default wait before each attempt once the application is in steady state.
pub const DEFAULT_STEADY_STATE_DELAY_MS: u64 = 50;

/// Configuration for the [`RenderScheduler`](super::RenderScheduler).
#[derive(Clone, Debug, PartialEq)]
pub struct SchedulerConfig {
    /// Upper bound on tasks that are armed or executing at once.
    pub max_concurrent: usize,

    /// Attempts (including the first) before a task is discarded.
    pub max_attempts: u32,

    /// Delay before an attempt while not in steady state.
    pub initial_delay: Duration,

    /// Delay before an attempt once in steady state.
    pub steady_state_delay: Duration,

    /// Whether the scheduler starts in steady state.
    pub steady_state: bool,

    /// Per-attempt time limit. `None` waits for the callback indefinitely,
    /// so a hung callback holds its slot forever.
    pub callback_timeout: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            steady_state_delay: Duration::from_millis(DEFAULT_STEADY_STATE_DELAY_MS),
            steady_state: false,
            callback_timeout: None,
        }
    }
}

impl SchedulerConfig {
    /// Set the concurrency bound. Values below 1 are raised to 1.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    /// Set the attempt ceiling.
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    /// Set both delay regimes.
    pub fn with_delays(mut self, initial: Duration, steady_state: Duration) -> Self {
        self.initial_delay = initial;
        self.steady_state_delay = steady_state;
        self
    }

    /// Start in (or out of) steady state.
    pub fn with_steady_state(mut self, steady: bool) -> Self {
        self.steady_state = steady;
        self
    }

    /// Bound each attempt's duration.
    pub fn with_callback_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.callback_timeout = timeout;
        self
    }

    /// Returns the delay for the given regime.
    pub fn delay_for(&self, steady_state: bool) -> Duration {
        if steady_state {
            self.steady_state_delay
        } else {
            self.initial_delay
        }
    }
}
