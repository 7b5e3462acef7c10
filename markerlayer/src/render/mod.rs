//! Deferred rendering of map markers.
//!
//! Drawing a marker is expensive and the map surface may not be ready when a
//! marker is first placed. Renders are therefore queued as callbacks and run
//! later by a [`RenderScheduler`]:
//!
//! - at most `max_concurrent` callbacks are armed or executing at once
//! - tasks start in FIFO order; a failed task retries behind later work
//! - a task that fails `max_attempts` times is dropped and reported
//! - enqueuing a handle that is already pending is a no-op
//!
//! # Module layout
//!
//! - `task`: [`RenderCallback`] and the identity-carrying [`RenderHandle`]
//! - `queue`: the FIFO `PendingQueue`
//! - `scheduler`: the [`RenderScheduler`] engine
//! - `reporter`: outcome observers ([`TracingReporter`] by default)
//! - `metrics`: lifetime counters and [`SchedulerSnapshot`]

mod config;
mod error;
mod metrics;
mod queue;
mod reporter;
mod scheduler;
mod task;

pub use config::{
    SchedulerConfig, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_CONCURRENT,
    DEFAULT_STEADY_STATE_DELAY_MS,
};
pub use error::{RenderError, SchedulerError};
pub use metrics::SchedulerSnapshot;
pub use reporter::{RenderReporter, TracingReporter};
pub use scheduler::RenderScheduler;
pub use task::{RenderCallback, RenderHandle, RenderId};
