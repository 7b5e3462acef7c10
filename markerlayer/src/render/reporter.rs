//! Outcome reporting for render tasks.
//!
//! The scheduler hands every attempt outcome to a [`RenderReporter`]. Only
//! exhaustion is meant to reach the end user; individual failures are for
//! logs.

use tracing::{debug, error, warn};

use super::error::RenderError;
use super::task::RenderHandle;

/// Observer of render outcomes.
///
/// Called outside the scheduler's internal lock, so implementations may call
/// back into the scheduler.
pub trait RenderReporter: Send + Sync {
    /// A render completed. `attempts` includes the successful one.
    fn on_success(&self, handle: &RenderHandle, attempts: u32);

    /// An attempt failed. `will_retry` is false when this was the last one.
    fn on_failure(&self, handle: &RenderHandle, attempt: u32, error: &RenderError, will_retry: bool);

    /// The task was discarded after `attempts` attempts.
    ///
    /// `last_error` is `None` when the task was discarded at dispatch
    /// without running (attempt ceiling of zero).
    fn on_exhausted(&self, handle: &RenderHandle, attempts: u32, last_error: Option<&RenderError>);
}

/// Reporter that writes outcomes to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl RenderReporter for TracingReporter {
    fn on_success(&self, handle: &RenderHandle, attempts: u32) {
        debug!(
            render_id = %handle.id(),
            label = handle.label(),
            attempts,
            "Render completed"
        );
    }

    fn on_failure(&self, handle: &RenderHandle, attempt: u32, error: &RenderError, will_retry: bool) {
        warn!(
            render_id = %handle.id(),
            label = handle.label(),
            attempt,
            will_retry,
            error = %error,
            "Render attempt failed"
        );
    }

    fn on_exhausted(&self, handle: &RenderHandle, attempts: u32, last_error: Option<&RenderError>) {
        match last_error {
            Some(err) => error!(
                render_id = %handle.id(),
                label = handle.label(),
                attempts,
                error = %err,
                "Marker failed to render after {} attempts",
                attempts
            ),
            None => error!(
                render_id = %handle.id(),
                label = handle.label(),
                attempts,
                "Marker render discarded without running"
            ),
        }
    }
}
