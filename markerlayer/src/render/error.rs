//! Error types for render callbacks and the scheduler.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single render attempt.
///
/// The scheduler never propagates these; each one becomes a retry or, once
/// attempts are exhausted, a terminal report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The callback reported a failure.
    #[error("Render failed: {0}")]
    Failed(String),

    /// The callback did not settle within the configured timeout.
    #[error("Render timed out after {0:?}")]
    TimedOut(Duration),

    /// The callback panicked.
    #[error("Render callback panicked: {0}")]
    Panicked(String),
}

impl RenderError {
    /// Creates a plain failure from any displayable cause.
    pub fn failed(cause: impl std::fmt::Display) -> Self {
        Self::Failed(cause.to_string())
    }
}

/// Errors constructing a scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// No tokio runtime is available on the calling thread.
    #[error("No tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
