//! Error types for building a marker layer.

use thiserror::Error;

use crate::poi::PoiError;
use crate::render::SchedulerError;

/// Errors raised by [`MarkerLayer::new`](super::MarkerLayer::new).
#[derive(Debug, Error)]
pub enum LayerError {
    /// The store settings were rejected.
    #[error("Invalid store settings: {0}")]
    Store(#[from] PoiError),

    /// The scheduler could not start.
    #[error("{0}")]
    Scheduler(#[from] SchedulerError),
}
