//! Error types for the POI store.

use thiserror::Error;

/// Errors raised when a candidate, patch, or store setting fails boundary
/// validation.
///
/// Rejected admissions and missing ids are not errors; they are reported
/// through [`Admission`](super::Admission) and `Option` returns.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PoiError {
    /// Scale must be positive and finite.
    #[error("Invalid marker scale: {0} (must be positive and finite)")]
    InvalidScale(f64),

    /// Proximity threshold must be finite and non-negative.
    #[error("Invalid proximity threshold: {0} m (must be finite and non-negative)")]
    InvalidThreshold(f64),
}
