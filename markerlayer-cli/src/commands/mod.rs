//! CLI command implementations.

pub mod distance;
pub mod load;
