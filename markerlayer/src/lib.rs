//! MarkerLayer - point-of-interest management for map views
//!
//! This library keeps a set of map markers spaced apart by a minimum
//! great-circle distance and renders them through a deferred scheduler that
//! bounds concurrency and retries failed draws.
//!
//! # Modules
//!
//! - [`geo`]: Haversine distance and validated coordinates
//! - [`poi`]: the marker store and its admission rule
//! - [`render`]: the bounded, retrying render scheduler
//! - [`layer`]: store and scheduler wired to a draw surface
//! - [`config`]: INI configuration loading
//! - [`logging`]: tracing subscriber setup

pub mod config;
pub mod geo;
pub mod layer;
pub mod logging;
pub mod poi;
pub mod render;
