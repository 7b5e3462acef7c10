//! Composition root: the POI store and render scheduler driving a map
//! surface.
//!
//! ```text
//!  place / edit / report_visibility            discard
//!            │                                    │
//!            ▼                                    ▼
//!      ┌──────────┐   per-marker draw handle  ┌──────────┐
//!      │ PoiStore │ ─────────┐    ┌────────── │ PoiStore │
//!      └──────────┘          ▼    ▼           └──────────┘
//!                      ┌──────────────────┐
//!                      │  RenderScheduler │
//!                      └────────┬─────────┘
//!                               ▼
//!                        MarkerSurface::draw / erase
//! ```
//!
//! Draws and erases of one marker hold that marker's paint lock, so they
//! reach the surface one at a time. A change made while a draw is running
//! gets a fresh draw handle that paints after it.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use markerlayer::config::CoreConfig;
//! use markerlayer::layer::MarkerLayer;
//! use markerlayer::geo::GeoPoint;
//! use markerlayer::poi::PoiCandidate;
//!
//! let layer = MarkerLayer::new(CoreConfig::default(), Arc::new(my_surface))?;
//! layer.place(PoiCandidate::new(GeoPoint::new(45.0, 5.0)?).with_title("Summit"));
//! layer.mark_steady_state();
//! layer.wait_idle().await;
//! ```

mod error;
mod marker_layer;
mod surface;

pub use error::LayerError;
pub use marker_layer::MarkerLayer;
pub use surface::MarkerSurface;
