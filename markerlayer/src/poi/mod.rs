//! Point-of-interest store.
//!
//! This module holds the map markers themselves and enforces the spacing
//! rule between them: a candidate closer than the proximity threshold to any
//! stored marker is rejected at admission.
//!
//! # Lifecycle
//!
//! ```text
//! PoiCandidate ──add()──► Admission::Admitted(Poi) ──update(PoiPatch)──► Poi
//!      │                          │
//!      └──► Admission::Rejected   └──remove()──► gone
//! ```
//!
//! Visibility reports from the viewport tracker arrive through
//! [`VisibilityListener`] and only touch `visual.within_viewport`.
//!
//! # Example
//!
//! ```
//! use markerlayer::geo::GeoPoint;
//! use markerlayer::poi::{PoiCandidate, PoiPatch, PoiStore, PoiStoreConfig};
//!
//! let store = PoiStore::new(PoiStoreConfig::default().with_proximity_threshold(50.0)).unwrap();
//!
//! let a = store
//!     .add(PoiCandidate::new(GeoPoint::new(45.0, 5.0).unwrap()))
//!     .admitted()
//!     .unwrap();
//!
//! // ~3 m away: rejected
//! assert!(!store.add(PoiCandidate::new(GeoPoint::new(45.00003, 5.0).unwrap())).is_admitted());
//!
//! store.update(&a.id, PoiPatch::new().title("Base camp")).unwrap();
//! assert_eq!(store.get(&a.id).unwrap().title.as_deref(), Some("Base camp"));
//! ```

mod error;
mod store;
mod types;

pub use error::PoiError;
pub use store::{
    Admission, PoiStore, PoiStoreConfig, Rejection, VisibilityListener,
    DEFAULT_PROXIMITY_THRESHOLD_M, GENERATED_ID_PREFIX,
};
pub use types::{Attributes, Poi, PoiCandidate, PoiId, PoiPatch, VisualPatch, VisualStatus};
