//! The POI store: admission, mutation, and removal of map markers.
//!
//! The store owns the id → record mapping behind a single lock. Admission
//! scans every stored record, so the proximity check and the insert happen
//! under the same write guard and two concurrent candidates can never both
//! slip under the threshold.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::error::PoiError;
use super::types::{Poi, PoiCandidate, PoiId, PoiPatch, VisualStatus};
use crate::geo::{self, GeoPoint};

/// Default minimum spacing between markers, in meters.
pub const DEFAULT_PROXIMITY_THRESHOLD_M: f64 = 50.0;

/// Prefix for identifiers generated by the store.
pub const GENERATED_ID_PREFIX: &str = "poi-";

/// Configuration for [`PoiStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct PoiStoreConfig {
    /// Candidates within this many meters of an existing record are rejected.
    pub proximity_threshold_m: f64,

    /// Identifier of the always-admitted starter record, if any.
    ///
    /// The starter skips the proximity check, but once stored it blocks other
    /// candidates like any record.
    pub starter_id: Option<PoiId>,
}

impl Default for PoiStoreConfig {
    fn default() -> Self {
        Self {
            proximity_threshold_m: DEFAULT_PROXIMITY_THRESHOLD_M,
            starter_id: None,
        }
    }
}

impl PoiStoreConfig {
    /// Set the proximity threshold in meters.
    pub fn with_proximity_threshold(mut self, meters: f64) -> Self {
        self.proximity_threshold_m = meters;
        self
    }

    /// Designate the starter record identifier.
    pub fn with_starter_id(mut self, id: impl Into<PoiId>) -> Self {
        self.starter_id = Some(id.into());
        self
    }

    /// Rejects a NaN, infinite, or negative threshold.
    ///
    /// A NaN threshold would compare false against every distance and admit
    /// everything.
    pub fn validate(&self) -> Result<(), PoiError> {
        let meters = self.proximity_threshold_m;
        if !meters.is_finite() || meters < 0.0 {
            return Err(PoiError::InvalidThreshold(meters));
        }
        Ok(())
    }
}

/// Why a candidate was not admitted.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// An existing record lies within the proximity threshold.
    TooClose {
        /// The first conflicting record found.
        conflicting: PoiId,
        /// Distance to that record in meters.
        distance_m: f64,
    },

    /// The candidate carried an id that is already stored.
    DuplicateId(PoiId),

    /// The candidate failed boundary validation.
    Invalid(PoiError),
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::TooClose {
                conflicting,
                distance_m,
            } => write!(f, "too close to {} ({:.1} m)", conflicting, distance_m),
            Rejection::DuplicateId(id) => write!(f, "id {} already exists", id),
            Rejection::Invalid(err) => write!(f, "{}", err),
        }
    }
}

/// Outcome of [`PoiStore::add`].
///
/// Rejection is an expected result, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// The candidate was stored; this is the stored record.
    Admitted(Poi),
    /// The candidate was turned away.
    Rejected(Rejection),
}

impl Admission {
    /// Returns true if the candidate was stored.
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted(_))
    }

    /// Returns the stored record, if admitted.
    pub fn admitted(self) -> Option<Poi> {
        match self {
            Self::Admitted(poi) => Some(poi),
            Self::Rejected(_) => None,
        }
    }
}

/// Boundary through which the viewport visibility detector reports.
///
/// The detection mechanism lives outside this crate; implementors only react
/// to the report.
pub trait VisibilityListener: Send + Sync {
    /// Called whenever a rendered element crosses the viewport boundary.
    fn report_visibility(&self, id: &PoiId, is_visible: bool);
}

/// Owns every admitted POI record.
///
/// Construct one per application and share it by reference or `Arc`;
/// callers never get direct access to the mapping.
#[derive(Debug)]
pub struct PoiStore {
    config: PoiStoreConfig,
    records: RwLock<HashMap<PoiId, Poi>>,
    next_id: AtomicU64,
}

impl PoiStore {
    /// Creates an empty store after validating `config`.
    pub fn new(config: PoiStoreConfig) -> Result<Self, PoiError> {
        config.validate()?;
        Ok(Self::unchecked(config))
    }

    /// Creates an empty store with the default threshold and no starter.
    pub fn with_defaults() -> Self {
        Self::unchecked(PoiStoreConfig::default())
    }

    fn unchecked(config: PoiStoreConfig) -> Self {
        Self {
            config,
            records: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns the store configuration.
    pub fn config(&self) -> &PoiStoreConfig {
        &self.config
    }

    /// Returns the configured proximity threshold in meters.
    pub fn proximity_threshold(&self) -> f64 {
        self.config.proximity_threshold_m
    }

    fn is_starter(&self, id: &PoiId) -> bool {
        self.config.starter_id.as_ref() == Some(id)
    }

    /// Admits a candidate unless it is spatially redundant.
    ///
    /// The candidate is compared against every stored record, the starter
    /// included; any record within the threshold rejects it. The starter
    /// candidate itself skips the check and replaces an earlier starter.
    /// O(n) in the number of stored records.
    pub fn add(&self, candidate: PoiCandidate) -> Admission {
        if let Err(err) = candidate.visual.validate() {
            return Admission::Rejected(Rejection::Invalid(err));
        }

        let mut records = self.records.write();

        let id = match candidate.id {
            Some(id) => id,
            None => self.generate_id(&records),
        };
        let is_starter = self.is_starter(&id);

        if !is_starter {
            if records.contains_key(&id) {
                debug!(poi_id = %id, "Rejected candidate with duplicate id");
                return Admission::Rejected(Rejection::DuplicateId(id));
            }

            if let Some((conflicting, distance_m)) =
                self.conflict_in(&records, &candidate.position, None)
            {
                debug!(
                    poi_id = %id,
                    conflicting = %conflicting,
                    distance_m,
                    threshold_m = self.config.proximity_threshold_m,
                    "Rejected candidate within proximity threshold"
                );
                return Admission::Rejected(Rejection::TooClose {
                    conflicting,
                    distance_m,
                });
            }
        }

        let mut visual = VisualStatus::default();
        candidate.visual.apply(&mut visual);

        let poi = Poi {
            id: id.clone(),
            position: candidate.position,
            title: candidate.title,
            visual,
            attributes: candidate.attributes,
        };

        records.insert(id.clone(), poi.clone());
        debug!(
            poi_id = %id,
            position = %poi.position,
            starter = is_starter,
            total = records.len(),
            "Admitted POI"
        );

        Admission::Admitted(poi)
    }

    /// Removes a record. Removing an unknown id is a no-op.
    pub fn remove(&self, id: &PoiId) -> Option<Poi> {
        let removed = self.records.write().remove(id);
        if removed.is_some() {
            debug!(poi_id = %id, "Removed POI");
        }
        removed
    }

    /// Merges `patch` into the stored record.
    ///
    /// Returns `Ok(None)` when `id` is not stored. The patch is validated
    /// before anything is applied.
    ///
    /// A position change is not re-checked against the proximity threshold;
    /// the spacing guarantee holds only at admission time. Use
    /// [`find_conflict`](Self::find_conflict) to check a move beforehand.
    pub fn update(&self, id: &PoiId, patch: PoiPatch) -> Result<Option<Poi>, PoiError> {
        patch.validate()?;

        let mut records = self.records.write();
        let Some(poi) = records.get_mut(id) else {
            trace!(poi_id = %id, "Update for unknown POI ignored");
            return Ok(None);
        };

        patch.apply(poi);
        debug!(poi_id = %id, "Updated POI");
        Ok(Some(poi.clone()))
    }

    /// Records a visibility report for `id`.
    ///
    /// Returns false if the record is gone; a report racing a removal is
    /// expected and harmless.
    pub fn on_visibility_changed(&self, id: &PoiId, within_viewport: bool) -> bool {
        let mut records = self.records.write();
        match records.get_mut(id) {
            Some(poi) => {
                poi.visual.within_viewport = Some(within_viewport);
                trace!(poi_id = %id, within_viewport, "Visibility changed");
                true
            }
            None => false,
        }
    }

    /// Returns a copy of the stored record.
    pub fn get(&self, id: &PoiId) -> Option<Poi> {
        self.records.read().get(id).cloned()
    }

    /// Returns true if `id` is stored.
    pub fn contains(&self, id: &PoiId) -> bool {
        self.records.read().contains_key(id)
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Returns all stored ids (arbitrary order).
    pub fn ids(&self) -> Vec<PoiId> {
        self.records.read().keys().cloned().collect()
    }

    /// Returns copies of all stored records (arbitrary order).
    pub fn snapshot(&self) -> Vec<Poi> {
        self.records.read().values().cloned().collect()
    }

    /// Finds a record within the threshold of `point`.
    ///
    /// `exclude` skips one record, typically the one being moved.
    pub fn find_conflict(&self, point: &GeoPoint, exclude: Option<&PoiId>) -> Option<(PoiId, f64)> {
        let records = self.records.read();
        self.conflict_in(&records, point, exclude)
    }

    fn conflict_in(
        &self,
        records: &HashMap<PoiId, Poi>,
        point: &GeoPoint,
        exclude: Option<&PoiId>,
    ) -> Option<(PoiId, f64)> {
        let threshold = self.config.proximity_threshold_m;
        records
            .values()
            .filter(|poi| Some(&poi.id) != exclude)
            .find_map(|poi| {
                let d = geo::distance(point, &poi.position);
                (d <= threshold).then(|| (poi.id.clone(), d))
            })
    }

    fn generate_id(&self, records: &HashMap<PoiId, Poi>) -> PoiId {
        // Skip over ids a caller may have claimed explicitly
        loop {
            let n = self.next_id.fetch_add(1, Ordering::Relaxed);
            let id = PoiId::new(format!("{}{}", GENERATED_ID_PREFIX, n));
            if !records.contains_key(&id) {
                return id;
            }
        }
    }
}

impl Default for PoiStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl VisibilityListener for PoiStore {
    fn report_visibility(&self, id: &PoiId, is_visible: bool) {
        self.on_visibility_changed(id, is_visible);
    }
}
