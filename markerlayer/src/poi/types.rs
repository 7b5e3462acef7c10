//! Record, candidate, and patch types for points of interest.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::PoiError;
use crate::geo::GeoPoint;

/// Caller-supplied attributes (color, category, icon, ...).
///
/// The store preserves these opaquely; none of its invariants depend on them.
pub type Attributes = Map<String, Value>;

/// Stable identifier of a POI record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoiId(String);

impl PoiId {
    /// Creates an identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PoiId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PoiId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PoiId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Render-affecting flags attached to every stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualStatus {
    /// Whether the marker is inside the viewport; `None` until the
    /// visibility tracker first reports.
    pub within_viewport: Option<bool>,
    /// Whether the marker is in front of the globe/terrain occluder.
    pub front_of_occluder: bool,
    /// Marker scale factor (always positive and finite).
    pub scale: f64,
    /// Whether to draw the compact marker form; `None` lets the view decide.
    pub show_compact_form: Option<bool>,
    /// Whether the marker should be drawn at all.
    pub visible: bool,
}

impl Default for VisualStatus {
    fn default() -> Self {
        Self {
            within_viewport: None,
            front_of_occluder: true,
            scale: 1.0,
            show_compact_form: None,
            visible: true,
        }
    }
}

/// Partial update of a [`VisualStatus`]. Unset fields are left alone.
///
/// The nullable flags use `Option<Option<bool>>` so a patch can reset them
/// back to "unknown".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisualPatch {
    /// New viewport flag; `Some(None)` resets it to unknown.
    pub within_viewport: Option<Option<bool>>,
    /// New occlusion flag.
    pub front_of_occluder: Option<bool>,
    /// New scale factor; must be positive and finite.
    pub scale: Option<f64>,
    /// New compact-form flag; `Some(None)` resets it to unknown.
    pub show_compact_form: Option<Option<bool>>,
    /// New drawing flag.
    pub visible: Option<bool>,
}

impl VisualPatch {
    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Checks every field before anything is applied.
    pub fn validate(&self) -> Result<(), PoiError> {
        if let Some(scale) = self.scale {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(PoiError::InvalidScale(scale));
            }
        }
        Ok(())
    }

    /// Applies the set fields onto `status`.
    pub(crate) fn apply(&self, status: &mut VisualStatus) {
        if let Some(within) = self.within_viewport {
            status.within_viewport = within;
        }
        if let Some(front) = self.front_of_occluder {
            status.front_of_occluder = front;
        }
        if let Some(scale) = self.scale {
            status.scale = scale;
        }
        if let Some(compact) = self.show_compact_form {
            status.show_compact_form = compact;
        }
        if let Some(visible) = self.visible {
            status.visible = visible;
        }
    }
}

/// A stored point of interest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Poi {
    /// Unique within the store; never changes after admission.
    pub id: PoiId,
    /// Where the marker sits.
    pub position: GeoPoint,
    /// Optional display label.
    pub title: Option<String>,
    /// Rendering state.
    pub visual: VisualStatus,
    /// Caller-defined data, stored and returned untouched.
    pub attributes: Attributes,
}

/// A POI awaiting admission. The id is generated by the store if absent.
#[derive(Debug, Clone, PartialEq)]
pub struct PoiCandidate {
    /// Explicit identifier, or `None` to let the store generate one.
    pub id: Option<PoiId>,
    /// Position checked against the proximity threshold.
    pub position: GeoPoint,
    /// Optional display label.
    pub title: Option<String>,
    /// Overrides applied on top of [`VisualStatus::default`].
    pub visual: VisualPatch,
    /// Caller-defined data copied into the record.
    pub attributes: Attributes,
}

impl PoiCandidate {
    /// Creates a candidate at `position` with default visuals and no attributes.
    pub fn new(position: GeoPoint) -> Self {
        Self {
            id: None,
            position,
            title: None,
            visual: VisualPatch::default(),
            attributes: Attributes::new(),
        }
    }

    /// Set an explicit identifier.
    pub fn with_id(mut self, id: impl Into<PoiId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Override parts of the default visual status.
    pub fn with_visual(mut self, visual: VisualPatch) -> Self {
        self.visual = visual;
        self
    }

    /// Add one opaque attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Field-by-field update of a stored record.
///
/// Only the fields that are mutable after creation appear here; the id never
/// changes. Attributes are merged shallowly: keys present in the patch
/// overwrite stored keys, other stored keys are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoiPatch {
    /// New title.
    pub title: Option<String>,
    /// New position; not re-checked against the threshold.
    pub position: Option<GeoPoint>,
    /// Visual fields to change.
    pub visual: VisualPatch,
    /// Keys to insert or overwrite.
    pub attributes: Attributes,
}

impl PoiPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a new title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Move the record. The proximity threshold is not re-checked.
    pub fn position(mut self, position: GeoPoint) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the marker scale.
    pub fn scale(mut self, scale: f64) -> Self {
        self.visual.scale = Some(scale);
        self
    }

    /// Show or hide the marker.
    pub fn visible(mut self, visible: bool) -> Self {
        self.visual.visible = Some(visible);
        self
    }

    /// Set whether the marker is in front of the occluder.
    pub fn front_of_occluder(mut self, front: bool) -> Self {
        self.visual.front_of_occluder = Some(front);
        self
    }

    /// Set or clear the compact-form preference.
    pub fn show_compact_form(mut self, compact: Option<bool>) -> Self {
        self.visual.show_compact_form = Some(compact);
        self
    }

    /// Overwrite one attribute key.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Checks the patch before any field is applied.
    pub fn validate(&self) -> Result<(), PoiError> {
        self.visual.validate()
    }

    /// Merges the patch into `poi`. Callers validate first.
    pub(crate) fn apply(self, poi: &mut Poi) {
        if let Some(title) = self.title {
            poi.title = Some(title);
        }
        if let Some(position) = self.position {
            poi.position = position;
        }
        self.visual.apply(&mut poi.visual);
        for (key, value) in self.attributes {
            poi.attributes.insert(key, value);
        }
    }
}
