//! The marker layer: store and scheduler wired to a draw surface.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, trace};

use super::error::LayerError;
use super::surface::{
    DrawMarker, EraseMarker, MarkerSlot, MarkerSlots, MarkerSurface, PendingDraw,
};
use crate::config::CoreConfig;
use crate::poi::{Admission, Poi, PoiCandidate, PoiError, PoiId, PoiPatch, PoiStore, VisibilityListener};
use crate::render::{RenderHandle, RenderScheduler, SchedulerSnapshot};

/// Map markers with deferred, bounded rendering.
///
/// Every admitted marker owns a draw handle. Edits and visibility changes
/// re-enqueue that handle, which the scheduler ignores while a draw is
/// already pending, so bursts of changes cost one render. Once the draw has
/// read the record, the next change gets a new handle that paints after it.
pub struct MarkerLayer {
    store: Arc<PoiStore>,
    scheduler: RenderScheduler,
    surface: Arc<dyn MarkerSurface>,
    slots: Arc<MarkerSlots>,
}

impl MarkerLayer {
    /// Builds a layer whose scheduler runs on the current tokio runtime.
    pub fn new(config: CoreConfig, surface: Arc<dyn MarkerSurface>) -> Result<Self, LayerError> {
        let store = PoiStore::new(config.store)?;
        let scheduler = RenderScheduler::current(config.scheduler)?;
        Ok(Self::from_parts(Arc::new(store), scheduler, surface))
    }

    /// Builds a layer from existing components.
    pub fn from_parts(
        store: Arc<PoiStore>,
        scheduler: RenderScheduler,
        surface: Arc<dyn MarkerSurface>,
    ) -> Self {
        Self {
            store,
            scheduler,
            surface,
            slots: Arc::new(MarkerSlots::new()),
        }
    }

    /// Returns the marker store.
    pub fn store(&self) -> &Arc<PoiStore> {
        &self.store
    }

    /// Returns the render scheduler.
    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    /// Admits a candidate and schedules its draw.
    pub fn place(&self, candidate: PoiCandidate) -> Admission {
        let admission = self.store.add(candidate);
        match &admission {
            Admission::Admitted(poi) => {
                debug!(poi_id = %poi.id, position = %poi.position, "Marker placed");
                self.schedule_draw(&poi.id);
            }
            Admission::Rejected(reason) => {
                debug!(reason = %reason, "Marker not placed");
            }
        }
        admission
    }

    /// Applies a patch and schedules a redraw.
    ///
    /// Returns `Ok(None)` if no marker has this id. A new position is not
    /// checked against the proximity threshold.
    pub fn edit(&self, id: &PoiId, patch: PoiPatch) -> Result<Option<Poi>, PoiError> {
        let updated = self.store.update(id, patch)?;
        if updated.is_some() {
            self.schedule_draw(id);
        }
        Ok(updated)
    }

    /// Removes a marker, withdraws its pending draw, and schedules an erase.
    ///
    /// A draw that is already running cannot be withdrawn; the erase waits
    /// for it to leave the surface first.
    pub fn discard(&self, id: &PoiId) -> Option<Poi> {
        let removed = self.store.remove(id)?;

        let (draw, paint) = {
            let mut slot = self.slots.entry(id.clone()).or_insert_with(MarkerSlot::new);
            (slot.draw.take(), Arc::clone(&slot.paint))
        };
        if let Some(draw) = draw {
            if !self.scheduler.cancel(&draw.handle) {
                trace!(poi_id = %id, "Draw not withdrawn, erase will follow it");
            }
        }

        let erase = RenderHandle::new(
            format!("erase:{}", id),
            EraseMarker {
                id: id.clone(),
                store: Arc::clone(&self.store),
                surface: Arc::clone(&self.surface),
                paint,
                slots: Arc::clone(&self.slots),
            },
        );
        self.scheduler.enqueue(erase);
        debug!(poi_id = %id, "Marker discarded");
        Some(removed)
    }

    /// Records a viewport report and schedules a redraw.
    ///
    /// Returns false if no marker has this id.
    pub fn report_visibility(&self, id: &PoiId, is_visible: bool) -> bool {
        let found = self.store.on_visibility_changed(id, is_visible);
        if found {
            self.schedule_draw(id);
        }
        found
    }

    /// Switches the scheduler to the short steady-state delay.
    pub fn mark_steady_state(&self) {
        info!("Marker layer entering steady state");
        self.scheduler.set_steady_state(true);
    }

    /// Returns the scheduler's current counters.
    pub fn render_snapshot(&self) -> SchedulerSnapshot {
        self.scheduler.snapshot()
    }

    /// Resolves once every scheduled render has settled.
    pub async fn wait_idle(&self) {
        self.scheduler.wait_idle().await;
    }

    /// Stops rendering. Markers stay in the store.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    fn schedule_draw(&self, id: &PoiId) {
        let draw = self
            .slots
            .entry(id.clone())
            .or_insert_with(MarkerSlot::new)
            .draw_for_change(|paint| self.new_draw(id, paint));
        self.scheduler.enqueue(draw);
    }

    fn new_draw(&self, id: &PoiId, paint: Arc<AsyncMutex<()>>) -> PendingDraw {
        let started = Arc::new(AtomicBool::new(false));
        let handle = RenderHandle::new(
            format!("draw:{}", id),
            DrawMarker {
                id: id.clone(),
                store: Arc::clone(&self.store),
                surface: Arc::clone(&self.surface),
                paint,
                started: Arc::clone(&started),
            },
        );
        PendingDraw { handle, started }
    }
}

impl VisibilityListener for MarkerLayer {
    fn report_visibility(&self, id: &PoiId, is_visible: bool) {
        MarkerLayer::report_visibility(self, id, is_visible);
    }
}
