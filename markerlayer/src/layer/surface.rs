//! The draw primitive markers are rendered onto, and the render callbacks
//! that drive it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::Mutex as AsyncMutex;
use tracing::trace;

use crate::poi::{Poi, PoiId, PoiStore};
use crate::render::{RenderCallback, RenderError, RenderHandle};

/// A map surface that can draw and erase markers.
///
/// Both operations must be idempotent: the scheduler may retry them, and a
/// marker may be drawn again after every edit.
pub trait MarkerSurface: Send + Sync + 'static {
    /// Draws `poi`, or redraws it in place if already shown.
    fn draw(&self, poi: Poi) -> BoxFuture<'_, Result<(), RenderError>>;

    /// Removes the marker from the surface. Erasing an unknown marker is
    /// not an error.
    fn erase(&self, id: PoiId) -> BoxFuture<'_, Result<(), RenderError>>;
}

/// Render bookkeeping kept per marker id.
pub(crate) type MarkerSlots = DashMap<PoiId, MarkerSlot>;

/// One marker's paint lock and the draw that later changes coalesce onto.
pub(crate) struct MarkerSlot {
    /// Held by every draw and erase of this marker while it touches the
    /// surface.
    pub(crate) paint: Arc<AsyncMutex<()>>,
    /// Dropped by a discard; replaced once the draw has started.
    pub(crate) draw: Option<PendingDraw>,
}

impl MarkerSlot {
    pub(crate) fn new() -> Self {
        Self {
            paint: Arc::new(AsyncMutex::new(())),
            draw: None,
        }
    }

    /// Returns the draw a change should be enqueued with, creating a new one
    /// if the current draw already read the record.
    pub(crate) fn draw_for_change(
        &mut self,
        create: impl FnOnce(Arc<AsyncMutex<()>>) -> PendingDraw,
    ) -> RenderHandle {
        if let Some(draw) = self.draw.as_ref().filter(|draw| !draw.has_started()) {
            return draw.handle.clone();
        }
        let draw = create(Arc::clone(&self.paint));
        let handle = draw.handle.clone();
        self.draw = Some(draw);
        handle
    }
}

/// A draw handle plus the flag its callback raises when it starts.
pub(crate) struct PendingDraw {
    pub(crate) handle: RenderHandle,
    pub(crate) started: Arc<AtomicBool>,
}

impl PendingDraw {
    fn has_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

/// Draws the latest stored version of one marker.
///
/// The record is read once the paint lock is held, not when the draw is
/// queued, so edits made while it waits collapse into one render.
pub(crate) struct DrawMarker {
    pub(crate) id: PoiId,
    pub(crate) store: Arc<PoiStore>,
    pub(crate) surface: Arc<dyn MarkerSurface>,
    pub(crate) paint: Arc<AsyncMutex<()>>,
    pub(crate) started: Arc<AtomicBool>,
}

impl RenderCallback for DrawMarker {
    fn render(&self) -> BoxFuture<'_, Result<(), RenderError>> {
        Box::pin(async move {
            let _paint = self.paint.lock().await;
            // Raised before the read: a change that still sees it lowered
            // is visible to the read below.
            self.started.store(true, Ordering::SeqCst);
            match self.store.get(&self.id) {
                Some(poi) => self.surface.draw(poi).await,
                None => {
                    trace!(poi_id = %self.id, "Marker gone before draw, skipping");
                    Ok(())
                }
            }
        })
    }
}

/// Erases one marker unless it has been placed again since.
///
/// Waits for any draw of the same marker still on the surface, then drops
/// the marker's slot.
pub(crate) struct EraseMarker {
    pub(crate) id: PoiId,
    pub(crate) store: Arc<PoiStore>,
    pub(crate) surface: Arc<dyn MarkerSurface>,
    pub(crate) paint: Arc<AsyncMutex<()>>,
    pub(crate) slots: Arc<MarkerSlots>,
}

impl RenderCallback for EraseMarker {
    fn render(&self) -> BoxFuture<'_, Result<(), RenderError>> {
        Box::pin(async move {
            let _paint = self.paint.lock().await;
            if self.store.contains(&self.id) {
                trace!(poi_id = %self.id, "Marker placed again before erase, skipping");
                return Ok(());
            }
            self.surface.erase(self.id.clone()).await?;
            self.slots
                .remove_if(&self.id, |_, _| !self.store.contains(&self.id));
            Ok(())
        })
    }
}
