//! A draw surface that writes markers to the log.

use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::BoxFuture;
use tracing::info;

use markerlayer::layer::MarkerSurface;
use markerlayer::poi::{Poi, PoiId};
use markerlayer::render::RenderError;

/// Logs every draw and erase instead of painting anything.
#[derive(Debug, Default)]
pub struct LogSurface {
    draws: AtomicUsize,
}

impl LogSurface {
    /// Number of draws performed so far.
    pub fn draws(&self) -> usize {
        self.draws.load(Ordering::Relaxed)
    }
}

impl MarkerSurface for LogSurface {
    fn draw(&self, poi: Poi) -> BoxFuture<'_, Result<(), RenderError>> {
        Box::pin(async move {
            self.draws.fetch_add(1, Ordering::Relaxed);
            info!(
                poi_id = %poi.id,
                lat = poi.position.lat(),
                lon = poi.position.lon(),
                title = poi.title.as_deref().unwrap_or(""),
                scale = poi.visual.scale,
                "Draw marker"
            );
            Ok(())
        })
    }

    fn erase(&self, id: PoiId) -> BoxFuture<'_, Result<(), RenderError>> {
        Box::pin(async move {
            info!(poi_id = %id, "Erase marker");
            Ok(())
        })
    }
}
