//! Render callbacks and the handles that identify them.
//!
//! A [`RenderHandle`] is the unit the scheduler deduplicates on. Cloning a
//! handle keeps its [`RenderId`], so "the same callback" means "a clone of the
//! same handle", never two handles that happen to wrap equal closures.
//!
//! # Example
//!
//! ```ignore
//! use markerlayer::render::{RenderCallback, RenderError, RenderHandle};
//! use futures::future::BoxFuture;
//!
//! struct DrawMarker { marker_id: String }
//!
//! impl RenderCallback for DrawMarker {
//!     fn render(&self) -> BoxFuture<'_, Result<(), RenderError>> {
//!         Box::pin(async move {
//!             // draw onto the map surface...
//!             Ok(())
//!         })
//!     }
//! }
//!
//! let handle = RenderHandle::new("draw-marker", DrawMarker { marker_id: "a".into() });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;

use super::error::RenderError;

/// Global counter for render handle identities.
static RENDER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of a render handle, shared by all of its clones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderId(u64);

impl RenderId {
    fn next() -> Self {
        Self(RENDER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the numeric id.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "render-{}", self.0)
    }
}

/// One idempotent draw-or-update operation against the map surface.
///
/// The scheduler awaits the returned future; the attempt counts as finished
/// when it resolves. Returning `Err` (or panicking) schedules a retry.
pub trait RenderCallback: Send + Sync + 'static {
    /// Performs the render.
    fn render(&self) -> BoxFuture<'_, Result<(), RenderError>>;
}

/// Adapter turning an async closure into a [`RenderCallback`].
struct FnCallback<F> {
    f: F,
}

impl<F, Fut> RenderCallback for FnCallback<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), RenderError>> + Send + 'static,
{
    fn render(&self) -> BoxFuture<'_, Result<(), RenderError>> {
        Box::pin((self.f)())
    }
}

/// Cloneable, identity-carrying reference to a render callback.
#[derive(Clone)]
pub struct RenderHandle {
    id: RenderId,
    label: Arc<str>,
    callback: Arc<dyn RenderCallback>,
}

impl RenderHandle {
    /// Wraps a callback in a new handle with a fresh identity.
    pub fn new(label: impl Into<String>, callback: impl RenderCallback) -> Self {
        Self::from_arc(label, Arc::new(callback))
    }

    /// Wraps a shared callback in a new handle with a fresh identity.
    pub fn from_arc(label: impl Into<String>, callback: Arc<dyn RenderCallback>) -> Self {
        Self {
            id: RenderId::next(),
            label: Arc::from(label.into()),
            callback,
        }
    }

    /// Builds a handle from an async closure.
    pub fn from_fn<F, Fut>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), RenderError>> + Send + 'static,
    {
        Self::new(label, FnCallback { f })
    }

    /// Returns the handle identity.
    pub fn id(&self) -> RenderId {
        self.id
    }

    /// Returns the human-readable label used in logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn callback(&self) -> Arc<dyn RenderCallback> {
        Arc::clone(&self.callback)
    }
}

impl PartialEq for RenderHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RenderHandle {}

impl fmt::Debug for RenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderHandle")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish()
    }
}
