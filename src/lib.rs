// Watermark Library
// Composes images and text onto pooled drawing surfaces through a lazy pipeline

pub mod config;
pub mod encode;
pub mod error;
pub mod loader;
pub mod logging;
pub mod pipeline;
pub mod resource;
pub mod style;
pub mod surface;

use std::sync::OnceLock;

pub use config::{Options, OutputFormat};
pub use error::{Result, WatermarkError};
pub use loader::{DefaultLoader, Initializer, LocatorRequest, ResourceLoader};
pub use pipeline::Pipeline;
pub use resource::{data_url, Blob, ImageHandle, Resource};
pub use style::{Anchor, DrawResult, Drawer};
pub use surface::pool::{PoolStats, SurfaceLease, SurfacePool};
pub use surface::text::{Color, Font};
pub use surface::Surface;

static DEFAULT_POOL: OnceLock<SurfacePool> = OnceLock::new();

/// The process-wide pool used by [`watermark`] when the options name none.
pub fn default_pool() -> &'static SurfacePool {
    DEFAULT_POOL.get_or_init(SurfacePool::new)
}

/// Start a pipeline over `resources`.
///
/// Surfaces come from `options.pool` when set, otherwise from a fresh pool
/// capped at `options.pool_size`, otherwise from the process-wide
/// [`default_pool`].
pub fn watermark<R>(resources: impl IntoIterator<Item = R>, options: Options) -> Pipeline<Vec<ImageHandle>>
where
    R: Into<Resource>,
{
    let pool = options
        .requested_pool()
        .unwrap_or_else(|| default_pool().clone());
    Pipeline::new(resources, options, pool)
}

/// Drop every free surface held by the process-wide pool.
///
/// Meant for session teardown. Surfaces currently checked out stay valid.
pub fn destroy() {
    if let Some(pool) = DEFAULT_POOL.get() {
        pool.clear();
    }
}
