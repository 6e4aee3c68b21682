//! Free-list of reusable surfaces.
//!
//! A surface is either on the free list or checked out by exactly one owner.
//! [`SurfacePool::release`] takes the surface by value, so handing the same
//! surface back twice cannot be expressed. [`SurfaceLease`] returns its
//! surface on drop, which makes every exit path of a draw step release.

use parking_lot::Mutex;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use super::Surface;

/// Usage counters of a pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Surfaces constructed because the free list was empty.
    pub created: u64,
    /// Acquisitions served from the free list.
    pub reused: u64,
    /// Surfaces handed back and kept on the free list.
    pub released: u64,
    /// Surfaces handed back and dropped because the free list was full.
    pub discarded: u64,
    /// Surfaces currently on the free list.
    pub free: usize,
    /// Surfaces acquired and not yet released or detached.
    pub checked_out: usize,
}

struct PoolInner {
    free: Vec<Surface>,
    capacity: Option<usize>,
    stats: PoolStats,
}

/// Shared handle to a surface free-list. Cloning shares the pool.
#[derive(Clone)]
pub struct SurfacePool {
    inner: Arc<Mutex<PoolInner>>,
}

impl fmt::Debug for SurfacePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("SurfacePool")
            .field("capacity", &inner.capacity)
            .field("stats", &inner.stats)
            .finish()
    }
}

impl Default for SurfacePool {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfacePool {
    /// An unbounded pool.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A pool retaining at most `capacity` free surfaces.
    ///
    /// The cap applies to the free list only; `acquire` never blocks or fails.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::build(Some(capacity))
    }

    fn build(capacity: Option<usize>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PoolInner {
                free: Vec::new(),
                capacity,
                stats: PoolStats::default(),
            })),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.inner.lock().capacity
    }

    /// Whether two handles refer to the same pool.
    pub fn same_pool(&self, other: &SurfacePool) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Take a surface off the free list, or create a new 0×0 one.
    pub fn acquire(&self) -> Surface {
        let mut inner = self.inner.lock();
        inner.stats.checked_out += 1;

        match inner.free.pop() {
            Some(surface) => {
                inner.stats.reused += 1;
                inner.stats.free = inner.free.len();
                tracing::trace!(surface = %surface.id(), "reusing pooled surface");
                surface
            }
            None => {
                inner.stats.created += 1;
                let surface = Surface::new();
                tracing::trace!(surface = %surface.id(), "creating surface");
                surface
            }
        }
    }

    /// [`acquire`](Self::acquire) wrapped in a guard that releases on drop.
    pub fn lease(&self) -> SurfaceLease {
        SurfaceLease {
            pool: self.clone(),
            surface: Some(self.acquire()),
        }
    }

    /// Hand a surface back. Its content is cleared.
    ///
    /// When the free list is at capacity the surface is dropped instead.
    pub fn release(&self, mut surface: Surface) {
        let mut inner = self.inner.lock();
        inner.stats.checked_out = inner.stats.checked_out.saturating_sub(1);

        if inner.capacity.is_some_and(|cap| inner.free.len() >= cap) {
            inner.stats.discarded += 1;
            tracing::trace!(surface = %surface.id(), "free list full, discarding surface");
            return;
        }

        surface.clear();
        tracing::trace!(surface = %surface.id(), "releasing surface");
        inner.free.push(surface);
        inner.stats.released += 1;
        inner.stats.free = inner.free.len();
    }

    /// Drop every free surface. Checked-out surfaces are unaffected.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let dropped = inner.free.len();
        inner.free.clear();
        inner.stats.free = 0;
        tracing::debug!(dropped, "cleared surface pool");
    }

    pub fn stats(&self) -> PoolStats {
        self.inner.lock().stats
    }

    /// Stop tracking a checked-out surface; it will never come back.
    fn forget(&self) {
        let mut inner = self.inner.lock();
        inner.stats.checked_out = inner.stats.checked_out.saturating_sub(1);
    }
}

/// A checked-out surface that returns to its pool when dropped.
pub struct SurfaceLease {
    pool: SurfacePool,
    surface: Option<Surface>,
}

impl SurfaceLease {
    /// Return the surface to the pool now.
    pub fn release(self) {
        drop(self);
    }

    /// Keep the surface for good, outside the pool's accounting.
    pub fn detach(mut self) -> Surface {
        self.pool.forget();
        self.surface
            .take()
            .expect("lease holds its surface until dropped")
    }

    pub fn pool(&self) -> &SurfacePool {
        &self.pool
    }
}

impl fmt::Debug for SurfaceLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SurfaceLease").field(&self.surface).finish()
    }
}

impl Deref for SurfaceLease {
    type Target = Surface;

    fn deref(&self) -> &Surface {
        self.surface
            .as_ref()
            .expect("lease holds its surface until dropped")
    }
}

impl DerefMut for SurfaceLease {
    fn deref_mut(&mut self) -> &mut Surface {
        self.surface
            .as_mut()
            .expect("lease holds its surface until dropped")
    }
}

impl Drop for SurfaceLease {
    fn drop(&mut self) {
        if let Some(surface) = self.surface.take() {
            self.pool.release(surface);
        }
    }
}
