//! LRU cache for rendered page surfaces

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use super::types::PageSurface;

/// Cache key for rendered surfaces
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceKey {
    /// 0-based page index
    pub page: usize,
    /// Zoom factor, stored as millionths for stable hashing
    pub scale_millionths: u32,
}

impl SurfaceKey {
    #[must_use]
    pub fn new(page: usize, scale: f32) -> Self {
        Self {
            page,
            scale_millionths: (scale * 1_000_000.0) as u32,
        }
    }
}

/// LRU cache of rendered page surfaces.
///
/// Invalidated wholesale whenever the document, segment list, or zoom
/// factor changes; within one configuration it spares re-rendering pages
/// the viewer already produced.
pub struct SurfaceCache {
    cache: LruCache<SurfaceKey, Arc<PageSurface>>,
}

impl SurfaceCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).expect("1 is non-zero")),
            ),
        }
    }

    #[must_use]
    pub fn get(&mut self, key: &SurfaceKey) -> Option<Arc<PageSurface>> {
        self.cache.get(key).cloned()
    }

    #[must_use]
    pub fn contains(&self, key: &SurfaceKey) -> bool {
        self.cache.contains(key)
    }

    pub fn insert(&mut self, key: SurfaceKey, surface: PageSurface) -> Arc<PageSurface> {
        let arc = Arc::new(surface);
        self.cache.put(key, arc.clone());
        arc
    }

    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
