use std::collections::HashMap;

use crate::foundation::error::{TesseraError, TesseraResult};
use crate::foundation::geometry::IntSize;
use crate::render::composite::clear_pixmap;

/// Pool configuration for cached surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SurfacePoolOpts {
    /// Maximum bytes retained across all buckets.
    pub max_pool_bytes: usize,
    /// Maximum number of retained surfaces per size bucket.
    pub max_surfaces_per_bucket: usize,
}

impl Default for SurfacePoolOpts {
    fn default() -> Self {
        Self {
            max_pool_bytes: 256 * 1024 * 1024,
            max_surfaces_per_bucket: 8,
        }
    }
}

/// Size of a premultiplied RGBA8 surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SurfaceDesc {
    pub(crate) width: u16,
    pub(crate) height: u16,
}

impl SurfaceDesc {
    pub(crate) fn for_size(size: IntSize) -> TesseraResult<Self> {
        let (width, height) = size.to_u16().ok_or_else(|| {
            TesseraError::validation(format!("surface size {size} exceeds u16"))
        })?;
        if width == 0 || height == 0 {
            return Err(TesseraError::validation(format!(
                "surface size {size} must not be empty"
            )));
        }
        Ok(Self { width, height })
    }

    pub(crate) fn of(pixmap: &vello_cpu::Pixmap) -> Self {
        Self {
            width: pixmap.width(),
            height: pixmap.height(),
        }
    }

    fn byte_len(self) -> usize {
        usize::from(self.width) * usize::from(self.height) * 4
    }
}

/// Allocation counters, mostly for tests and debug logs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SurfacePoolStats {
    /// Surfaces currently parked in the pool.
    pub retained_surfaces: usize,
    /// Bytes currently parked in the pool.
    pub retained_bytes: usize,
    /// Fresh allocations made.
    pub alloc_surfaces: u64,
    /// Bytes of fresh allocations made.
    pub alloc_bytes: u64,
    /// Borrows served from the pool.
    pub reused_surfaces: u64,
    /// Released surfaces dropped because a cap was hit.
    pub dropped_on_release: u64,
}

/// Bounded pool of CPU pixmaps keyed by size.
///
/// Borrow/release happen per quad or per pass, never per pixel.
pub(crate) struct SurfacePool {
    opts: SurfacePoolOpts,
    stats: SurfacePoolStats,
    buckets: HashMap<SurfaceDesc, Vec<vello_cpu::Pixmap>>,
}

impl SurfacePool {
    pub(crate) fn new(opts: SurfacePoolOpts) -> Self {
        Self {
            opts,
            stats: SurfacePoolStats::default(),
            buckets: HashMap::new(),
        }
    }

    pub(crate) fn stats(&self) -> SurfacePoolStats {
        self.stats.clone()
    }

    /// A transparent pixmap of `desc`'s size.
    pub(crate) fn borrow(&mut self, desc: SurfaceDesc) -> vello_cpu::Pixmap {
        if let Some(mut p) = self.buckets.get_mut(&desc).and_then(Vec::pop) {
            self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_sub(1);
            self.stats.retained_bytes = self.stats.retained_bytes.saturating_sub(desc.byte_len());
            self.stats.reused_surfaces = self.stats.reused_surfaces.saturating_add(1);
            clear_pixmap(&mut p, [0, 0, 0, 0]);
            return p;
        }

        self.stats.alloc_surfaces = self.stats.alloc_surfaces.saturating_add(1);
        self.stats.alloc_bytes = self
            .stats
            .alloc_bytes
            .saturating_add(desc.byte_len() as u64);
        vello_cpu::Pixmap::new(desc.width, desc.height)
    }

    pub(crate) fn release(&mut self, pixmap: vello_cpu::Pixmap) {
        if self.opts.max_pool_bytes == 0 || self.opts.max_surfaces_per_bucket == 0 {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let desc = SurfaceDesc::of(&pixmap);
        let bytes = desc.byte_len();
        if self.stats.retained_bytes.saturating_add(bytes) > self.opts.max_pool_bytes {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let bucket = self.buckets.entry(desc).or_default();
        if bucket.len() >= self.opts.max_surfaces_per_bucket {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        bucket.push(pixmap);
        self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_add(1);
        self.stats.retained_bytes = self.stats.retained_bytes.saturating_add(bytes);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface_pool.rs"]
mod tests;
