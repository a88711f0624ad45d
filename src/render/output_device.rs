use std::collections::BTreeMap;

use crate::foundation::error::{TesseraError, TesseraResult};
use crate::foundation::geometry::{IntRect, IntSize};
use crate::frame::SoftwareFrameData;
use crate::render::surface_pool::{SurfaceDesc, SurfacePool, SurfacePoolOpts};
use crate::resources::Bitmap;

/// Persistent root canvas plus the buffers of frames the consumer has not acked yet.
pub(crate) struct SoftwareOutputDevice {
    partial_swap: bool,
    max_frames_pending: usize,
    canvas: Option<vello_cpu::Pixmap>,
    damage_rect: IntRect,
    painting: bool,
    next_frame_id: u64,
    in_flight: BTreeMap<u64, Bitmap>,
    pool: SurfacePool,
}

impl SoftwareOutputDevice {
    pub(crate) fn new(partial_swap: bool, max_frames_pending: usize, pool: SurfacePoolOpts) -> Self {
        Self {
            partial_swap,
            max_frames_pending: max_frames_pending.max(1),
            canvas: None,
            damage_rect: IntRect::default(),
            painting: false,
            next_frame_id: 1,
            in_flight: BTreeMap::new(),
            pool: SurfacePool::new(pool),
        }
    }

    /// Start painting a `viewport`-sized frame and return the region that must be redrawn.
    ///
    /// Without partial swap, or when the canvas is (re)allocated, that is the whole
    /// viewport; otherwise `damage` clipped to it.
    pub(crate) fn begin_paint(&mut self, viewport: IntSize, damage: IntRect) -> TesseraResult<IntRect> {
        if self.painting {
            return Err(TesseraError::contract("begin_paint while a paint is in progress"));
        }
        let desc = SurfaceDesc::for_size(viewport)?;
        let full = IntRect::from_size(viewport);
        let reallocated = match &self.canvas {
            Some(c) => SurfaceDesc::of(c) != desc,
            None => true,
        };
        if reallocated {
            if let Some(old) = self.canvas.take() {
                self.pool.release(old);
            }
            self.canvas = Some(self.pool.borrow(desc));
        }

        self.damage_rect = if self.partial_swap && !reallocated {
            damage.intersect(full)
        } else {
            full
        };
        self.painting = true;
        Ok(self.damage_rect)
    }

    pub(crate) fn canvas_mut(&mut self) -> TesseraResult<&mut vello_cpu::Pixmap> {
        if !self.painting {
            return Err(TesseraError::contract("canvas used outside begin_paint/end_paint"));
        }
        self.canvas
            .as_mut()
            .ok_or_else(|| TesseraError::contract("output device has no canvas"))
    }

    /// Snapshot the canvas into a frame buffer that stays reserved until acked.
    pub(crate) fn end_paint(&mut self) -> TesseraResult<SoftwareFrameData> {
        if !self.painting {
            return Err(TesseraError::contract("end_paint without begin_paint"));
        }
        if self.in_flight.len() >= self.max_frames_pending {
            return Err(TesseraError::contract(format!(
                "{} software frames already pending; wait for an ack",
                self.in_flight.len()
            )));
        }
        let canvas = self
            .canvas
            .as_ref()
            .ok_or_else(|| TesseraError::contract("output device has no canvas"))?;
        let desc = SurfaceDesc::of(canvas);
        let mut buffer = self.pool.borrow(desc);
        buffer
            .data_as_u8_slice_mut()
            .copy_from_slice(canvas.data_as_u8_slice());
        self.painting = false;

        let id = self.next_frame_id;
        self.next_frame_id += 1;
        let pixels = Bitmap::from_pixmap(buffer);
        self.in_flight.insert(id, pixels.clone());
        tracing::debug!(frame = id, damage = %self.damage_rect, pending = self.in_flight.len(), "software frame ready");

        Ok(SoftwareFrameData {
            id,
            size: IntSize::new(i32::from(desc.width), i32::from(desc.height)),
            damage_rect: self.damage_rect,
            pixels,
        })
    }

    /// Abort the current paint; the canvas keeps whatever was drawn.
    pub(crate) fn discard_paint(&mut self) {
        self.painting = false;
    }

    /// The consumer is done with `frame_id`; its buffer goes back to the pool when no
    /// other handle remains.
    pub(crate) fn reclaim(&mut self, frame_id: u64) {
        let Some(bitmap) = self.in_flight.remove(&frame_id) else {
            tracing::warn!(frame = frame_id, "ack for a software frame that is not pending");
            return;
        };
        if let Some(pixmap) = bitmap.into_pixmap() {
            self.pool.release(pixmap);
        }
    }

    pub(crate) fn pending_frames(&self) -> usize {
        self.in_flight.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/output_device.rs"]
mod tests;
