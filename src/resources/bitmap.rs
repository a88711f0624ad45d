use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::foundation::geometry::{IntRect, IntSize};

/// Immutable premultiplied RGBA8 pixels, cheap to clone.
#[derive(Clone, Debug)]
pub struct Bitmap {
    pixmap: Arc<vello_cpu::Pixmap>,
    opaque: bool,
}

impl Bitmap {
    /// Wrap premultiplied RGBA8 bytes (`width * height * 4` long).
    pub fn from_premul_rgba8(width: u32, height: u32, bytes: &[u8]) -> TesseraResult<Self> {
        let pixmap = pixmap_from_premul_bytes(bytes, width, height)?;
        Ok(Self::from_pixmap(pixmap))
    }

    /// Premultiply straight-alpha RGBA8 bytes and wrap them.
    pub fn from_straight_rgba8(width: u32, height: u32, bytes: &[u8]) -> TesseraResult<Self> {
        let mut tmp = bytes.to_vec();
        premultiply_rgba8_in_place(&mut tmp);
        Self::from_premul_rgba8(width, height, &tmp)
    }

    /// Uniformly filled bitmap.
    pub fn solid(width: u32, height: u32, color: Rgba8) -> TesseraResult<Self> {
        checked_pixmap_dims(width, height)?;
        let px = color.premultiply().to_array();
        let len = width as usize * height as usize;
        let bytes: Vec<u8> = std::iter::repeat_n(px, len).flatten().collect();
        Self::from_premul_rgba8(width, height, &bytes)
    }

    /// Decode PNG/JPEG/... bytes.
    pub fn decode(bytes: &[u8]) -> TesseraResult<Self> {
        let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_straight_rgba8(width, height, rgba.as_raw())
    }

    pub(crate) fn from_pixmap(pixmap: vello_cpu::Pixmap) -> Self {
        let opaque = pixmap
            .data_as_u8_slice()
            .chunks_exact(4)
            .all(|px| px[3] == 255);
        Self {
            pixmap: Arc::new(pixmap),
            opaque,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        u32::from(self.pixmap.width())
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        u32::from(self.pixmap.height())
    }

    /// Size in pixels.
    pub fn size(&self) -> IntSize {
        IntSize::new(self.width() as i32, self.height() as i32)
    }

    /// `true` when every pixel has alpha 255.
    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    /// Premultiplied RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    /// Premultiplied pixel at `(x, y)`; transparent outside the bitmap.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width() || y >= self.height() {
            return [0, 0, 0, 0];
        }
        let idx = ((y as usize) * (self.width() as usize) + (x as usize)) * 4;
        let d = self.data();
        [d[idx], d[idx + 1], d[idx + 2], d[idx + 3]]
    }

    /// Straight-alpha copy of the pixels, for encoders.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data().to_vec();
        unpremultiply_rgba8_in_place(&mut out);
        out
    }

    /// Copy of the pixels inside `area` (clipped to the bitmap).
    pub fn crop(&self, area: IntRect) -> TesseraResult<Bitmap> {
        let area = area.intersect(IntRect::from_size(self.size()));
        if area.is_empty() {
            return Err(TesseraError::resource("crop area misses the bitmap"));
        }
        let stride = self.width() as usize * 4;
        let mut out = Vec::with_capacity(area.size().area() as usize * 4);
        for y in area.y..area.bottom() {
            let start = y as usize * stride + area.x as usize * 4;
            out.extend_from_slice(&self.data()[start..start + area.width as usize * 4]);
        }
        Self::from_premul_rgba8(area.width as u32, area.height as u32, &out)
    }

    pub(crate) fn pixmap(&self) -> &Arc<vello_cpu::Pixmap> {
        &self.pixmap
    }

    /// Reclaim the pixel buffer when this is the last handle to it.
    pub(crate) fn into_pixmap(self) -> Option<vello_cpu::Pixmap> {
        Arc::try_unwrap(self.pixmap).ok()
    }
}

/// Largest pixel buffer a bitmap may own.
const MAX_BITMAP_BYTES: u64 = 1 << 30;

fn checked_pixmap_dims(width: u32, height: u32) -> TesseraResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| TesseraError::validation("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| TesseraError::validation("pixmap height exceeds u16"))?;
    if u64::from(w) * u64::from(h) * 4 > MAX_BITMAP_BYTES {
        return Err(TesseraError::validation(format!(
            "pixmap {width}x{height} exceeds {MAX_BITMAP_BYTES} bytes"
        )));
    }
    Ok((w, h))
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> TesseraResult<vello_cpu::Pixmap> {
    let (w, h) = checked_pixmap_dims(width, height)?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(TesseraError::validation("pixmap byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[..3].fill(0);
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resources/bitmap.rs"]
mod tests;
