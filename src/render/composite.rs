use crate::foundation::error::{TesseraError, TesseraResult};
use crate::foundation::geometry::IntRect;
use crate::foundation::math::mul_div255_u8;
use crate::quad::BlendMode;

/// How a rasterized quad lands in its target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum CompositeOp {
    /// Overwrite destination pixels.
    Source,
    /// Source-over scaled by `opacity`, with a separable blend mode.
    Blend { opacity: f32, mode: BlendMode },
}

pub(crate) fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    for px in pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

/// Fill `rect` (clipped to the pixmap) with premultiplied `rgba`.
pub(crate) fn clear_rect(pixmap: &mut vello_cpu::Pixmap, rect: IntRect, rgba: [u8; 4]) {
    let bounds = pixmap_bounds(pixmap);
    let rect = rect.intersect(bounds);
    if rect.is_empty() {
        return;
    }
    let stride = bounds.width as usize * 4;
    let data = pixmap.data_as_u8_slice_mut();
    for y in rect.y..rect.bottom() {
        let start = y as usize * stride + rect.x as usize * 4;
        for px in data[start..start + rect.width as usize * 4].chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }
}

pub(crate) fn pixmap_bounds(pixmap: &vello_cpu::Pixmap) -> IntRect {
    IntRect::new(
        0,
        0,
        i32::from(pixmap.width()),
        i32::from(pixmap.height()),
    )
}

/// Composite `src`, positioned with its top-left at `src_origin` in `dst` pixel space,
/// into the `dst_rect` region of `dst`.
pub(crate) fn composite_region(
    dst: &mut vello_cpu::Pixmap,
    dst_rect: IntRect,
    src: &vello_cpu::Pixmap,
    src_origin: (i32, i32),
    op: CompositeOp,
) -> TesseraResult<()> {
    let src_in_dst = pixmap_bounds(src).offset(src_origin.0, src_origin.1);
    let rect = dst_rect.intersect(pixmap_bounds(dst)).intersect(src_in_dst);
    if rect.is_empty() {
        return Ok(());
    }

    let dst_stride = usize::from(dst.width()) * 4;
    let src_stride = usize::from(src.width()) * 4;
    let row_len = rect.width as usize * 4;
    let src_data = src.data_as_u8_slice();
    let dst_data = dst.data_as_u8_slice_mut();

    for y in rect.y..rect.bottom() {
        let d0 = y as usize * dst_stride + rect.x as usize * 4;
        let s0 = (y - src_origin.1) as usize * src_stride + (rect.x - src_origin.0) as usize * 4;
        let d_row = &mut dst_data[d0..d0 + row_len];
        let s_row = &src_data[s0..s0 + row_len];
        match op {
            CompositeOp::Source => d_row.copy_from_slice(s_row),
            CompositeOp::Blend { opacity, mode } => {
                composite_over_rgba8_premul(d_row, s_row, opacity, mode)?
            }
        }
    }
    Ok(())
}

/// Multiply every premultiplied channel of `src` by the alpha of `mask`.
pub(crate) fn mask_apply_alpha_in_place(src: &mut [u8], mask: &[u8]) -> TesseraResult<()> {
    if src.len() != mask.len() || !src.len().is_multiple_of(4) {
        return Err(TesseraError::validation(
            "mask_apply_alpha_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (s, m) in src.chunks_exact_mut(4).zip(mask.chunks_exact(4)) {
        let w16 = u16::from(m[3]);
        for c in s.iter_mut() {
            *c = mul_div255_u8(u16::from(*c), w16);
        }
    }
    Ok(())
}

pub(crate) fn premul_over_in_place_opacity(
    dst: &mut [u8],
    src: &[u8],
    opacity: f32,
) -> TesseraResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(TesseraError::validation(
            "premul_over_in_place_opacity expects equal-length rgba8 buffers",
        ));
    }
    let op = ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16;
    if op == 0 {
        return Ok(());
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = mul_div255_u8(u16::from(s[3]), op);
        if sa == 0 {
            continue;
        }
        let inv = 255u16 - u16::from(sa);

        d[3] = add_sat_u8(sa, mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            let sc = mul_div255_u8(u16::from(s[c]), op);
            let dc = mul_div255_u8(u16::from(d[c]), inv);
            d[c] = add_sat_u8(sc, dc);
        }
    }
    Ok(())
}

/// Source-over of premultiplied rows with a separable blend mode.
///
/// The blend kernel is picked once per row, never per pixel.
pub(crate) fn composite_over_rgba8_premul(
    dst: &mut [u8],
    src: &[u8],
    opacity: f32,
    blend: BlendMode,
) -> TesseraResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(TesseraError::validation(
            "composite_over_rgba8_premul expects equal-length rgba8 buffers",
        ));
    }

    match blend {
        BlendMode::Normal => premul_over_in_place_opacity(dst, src, opacity),
        BlendMode::Multiply => composite_blend(dst, src, opacity, |s, d| s * d),
        BlendMode::Screen => composite_blend(dst, src, opacity, |s, d| s + d - s * d),
        BlendMode::Overlay => composite_blend(dst, src, opacity, |s, d| hard_light(d, s)),
        BlendMode::Darken => composite_blend(dst, src, opacity, |s, d| s.min(d)),
        BlendMode::Lighten => composite_blend(dst, src, opacity, |s, d| s.max(d)),
        BlendMode::ColorDodge => composite_blend(dst, src, opacity, |s, d| {
            if d <= 0.0 {
                0.0
            } else if s >= 1.0 {
                1.0
            } else {
                (d / (1.0 - s)).min(1.0)
            }
        }),
        BlendMode::ColorBurn => composite_blend(dst, src, opacity, |s, d| {
            if d >= 1.0 {
                1.0
            } else if s <= 0.0 {
                0.0
            } else {
                1.0 - ((1.0 - d) / s).min(1.0)
            }
        }),
        BlendMode::SoftLight => composite_blend(dst, src, opacity, |s, d| {
            if s <= 0.5 {
                d - (1.0 - 2.0 * s) * d * (1.0 - d)
            } else {
                let g = if d <= 0.25 {
                    ((16.0 * d - 12.0) * d + 4.0) * d
                } else {
                    d.sqrt()
                };
                d + (2.0 * s - 1.0) * (g - d)
            }
        }),
        BlendMode::HardLight => composite_blend(dst, src, opacity, hard_light),
        BlendMode::Difference => composite_blend(dst, src, opacity, |s, d| (d - s).abs()),
        BlendMode::Exclusion => composite_blend(dst, src, opacity, |s, d| d + s - 2.0 * d * s),
    }
}

fn hard_light(s: f32, d: f32) -> f32 {
    if s <= 0.5 {
        2.0 * s * d
    } else {
        1.0 - 2.0 * (1.0 - s) * (1.0 - d)
    }
}

#[inline(always)]
fn composite_blend<F>(dst: &mut [u8], src: &[u8], opacity: f32, blend_fn: F) -> TesseraResult<()>
where
    F: Fn(f32, f32) -> f32,
{
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return Ok(());
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        // out_a = sa + da * (1 - sa)
        // out_p = sp * (1 - da) + dp * (1 - sa) + B(sc, dc) * sa * da
        let sa = (f32::from(s[3]) / 255.0) * opacity;
        if sa <= 0.0 {
            continue;
        }
        let da = f32::from(d[3]) / 255.0;
        let out_a = (sa + da * (1.0 - sa)).clamp(0.0, 1.0);

        for c in 0..3 {
            let sp = (f32::from(s[c]) / 255.0) * opacity;
            let dp = f32::from(d[c]) / 255.0;
            let sc = (sp / sa).clamp(0.0, 1.0);
            let dc = if da > 0.0 { (dp / da).clamp(0.0, 1.0) } else { 0.0 };
            let b = blend_fn(sc, dc).clamp(0.0, 1.0);
            let out_p = (sp * (1.0 - da) + dp * (1.0 - sa) + b * sa * da).clamp(0.0, 1.0);
            d[c] = (out_p * 255.0).round() as u8;
        }
        d[3] = (out_a * 255.0).round() as u8;
    }

    Ok(())
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
