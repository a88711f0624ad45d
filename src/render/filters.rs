use crate::foundation::core::{Rgba8, Vec2};
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::foundation::math::mul_div255_u8;
use crate::quad::{FilterOperation, FilterOperations};
use crate::render::composite::premul_over_in_place_opacity;
use crate::resources::bitmap::pixmap_from_premul_bytes;

/// Run `filters` over `src` and return a same-sized premultiplied pixmap.
///
/// Spatial parameters are multiplied by `scale` (content pixels to target pixels).
pub(crate) fn apply_filters(
    src: &vello_cpu::Pixmap,
    filters: &FilterOperations,
    scale: Vec2,
) -> TesseraResult<vello_cpu::Pixmap> {
    let width = u32::from(src.width());
    let height = u32::from(src.height());
    let mut cur = src.data_as_u8_slice().to_vec();
    let mut next = vec![0u8; cur.len()];

    for op in filters.iter() {
        match op {
            FilterOperation::Blur { sigma } => {
                let kx = blur_kernel(*sigma * scale.x as f32, width)?;
                let ky = blur_kernel(*sigma * scale.y as f32, height)?;
                blur_rgba8_premul_q16(&cur, &mut next, width, height, &kx, &ky);
            }
            FilterOperation::DropShadow {
                dx,
                dy,
                sigma,
                color,
            } => {
                let offset = (
                    clamp_offset(f64::from(*dx) * scale.x, width),
                    clamp_offset(f64::from(*dy) * scale.y, height),
                );
                let kx = blur_kernel(*sigma * scale.x as f32, width)?;
                let ky = blur_kernel(*sigma * scale.y as f32, height)?;
                drop_shadow(&cur, &mut next, width, height, offset, &kx, &ky, *color)?;
            }
            other => {
                let m = color_matrix_for(other).ok_or_else(|| {
                    TesseraError::validation(format!("filter {other:?} has no color matrix"))
                })?;
                color_matrix_rgba8_premul(&cur, &mut next, m);
            }
        }
        std::mem::swap(&mut cur, &mut next);
    }

    pixmap_from_premul_bytes(&cur, width, height)
}

/// Straight-alpha 4x5 matrix of a color filter; `None` for spatial filters.
pub(crate) fn color_matrix_for(op: &FilterOperation) -> Option<[f32; 20]> {
    let m = match *op {
        FilterOperation::Grayscale { amount } => {
            let inv = 1.0 - amount.clamp(0.0, 1.0);
            [
                0.2126 + 0.7874 * inv,
                0.7152 - 0.7152 * inv,
                0.0722 - 0.0722 * inv,
                0.0,
                0.0,
                0.2126 - 0.2126 * inv,
                0.7152 + 0.2848 * inv,
                0.0722 - 0.0722 * inv,
                0.0,
                0.0,
                0.2126 - 0.2126 * inv,
                0.7152 - 0.7152 * inv,
                0.0722 + 0.9278 * inv,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                1.0,
                0.0,
            ]
        }
        FilterOperation::Sepia { amount } => {
            let inv = 1.0 - amount.clamp(0.0, 1.0);
            [
                0.393 + 0.607 * inv,
                0.769 - 0.769 * inv,
                0.189 - 0.189 * inv,
                0.0,
                0.0,
                0.349 - 0.349 * inv,
                0.686 + 0.314 * inv,
                0.168 - 0.168 * inv,
                0.0,
                0.0,
                0.272 - 0.272 * inv,
                0.534 - 0.534 * inv,
                0.131 + 0.869 * inv,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                1.0,
                0.0,
            ]
        }
        FilterOperation::Saturate { amount } => {
            let s = amount.max(0.0);
            [
                0.213 + 0.787 * s,
                0.715 - 0.715 * s,
                0.072 - 0.072 * s,
                0.0,
                0.0,
                0.213 - 0.213 * s,
                0.715 + 0.285 * s,
                0.072 - 0.072 * s,
                0.0,
                0.0,
                0.213 - 0.213 * s,
                0.715 - 0.715 * s,
                0.072 + 0.928 * s,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                1.0,
                0.0,
            ]
        }
        FilterOperation::HueRotate { degrees } => {
            let (sin, cos) = degrees.to_radians().sin_cos();
            [
                0.213 + cos * 0.787 - sin * 0.213,
                0.715 - cos * 0.715 - sin * 0.715,
                0.072 - cos * 0.072 + sin * 0.928,
                0.0,
                0.0,
                0.213 - cos * 0.213 + sin * 0.143,
                0.715 + cos * 0.285 + sin * 0.140,
                0.072 - cos * 0.072 - sin * 0.283,
                0.0,
                0.0,
                0.213 - cos * 0.213 - sin * 0.787,
                0.715 - cos * 0.715 + sin * 0.715,
                0.072 + cos * 0.928 + sin * 0.072,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                1.0,
                0.0,
            ]
        }
        FilterOperation::Invert { amount } => {
            let a = amount.clamp(0.0, 1.0);
            let k = 1.0 - 2.0 * a;
            diagonal(k, a, 1.0)
        }
        FilterOperation::Brightness { amount } => diagonal(amount.max(0.0), 0.0, 1.0),
        FilterOperation::Contrast { amount } => {
            let c = amount.max(0.0);
            diagonal(c, (1.0 - c) * 0.5, 1.0)
        }
        FilterOperation::Opacity { amount } => diagonal(1.0, 0.0, amount.clamp(0.0, 1.0)),
        FilterOperation::ColorMatrix { matrix } => matrix,
        FilterOperation::Blur { .. } | FilterOperation::DropShadow { .. } => return None,
    };
    Some(m)
}

fn diagonal(rgb_scale: f32, rgb_offset: f32, alpha_scale: f32) -> [f32; 20] {
    let mut m = [0.0; 20];
    for row in 0..3 {
        m[row * 5 + row] = rgb_scale;
        m[row * 5 + 4] = rgb_offset;
    }
    m[18] = alpha_scale;
    m
}

pub(crate) fn color_matrix_rgba8_premul(src: &[u8], dst: &mut [u8], m: [f32; 20]) {
    debug_assert_eq!(src.len(), dst.len());
    for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        let pa = f32::from(s[3]) / 255.0;
        let inv_a = if pa > 0.0 { 1.0 / pa } else { 0.0 };
        let r = f32::from(s[0]) / 255.0 * inv_a;
        let g = f32::from(s[1]) / 255.0 * inv_a;
        let b = f32::from(s[2]) / 255.0 * inv_a;
        let a = pa;

        let out_r = (m[0] * r + m[1] * g + m[2] * b + m[3] * a + m[4]).clamp(0.0, 1.0);
        let out_g = (m[5] * r + m[6] * g + m[7] * b + m[8] * a + m[9]).clamp(0.0, 1.0);
        let out_b = (m[10] * r + m[11] * g + m[12] * b + m[13] * a + m[14]).clamp(0.0, 1.0);
        let out_a = (m[15] * r + m[16] * g + m[17] * b + m[18] * a + m[19]).clamp(0.0, 1.0);

        d[0] = (out_r * out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        d[1] = (out_g * out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        d[2] = (out_b * out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        d[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

/// Kernel for `sigma` along an axis of `extent` pixels.
///
/// Taps past the far edge only ever read transparent pixels, so the radius is capped at
/// `extent`.
fn blur_kernel(sigma: f32, extent: u32) -> TesseraResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return gaussian_kernel_q16(0, 0.0);
    }
    let radius = f64::from(sigma * 3.0).ceil().min(f64::from(extent.max(1))) as u32;
    gaussian_kernel_q16(radius, sigma)
}

/// Shadow offset in pixels; anything beyond the surface lands fully outside it.
fn clamp_offset(v: f64, extent: u32) -> i32 {
    let limit = f64::from(extent.min(i32::MAX as u32));
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(-limit, limit) as i32
}

pub(crate) fn gaussian_kernel_q16(radius: u32, sigma: f32) -> TesseraResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(TesseraError::validation("blur sigma must be finite and > 0"));
    }

    let r = i32::try_from(radius)
        .ok()
        .filter(|&r| r <= i32::from(u16::MAX))
        .ok_or_else(|| TesseraError::validation(format!("blur radius {radius} is too large")))?;
    let taps = r
        .checked_mul(2)
        .and_then(|n| n.checked_add(1))
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| TesseraError::validation(format!("blur radius {radius} is too large")))?;
    let mut weights_f = Vec::<f64>::with_capacity(taps);
    let mut sum = 0.0f64;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = f64::from(i);
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(TesseraError::validation("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }

    Ok(weights)
}

fn blur_rgba8_premul_q16(
    src: &[u8],
    dst: &mut [u8],
    width: u32,
    height: u32,
    kernel_x: &[u32],
    kernel_y: &[u32],
) {
    let mut tmp = vec![0u8; src.len()];
    horizontal_blur_q16(src, &mut tmp, width, height, kernel_x);
    vertical_blur_q16(&tmp, dst, width, height, kernel_y);
}

fn horizontal_blur_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    if k.len() == 1 {
        dst.copy_from_slice(src);
        return;
    }
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = x + ki as i32 - radius;
                if sx < 0 || sx >= w {
                    continue;
                }
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_blur_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    if k.len() == 1 {
        dst.copy_from_slice(src);
        return;
    }
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = y + ki as i32 - radius;
                if sy < 0 || sy >= h {
                    continue;
                }
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    (v.min(255)) as u8
}

#[allow(clippy::too_many_arguments)]
fn drop_shadow(
    src: &[u8],
    dst: &mut [u8],
    width: u32,
    height: u32,
    offset: (i32, i32),
    kernel_x: &[u32],
    kernel_y: &[u32],
    color: Rgba8,
) -> TesseraResult<()> {
    let tint = color.premultiply().to_array();
    let w = width as i32;
    let h = height as i32;

    let mut shadow = vec![0u8; src.len()];
    for y in 0..h {
        for x in 0..w {
            let sx = x - offset.0;
            let sy = y - offset.1;
            if sx < 0 || sy < 0 || sx >= w || sy >= h {
                continue;
            }
            let a = u16::from(src[((sy * w + sx) as usize) * 4 + 3]);
            let out = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                shadow[out + c] = mul_div255_u8(u16::from(tint[c]), a);
            }
        }
    }

    blur_rgba8_premul_q16(&shadow, dst, width, height, kernel_x, kernel_y);
    premul_over_in_place_opacity(dst, src, 1.0)
}

#[cfg(test)]
#[path = "../../tests/unit/render/filters.rs"]
mod tests;
