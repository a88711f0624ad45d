use std::ops::Mul;

use crate::foundation::core::{Affine, Rect};
use crate::foundation::math::{nearly_integer, nearly_zero};

/// Column-major 4x4 transform used for content-to-target mappings.
///
/// Producers may hand over true 3D transforms; the software path only ever consumes the
/// 2D projection of them (see [`Transform3d::flatten_to_2d`]).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Transform3d {
    /// Four columns, each `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Default for Transform3d {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform3d {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Pure translation.
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    /// Non-uniform scale.
    pub const fn from_scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            cols: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, sz, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Rotation around the Z axis, in radians.
    pub fn from_rotation_z(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self {
            cols: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Embed a 2D affine transform.
    pub fn from_affine(a: Affine) -> Self {
        let [xx, yx, xy, yy, tx, ty] = a.as_coeffs();
        Self {
            cols: [
                [xx, yx, 0.0, 0.0],
                [xy, yy, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [tx, ty, 0.0, 1.0],
            ],
        }
    }

    /// `true` when every element is finite.
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }

    /// `true` when equal to [`Transform3d::IDENTITY`].
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// `true` when the transform carries a perspective or Z component the 2D
    /// projection would drop.
    pub fn has_3d_component(&self) -> bool {
        let c = &self.cols;
        !(nearly_zero(c[0][3])
            && nearly_zero(c[1][3])
            && (c[3][3] - 1.0).abs() <= 1e-6
            && nearly_zero(c[2][0])
            && nearly_zero(c[2][1])
            && nearly_zero(c[0][2])
            && nearly_zero(c[1][2]))
    }

    /// Project onto the XY plane, discarding Z and perspective terms.
    pub fn flatten_to_2d(&self) -> Affine {
        let c = &self.cols;
        Affine::new([c[0][0], c[0][1], c[1][0], c[1][1], c[3][0], c[3][1]])
    }
}

impl Mul for Transform3d {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0; 4]; 4];
        for (col, out_col) in out.iter_mut().enumerate() {
            for (row, v) in out_col.iter_mut().enumerate() {
                *v = (0..4).map(|k| a[k][row] * b[col][k]).sum();
            }
        }
        Self { cols: out }
    }
}

/// `true` when `a` has no skew or rotation.
pub(crate) fn is_scale_translate(a: Affine) -> bool {
    let [_, yx, xy, _, _, _] = a.as_coeffs();
    nearly_zero(yx) && nearly_zero(xy)
}

/// `true` when `a` has no skew or rotation and its translation is pixel aligned.
pub(crate) fn is_scale_and_integer_translate(a: Affine) -> bool {
    let [_, _, _, _, tx, ty] = a.as_coeffs();
    is_scale_translate(a) && nearly_integer(tx) && nearly_integer(ty)
}

/// `true` when `a` maps axis-aligned rectangles to axis-aligned rectangles.
pub(crate) fn preserves_axis_alignment(a: Affine) -> bool {
    let [xx, yx, xy, yy, _, _] = a.as_coeffs();
    (nearly_zero(yx) && nearly_zero(xy)) || (nearly_zero(xx) && nearly_zero(yy))
}

/// Bounding box of `r` after mapping through `a`.
pub(crate) fn map_rect_bbox(a: Affine, r: Rect) -> Rect {
    a.transform_rect_bbox(r)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/transform.rs"]
mod tests;
