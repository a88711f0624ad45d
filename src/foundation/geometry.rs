use std::fmt;

use crate::foundation::core::Rect;

/// Integer size in pixels.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct IntSize {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl IntSize {
    /// Build a size; negative extents clamp to zero.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: width.max(0),
            height: height.max(0),
        }
    }

    /// `true` when either extent is zero.
    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Pixel count.
    pub fn area(self) -> u64 {
        (self.width.max(0) as u64) * (self.height.max(0) as u64)
    }

    pub(crate) fn to_u16(self) -> Option<(u16, u16)> {
        let w = u16::try_from(self.width).ok()?;
        let h = u16::try_from(self.height).ok()?;
        Some((w, h))
    }
}

impl fmt::Display for IntSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Integer rectangle `(x, y, width, height)` in pixel space.
///
/// Empty rectangles never contain anything and intersect nothing.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct IntRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width, never negative.
    pub width: i32,
    /// Height, never negative.
    pub height: i32,
}

impl IntRect {
    /// Build a rectangle; negative extents clamp to zero.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: width.max(0),
            height: height.max(0),
        }
    }

    /// Rectangle at the origin with the given size.
    pub fn from_size(size: IntSize) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Exclusive right edge.
    pub fn right(self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Width and height.
    pub fn size(self) -> IntSize {
        IntSize::new(self.width, self.height)
    }

    /// `true` when the rectangle covers no pixels.
    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// `true` when `other` lies entirely within `self`.
    pub fn contains(self, other: IntRect) -> bool {
        other.x >= self.x
            && other.right() <= self.right()
            && other.y >= self.y
            && other.bottom() <= self.bottom()
    }

    /// `true` when the pixel `(px, py)` is inside.
    pub fn contains_point(self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Overlap of both rectangles, or the empty rectangle.
    pub fn intersect(self, other: IntRect) -> IntRect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return IntRect::default();
        }
        IntRect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// `true` when the rectangles share at least one pixel.
    pub fn intersects(self, other: IntRect) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Smallest rectangle containing both; empty inputs are ignored.
    pub fn union(self, other: IntRect) -> IntRect {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        IntRect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Remove `other` from `self` when the result is still a rectangle.
    ///
    /// Only slabs spanning the full width or height are removed; any other overlap leaves
    /// `self` unchanged.
    pub fn subtract(self, other: IntRect) -> IntRect {
        if !self.intersects(other) {
            return self;
        }
        if other.contains(self) {
            return IntRect::default();
        }

        let mut x0 = self.x;
        let mut y0 = self.y;
        let mut x1 = self.right();
        let mut y1 = self.bottom();

        if other.y <= self.y && other.bottom() >= self.bottom() {
            if other.x <= x0 {
                x0 = other.right();
            } else if other.right() >= x1 {
                x1 = other.x;
            }
        } else if other.x <= self.x && other.right() >= self.right() {
            if other.y <= y0 {
                y0 = other.bottom();
            } else if other.bottom() >= y1 {
                y1 = other.y;
            }
        }
        IntRect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Translate by `(dx, dy)`.
    pub fn offset(self, dx: i32, dy: i32) -> IntRect {
        IntRect::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.width,
            self.height,
        )
    }

    /// Float copy of the rectangle.
    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.right()),
            f64::from(self.bottom()),
        )
    }

    /// Smallest integer rectangle enclosing `r`.
    pub fn enclosing(r: Rect) -> IntRect {
        if !(r.x0.is_finite() && r.y0.is_finite() && r.x1.is_finite() && r.y1.is_finite()) {
            return IntRect::default();
        }
        let r = r.abs();
        let x0 = r.x0.floor() as i32;
        let y0 = r.y0.floor() as i32;
        let x1 = r.x1.ceil() as i32;
        let y1 = r.y1.ceil() as i32;
        IntRect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Integer rectangle with every edge rounded to the nearest pixel.
    pub fn snapped(r: Rect) -> IntRect {
        let r = r.abs();
        let x0 = r.x0.round() as i32;
        let y0 = r.y0.round() as i32;
        let x1 = r.x1.round() as i32;
        let y1 = r.y1.round() as i32;
        IntRect::new(x0, y0, x1 - x0, y1 - y0)
    }
}

impl fmt::Display for IntRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{} {}x{}", self.x, self.y, self.width, self.height)
    }
}

/// Map `input_inner` (a sub-rect of `input_outer`) to the matching sub-rect of
/// `output_outer`.
pub fn scale_rect_proportional(input_outer: Rect, input_inner: Rect, output_outer: Rect) -> Rect {
    let in_w = input_outer.width();
    let in_h = input_outer.height();
    if in_w == 0.0 || in_h == 0.0 {
        return output_outer;
    }
    let sx = output_outer.width() / in_w;
    let sy = output_outer.height() / in_h;
    Rect::new(
        output_outer.x0 + (input_inner.x0 - input_outer.x0) * sx,
        output_outer.y0 + (input_inner.y0 - input_outer.y0) * sy,
        output_outer.x0 + (input_inner.x1 - input_outer.x0) * sx,
        output_outer.y0 + (input_inner.y1 - input_outer.y0) * sy,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/geometry.rs"]
mod tests;
