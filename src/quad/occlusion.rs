use crate::foundation::core::Affine;
use crate::foundation::error::TesseraResult;
use crate::foundation::geometry::IntRect;
use crate::foundation::transform::{map_rect_bbox, preserves_axis_alignment};
use crate::quad::Quad;
use crate::render_pass::RenderPass;

/// Opaque coverage known to lie above a layer, expressed in its target space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Occlusion {
    draw_transform: Affine,
    occlusion_from_outside_target: IntRect,
    occlusion_from_inside_target: IntRect,
}

impl Occlusion {
    /// No occlusion at all.
    pub fn none() -> Self {
        Self {
            draw_transform: Affine::IDENTITY,
            ..Self::default()
        }
    }

    /// Occlusion seen through `draw_transform` (layer content to target).
    pub fn new(
        draw_transform: Affine,
        occlusion_from_outside_target: IntRect,
        occlusion_from_inside_target: IntRect,
    ) -> Self {
        Self {
            draw_transform,
            occlusion_from_outside_target,
            occlusion_from_inside_target,
        }
    }

    /// `true` when some part of the target is known to be covered.
    pub fn has_occlusion(&self) -> bool {
        !self.occlusion_from_inside_target.is_empty()
            || !self.occlusion_from_outside_target.is_empty()
    }

    /// `true` when all of `content_rect` is hidden.
    pub fn is_occluded(&self, content_rect: IntRect) -> bool {
        if content_rect.is_empty() {
            return true;
        }
        self.unoccluded_content_rect(content_rect).is_empty()
    }

    /// The part of `content_rect` that may still be visible.
    ///
    /// Transforms that rotate or skew content yield `content_rect` unchanged; the answer is
    /// conservative, never hiding visible pixels.
    pub fn unoccluded_content_rect(&self, content_rect: IntRect) -> IntRect {
        if !self.has_occlusion() || content_rect.is_empty() {
            return content_rect;
        }
        if !preserves_axis_alignment(self.draw_transform)
            || self.draw_transform.determinant().abs() <= f64::EPSILON
        {
            return content_rect;
        }

        let in_target = IntRect::enclosing(map_rect_bbox(
            self.draw_transform,
            content_rect.to_rect(),
        ));
        let unoccluded = in_target
            .subtract(self.occlusion_from_inside_target)
            .subtract(self.occlusion_from_outside_target);
        if unoccluded.is_empty() {
            return IntRect::default();
        }

        let back = IntRect::enclosing(map_rect_bbox(
            self.draw_transform.inverse(),
            unoccluded.to_rect(),
        ));
        back.intersect(content_rect)
    }
}

/// Counters filled while appending quads through occlusion culling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AppendQuadsData {
    /// Quads actually appended.
    pub num_appended: usize,
    /// Appended quads whose visible rect was narrowed.
    pub num_partially_occluded: usize,
    /// Quads dropped because nothing of them was visible.
    pub num_fully_occluded: usize,
}

/// Append `quad` to `pass` unless `occlusion` hides it completely.
///
/// Partially hidden quads get their visible rect narrowed to the unoccluded part. Returns
/// whether the quad was appended.
pub fn append_unoccluded(
    pass: &mut RenderPass,
    occlusion: &Occlusion,
    mut quad: Quad,
    data: &mut AppendQuadsData,
) -> TesseraResult<bool> {
    let visible = occlusion.unoccluded_content_rect(quad.visible_rect());
    if visible.is_empty() {
        data.num_fully_occluded += 1;
        tracing::trace!(rect = %quad.rect(), "quad fully occluded");
        return Ok(false);
    }
    quad.set_visible_rect(visible)?;
    let partial = quad.is_partially_occluded();
    pass.append_quad(quad)?;
    data.num_appended += 1;
    if partial {
        data.num_partially_occluded += 1;
    }
    Ok(true)
}

#[cfg(test)]
#[path = "../../tests/unit/quad/occlusion.rs"]
mod tests;
