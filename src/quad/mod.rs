//! Draw quads: one rectangle of content-space pixels plus the recipe to paint it.
//!
//! A [`Quad`] never owns its transform/opacity/clip state. It names a [`SharedQuadState`]
//! of its pass through a [`SharedStateId`], so runs of quads from one layer share one
//! state record.

pub(crate) mod filter;
pub(crate) mod material;
pub(crate) mod occlusion;
pub(crate) mod shared_state;

use smallvec::SmallVec;

use crate::foundation::error::{TesseraError, TesseraResult};
use crate::foundation::geometry::IntRect;
use crate::render_pass::RenderPassId;
use crate::resources::ResourceId;

pub use filter::{FilterOperation, FilterOperations};
pub use material::{
    CheckerboardMaterial, DebugBorderMaterial, Material, MaterialKind, RenderPassMaterial,
    SolidColorMaterial, TextureMaterial, TileMaterial, UnsupportedMaterial,
};
pub use occlusion::{AppendQuadsData, Occlusion, append_unoccluded};
pub use shared_state::{BlendMode, SharedQuadState, SharedStateId};

/// One drawable rectangle in layer content space.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Quad {
    material: Material,
    rect: IntRect,
    #[serde(default)]
    opaque_rect: IntRect,
    visible_rect: IntRect,
    #[serde(default)]
    needs_blending: bool,
    shared_state: SharedStateId,
}

impl Quad {
    /// Build a quad with every field explicit.
    ///
    /// Fails when `rect` does not contain `visible_rect`, or a non-empty `opaque_rect`.
    pub fn create(
        shared_state: SharedStateId,
        rect: IntRect,
        opaque_rect: IntRect,
        visible_rect: IntRect,
        needs_blending: bool,
        material: Material,
    ) -> TesseraResult<Self> {
        check_rects(rect, opaque_rect, visible_rect)?;
        Ok(Self {
            material,
            rect,
            opaque_rect,
            visible_rect,
            needs_blending,
            shared_state,
        })
    }

    /// Build a quad whose opaque region and blending flag follow from its material.
    pub fn new(
        shared_state: SharedStateId,
        rect: IntRect,
        visible_rect: IntRect,
        material: Material,
    ) -> TesseraResult<Self> {
        let (opaque_rect, needs_blending) = match &material {
            Material::SolidColor(m) if m.color.is_opaque() => (rect, false),
            Material::Checkerboard(m) if m.color.is_opaque() => (rect, false),
            Material::DebugBorder(m) => (IntRect::default(), !m.color.is_opaque()),
            _ => (IntRect::default(), false),
        };
        Self::create(
            shared_state,
            rect,
            opaque_rect,
            visible_rect,
            needs_blending,
            material,
        )
    }

    /// Replace every field, re-checking the rect invariants. On error `self` is untouched.
    pub fn set_all(
        &mut self,
        shared_state: SharedStateId,
        rect: IntRect,
        opaque_rect: IntRect,
        visible_rect: IntRect,
        needs_blending: bool,
        material: Material,
    ) -> TesseraResult<()> {
        *self = Self::create(
            shared_state,
            rect,
            opaque_rect,
            visible_rect,
            needs_blending,
            material,
        )?;
        Ok(())
    }

    /// Painting recipe.
    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Content-space bounds.
    pub fn rect(&self) -> IntRect {
        self.rect
    }

    /// Region known to be fully opaque; may be empty.
    pub fn opaque_rect(&self) -> IntRect {
        self.opaque_rect
    }

    /// Part of `rect` that is not occluded.
    pub fn visible_rect(&self) -> IntRect {
        self.visible_rect
    }

    /// Producer-declared blending requirement.
    pub fn needs_blending(&self) -> bool {
        self.needs_blending
    }

    /// Back-reference to the state this quad is drawn with.
    pub fn shared_state(&self) -> SharedStateId {
        self.shared_state
    }

    /// `true` when occlusion trimmed part of the quad.
    pub fn is_partially_occluded(&self) -> bool {
        self.visible_rect != self.rect
    }

    pub(crate) fn set_visible_rect(&mut self, visible_rect: IntRect) -> TesseraResult<()> {
        check_rects(self.rect, self.opaque_rect, visible_rect)?;
        self.visible_rect = visible_rect;
        Ok(())
    }

    /// Call `visitor` for every resource id the material reads.
    pub fn iterate_resources(&self, visitor: impl FnMut(ResourceId)) {
        self.material.visit_resources(visitor);
    }

    pub(crate) fn remap_resources(&mut self, f: impl FnMut(ResourceId) -> ResourceId) {
        self.material.remap_resources(f);
    }

    /// Resource ids the material reads, in visit order.
    pub fn resource_ids(&self) -> SmallVec<[ResourceId; 2]> {
        let mut out = SmallVec::new();
        self.iterate_resources(|id| out.push(id));
        out
    }

    /// Whether drawing must composite against the destination rather than overwrite it.
    ///
    /// Opacity below 1 forces blending regardless of `needs_blending`, as does any part of
    /// the visible rect not covered by the opaque rect.
    pub fn should_draw_with_blending(&self, state: &SharedQuadState) -> bool {
        if self.needs_blending || state.effective_opacity() < 1.0 {
            return true;
        }
        if matches!(self.material, Material::DebugBorder(_)) {
            return true;
        }
        !self.opaque_rect.contains(self.visible_rect)
    }

    /// Structurally identical quad bound to `shared_state`.
    pub fn copy(&self, shared_state: SharedStateId) -> Quad {
        Quad {
            shared_state,
            ..self.clone()
        }
    }

    /// Like [`Quad::copy`], additionally pointing render pass references at
    /// `render_pass_id`. Other materials ignore the new pass id.
    pub fn copy_with_render_pass_id(
        &self,
        shared_state: SharedStateId,
        render_pass_id: RenderPassId,
    ) -> Quad {
        let mut out = self.copy(shared_state);
        if let Material::RenderPassReference(m) = &mut out.material {
            m.render_pass_id = render_pass_id;
        }
        out
    }

    /// Left side lies on the layer's left bound.
    pub fn is_left_edge(&self) -> bool {
        self.rect.x == 0
    }

    /// Top side lies on the layer's top bound.
    pub fn is_top_edge(&self) -> bool {
        self.rect.y == 0
    }

    /// Right side lies on the layer's right bound.
    pub fn is_right_edge(&self, state: &SharedQuadState) -> bool {
        self.rect.right() == state.content_bounds.width
    }

    /// Bottom side lies on the layer's bottom bound.
    pub fn is_bottom_edge(&self, state: &SharedQuadState) -> bool {
        self.rect.bottom() == state.content_bounds.height
    }

    /// At least one side is an exterior edge of the layer.
    pub fn is_edge(&self, state: &SharedQuadState) -> bool {
        self.is_left_edge()
            || self.is_top_edge()
            || self.is_right_edge(state)
            || self.is_bottom_edge(state)
    }

    /// Every side is an exterior edge, so no sibling tile abuts this quad.
    pub fn all_edges_exterior(&self, state: &SharedQuadState) -> bool {
        self.is_left_edge()
            && self.is_top_edge()
            && self.is_right_edge(state)
            && self.is_bottom_edge(state)
    }

    pub(crate) fn validate(&self) -> TesseraResult<()> {
        check_rects(self.rect, self.opaque_rect, self.visible_rect)
    }
}

fn check_rects(rect: IntRect, opaque_rect: IntRect, visible_rect: IntRect) -> TesseraResult<()> {
    if !rect.contains(visible_rect) {
        return Err(TesseraError::validation(format!(
            "quad visible_rect {visible_rect} is not inside rect {rect}"
        )));
    }
    if !opaque_rect.is_empty() && !rect.contains(opaque_rect) {
        return Err(TesseraError::validation(format!(
            "quad opaque_rect {opaque_rect} is not inside rect {rect}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/quad/quad.rs"]
mod tests;
