//! Render passes: one offscreen (or final) target and the quads painted into it.

pub(crate) mod copy_request;
pub(crate) mod graph;

use std::fmt;

use crate::foundation::error::{TesseraError, TesseraResult};
use crate::foundation::geometry::IntRect;
use crate::foundation::transform::Transform3d;
use crate::quad::{Quad, SharedQuadState, SharedStateId};
use crate::resources::ResourceId;

pub use copy_request::{CopyOutputRequest, CopyOutputResult};
pub use graph::RenderPassList;

/// Frame-unique pass identity: originating layer plus an index within that layer.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct RenderPassId {
    /// Layer that produced the pass; must be positive.
    pub layer_id: i32,
    /// Index among that layer's passes; must not be negative.
    pub index: i32,
}

impl RenderPassId {
    /// Build an id. Validity is checked when a pass adopts it.
    pub const fn new(layer_id: i32, index: i32) -> Self {
        Self { layer_id, index }
    }

    fn validate(self) -> TesseraResult<()> {
        if self.layer_id <= 0 {
            return Err(TesseraError::validation(format!(
                "render pass id {self}: layer_id must be > 0"
            )));
        }
        if self.index < 0 {
            return Err(TesseraError::validation(format!(
                "render pass id {self}: index must be >= 0"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for RenderPassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.layer_id, self.index)
    }
}

/// Ordered quads (back to front) plus the shared states they reference.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct RenderPass {
    id: RenderPassId,
    output_rect: IntRect,
    #[serde(default)]
    damage_rect: IntRect,
    #[serde(default)]
    transform_to_root_target: Transform3d,
    #[serde(default)]
    has_transparent_background: bool,
    #[serde(default)]
    shared_quad_states: Vec<SharedQuadState>,
    #[serde(default)]
    quads: Vec<Quad>,
    #[serde(skip)]
    copy_requests: Vec<CopyOutputRequest>,
}

impl RenderPass {
    /// Fresh pass with a transparent background.
    ///
    /// Fails on an invalid id or a damage rect reaching outside `output_rect`.
    pub fn new(
        id: RenderPassId,
        output_rect: IntRect,
        damage_rect: IntRect,
        transform_to_root_target: Transform3d,
    ) -> TesseraResult<Self> {
        id.validate()?;
        if !damage_rect.is_empty() && !output_rect.contains(damage_rect) {
            return Err(TesseraError::validation(format!(
                "render pass {id}: damage_rect {damage_rect} is not inside output_rect {output_rect}"
            )));
        }
        Ok(Self {
            id,
            output_rect,
            damage_rect,
            transform_to_root_target,
            has_transparent_background: true,
            shared_quad_states: Vec::new(),
            quads: Vec::new(),
            copy_requests: Vec::new(),
        })
    }

    /// Fresh pass with every scalar field explicit; see [`RenderPass::set_all`].
    pub fn with_all(
        id: RenderPassId,
        output_rect: IntRect,
        damage_rect: IntRect,
        transform_to_root_target: Transform3d,
        has_transparent_background: bool,
    ) -> TesseraResult<Self> {
        let mut pass = Self::new(id, output_rect, IntRect::default(), transform_to_root_target)?;
        pass.set_all(
            id,
            output_rect,
            damage_rect,
            transform_to_root_target,
            has_transparent_background,
        )?;
        Ok(pass)
    }

    /// Overwrite every scalar field.
    ///
    /// Damage outside `output_rect` is clipped away. A changed id is propagated to the
    /// pass's shared states and quads so their back-references keep resolving.
    pub fn set_all(
        &mut self,
        id: RenderPassId,
        output_rect: IntRect,
        damage_rect: IntRect,
        transform_to_root_target: Transform3d,
        has_transparent_background: bool,
    ) -> TesseraResult<()> {
        id.validate()?;
        let clipped = damage_rect.intersect(output_rect);
        if clipped != damage_rect && !damage_rect.is_empty() {
            tracing::debug!(pass = %id, %damage_rect, %output_rect, "damage clipped to output");
        }
        if id != self.id {
            self.rebind(id);
        }
        self.id = id;
        self.output_rect = output_rect;
        self.damage_rect = clipped;
        self.transform_to_root_target = transform_to_root_target;
        self.has_transparent_background = has_transparent_background;
        Ok(())
    }

    fn rebind(&mut self, id: RenderPassId) {
        for sqs in &mut self.shared_quad_states {
            let mut sid = sqs.id();
            sid.pass = id;
            sqs.rebind(sid);
        }
        for quad in &mut self.quads {
            let mut sid = quad.shared_state();
            sid.pass = id;
            *quad = quad.copy(sid);
        }
    }

    /// Same geometry and metadata under `new_id`, without quads, shared states or copy
    /// requests.
    pub fn copy(&self, new_id: RenderPassId) -> TesseraResult<RenderPass> {
        if !self.copy_requests.is_empty() {
            tracing::warn!(
                pass = %self.id,
                pending = self.copy_requests.len(),
                "copy requests stay with the source pass"
            );
        }
        RenderPass::with_all(
            new_id,
            self.output_rect,
            self.damage_rect,
            self.transform_to_root_target,
            self.has_transparent_background,
        )
    }

    /// Deep copy of every pass in `passes`, keeping ids and quad→state association.
    ///
    /// Fails if any source pass still has pending copy requests.
    pub fn copy_all(passes: &[RenderPass]) -> TesseraResult<Vec<RenderPass>> {
        let mut out = Vec::with_capacity(passes.len());
        for source in passes {
            if !source.copy_requests.is_empty() {
                return Err(TesseraError::contract(format!(
                    "render pass {} has {} pending copy requests and cannot be deep-copied",
                    source.id,
                    source.copy_requests.len()
                )));
            }
            let mut copy = source.copy(source.id)?;
            for sqs in &source.shared_quad_states {
                copy.create_and_append_shared_state().copy_from(sqs);
            }
            for quad in &source.quads {
                let sid = copy.shared_state_id_at(quad.shared_state().index()).ok_or_else(|| {
                    TesseraError::contract(format!(
                        "render pass {}: quad references missing shared state {}",
                        source.id,
                        quad.shared_state().index()
                    ))
                })?;
                copy.append_quad(quad.copy(sid))?;
            }
            out.push(copy);
        }
        Ok(out)
    }

    /// Append a default shared state and return it for configuration.
    ///
    /// Earlier states keep their [`SharedStateId`]s.
    pub fn create_and_append_shared_state(&mut self) -> &mut SharedQuadState {
        let index = self.shared_quad_states.len() as u32;
        self.shared_quad_states.push(SharedQuadState::new(SharedStateId {
            pass: self.id,
            index,
        }));
        let last = self.shared_quad_states.len() - 1;
        &mut self.shared_quad_states[last]
    }

    /// Append `quad` at the end of paint order.
    ///
    /// Fails when the quad's shared state does not belong to this pass.
    pub fn append_quad(&mut self, quad: Quad) -> TesseraResult<()> {
        let sid = quad.shared_state();
        if sid.pass != self.id || sid.index() >= self.shared_quad_states.len() {
            return Err(TesseraError::contract(format!(
                "quad bound to shared state {} of pass {} cannot join pass {}",
                sid.index(),
                sid.pass,
                self.id
            )));
        }
        self.quads.push(quad);
        Ok(())
    }

    fn shared_state_id_at(&self, index: usize) -> Option<SharedStateId> {
        self.shared_quad_states.get(index).map(SharedQuadState::id)
    }

    /// Identity.
    pub fn id(&self) -> RenderPassId {
        self.id
    }

    /// Target rectangle.
    pub fn output_rect(&self) -> IntRect {
        self.output_rect
    }

    /// Changed region since the previous frame; inside `output_rect` or empty.
    pub fn damage_rect(&self) -> IntRect {
        self.damage_rect
    }

    /// Maps this pass's target space into the root target.
    pub fn transform_to_root_target(&self) -> Transform3d {
        self.transform_to_root_target
    }

    /// Clear to transparent instead of the opaque clear color.
    pub fn has_transparent_background(&self) -> bool {
        self.has_transparent_background
    }

    /// Set the background mode.
    pub fn set_has_transparent_background(&mut self, v: bool) {
        self.has_transparent_background = v;
    }

    /// Quads in paint order.
    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }

    /// Shared states in creation order.
    pub fn shared_quad_states(&self) -> &[SharedQuadState] {
        &self.shared_quad_states
    }

    /// Resolve a quad's back-reference.
    pub fn shared_quad_state(&self, id: SharedStateId) -> Option<&SharedQuadState> {
        if id.pass != self.id {
            return None;
        }
        self.shared_quad_states.get(id.index())
    }

    /// Mutable access to one of this pass's shared states.
    pub fn shared_quad_state_mut(&mut self, id: SharedStateId) -> Option<&mut SharedQuadState> {
        if id.pass != self.id {
            return None;
        }
        self.shared_quad_states.get_mut(id.index())
    }

    /// Queue a readback of this pass's output.
    pub fn request_copy_of_output(&mut self, request: CopyOutputRequest) {
        self.copy_requests.push(request);
    }

    /// `true` while readbacks are queued.
    pub fn has_copy_requests(&self) -> bool {
        !self.copy_requests.is_empty()
    }

    /// Drain queued readbacks.
    pub fn take_copy_requests(&mut self) -> Vec<CopyOutputRequest> {
        std::mem::take(&mut self.copy_requests)
    }

    /// Visit every resource id referenced by this pass's quads (duplicates included).
    pub fn iterate_resources(&self, mut visitor: impl FnMut(ResourceId)) {
        for quad in &self.quads {
            quad.iterate_resources(&mut visitor);
        }
    }

    pub(crate) fn remap_resources(&mut self, mut f: impl FnMut(ResourceId) -> ResourceId) {
        for quad in &mut self.quads {
            quad.remap_resources(&mut f);
        }
    }

    /// Re-check every invariant; used after deserialization.
    pub fn validate(&self) -> TesseraResult<()> {
        self.id.validate()?;
        if !self.damage_rect.is_empty() && !self.output_rect.contains(self.damage_rect) {
            return Err(TesseraError::validation(format!(
                "render pass {}: damage_rect {} is not inside output_rect {}",
                self.id, self.damage_rect, self.output_rect
            )));
        }
        for (i, sqs) in self.shared_quad_states.iter().enumerate() {
            let sid = sqs.id();
            if sid.pass != self.id || sid.index() != i {
                return Err(TesseraError::validation(format!(
                    "render pass {}: shared state {i} carries foreign id ({}, {})",
                    self.id,
                    sid.pass,
                    sid.index()
                )));
            }
        }
        for quad in &self.quads {
            quad.validate()?;
            if self.shared_quad_state(quad.shared_state()).is_none() {
                return Err(TesseraError::validation(format!(
                    "render pass {}: quad {} references unknown shared state",
                    self.id,
                    quad.rect()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render_pass/render_pass.rs"]
mod tests;
