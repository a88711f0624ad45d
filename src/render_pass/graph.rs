use std::collections::{BTreeSet, HashMap};

use crate::foundation::error::{TesseraError, TesseraResult};
use crate::quad::Material;
use crate::render_pass::{RenderPass, RenderPassId};
use crate::resources::ResourceId;

/// One frame's passes in draw order; the last pass is the root.
///
/// Producers must precede their consumers. Drawing relies on that order and never sorts.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RenderPassList(Vec<RenderPass>);

impl RenderPassList {
    /// Empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pass; it becomes the root until another is pushed.
    pub fn push(&mut self, pass: RenderPass) {
        self.0.push(pass);
    }

    /// Number of passes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when the list holds no pass.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Passes in draw order.
    pub fn passes(&self) -> &[RenderPass] {
        &self.0
    }

    /// Mutable passes in draw order.
    pub fn passes_mut(&mut self) -> &mut [RenderPass] {
        &mut self.0
    }

    /// Final (screen) pass.
    pub fn root(&self) -> Option<&RenderPass> {
        self.0.last()
    }

    /// Mutable final pass.
    pub fn root_mut(&mut self) -> Option<&mut RenderPass> {
        self.0.last_mut()
    }

    /// Look a pass up by id.
    pub fn find(&self, id: RenderPassId) -> Option<&RenderPass> {
        self.0.iter().find(|p| p.id() == id)
    }

    /// Mutable lookup by id.
    pub fn find_mut(&mut self, id: RenderPassId) -> Option<&mut RenderPass> {
        self.0.iter_mut().find(|p| p.id() == id)
    }

    /// Every resource id referenced anywhere in the frame, each once.
    pub fn resource_ids(&self) -> BTreeSet<ResourceId> {
        let mut out = BTreeSet::new();
        self.iterate_resources(|id| {
            out.insert(id);
        });
        out
    }

    /// Visit resource ids of every quad in every pass (duplicates included).
    pub fn iterate_resources(&self, mut visitor: impl FnMut(ResourceId)) {
        for pass in &self.0 {
            pass.iterate_resources(&mut visitor);
        }
    }

    pub(crate) fn remap_resources(&mut self, mut f: impl FnMut(ResourceId) -> ResourceId) {
        for pass in &mut self.0 {
            pass.remap_resources(&mut f);
        }
    }

    /// Deep copy; see [`RenderPass::copy_all`].
    pub fn copy_all(&self) -> TesseraResult<RenderPassList> {
        Ok(Self(RenderPass::copy_all(&self.0)?))
    }

    /// Check per-pass invariants, id uniqueness and producer-before-consumer order.
    ///
    /// A reference to a later pass or to the pass itself is rejected, which also rules out
    /// cycles. References to ids outside the list are allowed; they draw nothing.
    pub fn validate(&self) -> TesseraResult<()> {
        let mut position: HashMap<RenderPassId, usize> = HashMap::with_capacity(self.0.len());
        for (i, pass) in self.0.iter().enumerate() {
            pass.validate()?;
            if position.insert(pass.id(), i).is_some() {
                return Err(TesseraError::validation(format!(
                    "render pass id {} appears twice",
                    pass.id()
                )));
            }
        }
        for (i, pass) in self.0.iter().enumerate() {
            for quad in pass.quads() {
                let Material::RenderPassReference(m) = quad.material() else {
                    continue;
                };
                match position.get(&m.render_pass_id) {
                    Some(&p) if p < i => {}
                    Some(&p) if p == i => {
                        return Err(TesseraError::validation(format!(
                            "render pass {} references itself",
                            pass.id()
                        )));
                    }
                    Some(_) => {
                        return Err(TesseraError::validation(format!(
                            "render pass {} consumes {} before it is drawn",
                            pass.id(),
                            m.render_pass_id
                        )));
                    }
                    None => {
                        tracing::debug!(
                            pass = %pass.id(),
                            target = %m.render_pass_id,
                            "reference to a pass outside this frame will draw nothing"
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Unwrap into the underlying vector.
    pub fn into_vec(self) -> Vec<RenderPass> {
        self.0
    }
}

impl From<Vec<RenderPass>> for RenderPassList {
    fn from(passes: Vec<RenderPass>) -> Self {
        Self(passes)
    }
}

impl FromIterator<RenderPass> for RenderPassList {
    fn from_iter<T: IntoIterator<Item = RenderPass>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for RenderPassList {
    type Item = RenderPass;
    type IntoIter = std::vec::IntoIter<RenderPass>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render_pass/graph.rs"]
mod tests;
