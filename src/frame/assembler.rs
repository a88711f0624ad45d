use crate::foundation::error::{TesseraError, TesseraResult};
use crate::frame::{
    CompositorFrame, CompositorFrameAck, DelegatedFrameData, FrameMetadata, FramePayload,
    OutputSurface,
};
use crate::render_pass::RenderPassList;
use crate::resources::{ResourceTable, ReturnedResource};

/// Packages pass lists with their resources and hands them to an [`OutputSurface`].
///
/// At most one assembled frame waits for `swap`; resources it exports stay in use by the
/// consumer until an ack returns them.
#[derive(Debug)]
pub struct FrameAssembler<S: OutputSurface> {
    surface: S,
    pending: Option<DelegatedFrameData>,
}

impl<S: OutputSurface> FrameAssembler<S> {
    /// Assembler feeding `surface`.
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            pending: None,
        }
    }

    /// The output surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The output surface, mutably.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Give back the output surface.
    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Assembled frame waiting for [`FrameAssembler::swap`].
    pub fn pending_frame(&self) -> Option<&DelegatedFrameData> {
        self.pending.as_ref()
    }

    /// Take `passes`, collect exactly the resources their quads read and export them.
    ///
    /// A frame still waiting for `swap` is abandoned first. On error nothing is exported.
    #[tracing::instrument(skip(self, passes, resources), fields(passes = passes.len()))]
    pub fn assemble_frame(
        &mut self,
        passes: RenderPassList,
        resources: &mut ResourceTable,
    ) -> TesseraResult<&DelegatedFrameData> {
        if self.pending.is_some() {
            self.abandon_frame(resources);
        }
        passes.validate()?;
        let ids = passes.resource_ids();
        let resource_list = resources.prepare_send_to_parent(ids)?;
        tracing::debug!(resources = resource_list.len(), "frame assembled");
        let frame: &DelegatedFrameData = self.pending.insert(DelegatedFrameData {
            render_pass_list: passes,
            resource_list,
        });
        Ok(frame)
    }

    /// Submit the assembled frame with `metadata`.
    ///
    /// When the surface rejects the frame its exports go back to `resources`.
    #[tracing::instrument(skip(self, metadata, resources))]
    pub fn swap(
        &mut self,
        metadata: FrameMetadata,
        resources: &mut ResourceTable,
    ) -> TesseraResult<()> {
        let frame = self
            .pending
            .take()
            .ok_or_else(|| TesseraError::contract("swap without an assembled frame"))?;
        let returned = ReturnedResource::from_transferables(&frame.resource_list);
        let result = self.surface.swap_buffers(CompositorFrame {
            metadata,
            payload: FramePayload::Delegated(frame),
        });
        if let Err(err) = &result {
            tracing::warn!(resources = returned.len(), error = %err, "output surface rejected frame");
            resources.receive_returns_from_parent(&returned);
        }
        result
    }

    /// Return the resources the consumer released.
    pub fn on_swap_ack(&mut self, ack: &CompositorFrameAck, resources: &mut ResourceTable) {
        resources.receive_returns_from_parent(&ack.resources);
    }

    /// Drop the assembled frame without swapping it, returning its resources.
    ///
    /// Returns `false` when no frame was pending.
    pub fn abandon_frame(&mut self, resources: &mut ResourceTable) -> bool {
        let Some(frame) = self.pending.take() else {
            return false;
        };
        tracing::warn!(
            resources = frame.resource_list.len(),
            "assembled frame abandoned before swap"
        );
        resources.receive_returns_from_parent(&ReturnedResource::from_transferables(
            &frame.resource_list,
        ));
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/assembler.rs"]
mod tests;
