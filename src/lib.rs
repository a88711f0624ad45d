//! Tessera is a software compositor for render pass lists.
//!
//! Producers describe a frame as [`Quad`]s grouped into [`RenderPass`]es, with per-layer
//! transform/opacity/clip data in [`SharedQuadState`]s and pixels in a [`ResourceTable`].
//! From there a frame either:
//!
//! - goes through the [`FrameAssembler`] to a parent compositor as a delegated frame, or
//! - is rasterized by the [`SoftwareRenderer`] into pixels handed to an [`OutputSurface`].
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod foundation;

/// Frames, acks, output surfaces and the frame assembler.
pub mod frame;
/// Draw quads, their materials and occlusion culling.
pub mod quad;
/// Software rasterizer.
pub mod render;
/// Render passes and pass lists.
pub mod render_pass;
/// Resource table and transfer descriptors.
pub mod resources;

pub use crate::foundation::core::{Affine, BezPath, Point, Rect, Rgba8, Rgba8Premul, Vec2};
pub use crate::foundation::error::{TesseraError, TesseraResult};
pub use crate::foundation::geometry::{IntRect, IntSize, scale_rect_proportional};
pub use crate::foundation::transform::Transform3d;

pub use crate::frame::{
    CompositorFrame, CompositorFrameAck, DelegatedFrameData, FrameAssembler, FrameDocument,
    FrameMetadata, FramePayload, InMemoryOutputSurface, OutputSurface, SoftwareFrameData,
};
pub use crate::quad::{
    AppendQuadsData, BlendMode, FilterOperation, FilterOperations, Material, Occlusion, Quad,
    SharedQuadState, SharedStateId, append_unoccluded,
};
pub use crate::render::{DrawStats, RendererSettings, SoftwareRenderer, SurfacePoolOpts};
pub use crate::render_pass::{
    CopyOutputRequest, CopyOutputResult, RenderPass, RenderPassId, RenderPassList,
};
pub use crate::resources::{
    Bitmap, Resource, ResourceId, ResourceTable, ReturnedResource, TransferableResource,
    WrapMode,
};
