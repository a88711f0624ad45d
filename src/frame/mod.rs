//! Frames handed from the compositor to its consumer, and the acks that come back.

pub(crate) mod assembler;
pub(crate) mod document;

use crate::foundation::core::Vec2;
use crate::foundation::error::TesseraResult;
use crate::foundation::geometry::{IntRect, IntSize};
use crate::render_pass::RenderPassList;
use crate::resources::{Bitmap, ReturnedResource, TransferableResource};

pub use assembler::FrameAssembler;
pub use document::{FrameDocument, ResourceDef, ResourceSource};

/// Per-frame data the consumer needs to place the frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FrameMetadata {
    /// Physical pixels per layout pixel.
    pub device_scale_factor: f32,
    /// Size of the root target.
    pub viewport_size: IntSize,
    /// Scroll offset of the root layer at draw time.
    pub root_scroll_offset: Vec2,
    /// Opaque latency markers forwarded to the consumer.
    pub latency_info: Vec<u64>,
}

impl Default for FrameMetadata {
    fn default() -> Self {
        Self {
            device_scale_factor: 1.0,
            viewport_size: IntSize::default(),
            root_scroll_offset: Vec2::ZERO,
            latency_info: Vec::new(),
        }
    }
}

/// Passes plus the descriptors of every resource they read.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct DelegatedFrameData {
    /// Passes in draw order, root last.
    pub render_pass_list: RenderPassList,
    /// Exactly the resources referenced by `render_pass_list`.
    pub resource_list: Vec<TransferableResource>,
}

/// Root pixels produced by the software renderer.
#[derive(Clone, Debug)]
pub struct SoftwareFrameData {
    /// Monotonic frame id, echoed back in [`CompositorFrameAck::last_software_frame_id`].
    pub id: u64,
    /// Viewport size.
    pub size: IntSize,
    /// Region that changed since the previous frame.
    pub damage_rect: IntRect,
    /// Premultiplied pixels.
    pub pixels: Bitmap,
}

/// What a frame carries.
#[derive(Debug)]
pub enum FramePayload {
    /// Quads and resources for a parent compositor to draw.
    Delegated(DelegatedFrameData),
    /// Finished pixels.
    Software(SoftwareFrameData),
}

/// One frame submitted to an [`OutputSurface`].
#[derive(Debug)]
pub struct CompositorFrame {
    /// Placement data.
    pub metadata: FrameMetadata,
    /// Content.
    pub payload: FramePayload,
}

impl CompositorFrame {
    /// Delegated payload, if any.
    pub fn delegated(&self) -> Option<&DelegatedFrameData> {
        match &self.payload {
            FramePayload::Delegated(d) => Some(d),
            FramePayload::Software(_) => None,
        }
    }

    /// Software payload, if any.
    pub fn software(&self) -> Option<&SoftwareFrameData> {
        match &self.payload {
            FramePayload::Software(s) => Some(s),
            FramePayload::Delegated(_) => None,
        }
    }
}

/// Consumer response to a swapped frame.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompositorFrameAck {
    /// Resources the consumer is done with.
    pub resources: Vec<ReturnedResource>,
    /// Software frame whose buffer may be reused.
    pub last_software_frame_id: Option<u64>,
}

/// Consumer of finished frames.
pub trait OutputSurface {
    /// Take ownership of `frame`. The ack arrives later through the producer's own API.
    fn swap_buffers(&mut self, frame: CompositorFrame) -> TesseraResult<()>;
}

/// Surface that keeps every swapped frame, for tests and the CLI.
#[derive(Debug, Default)]
pub struct InMemoryOutputSurface {
    /// Frames in swap order.
    pub frames: Vec<CompositorFrame>,
}

impl InMemoryOutputSurface {
    /// Empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently swapped frame.
    pub fn last(&self) -> Option<&CompositorFrame> {
        self.frames.last()
    }

    /// Ack for the most recent frame returning all its resources, as a consumer that
    /// finished with it would send.
    pub fn ack_last(&self) -> CompositorFrameAck {
        let Some(frame) = self.frames.last() else {
            return CompositorFrameAck::default();
        };
        match &frame.payload {
            FramePayload::Delegated(d) => CompositorFrameAck {
                resources: ReturnedResource::from_transferables(&d.resource_list),
                last_software_frame_id: None,
            },
            FramePayload::Software(s) => CompositorFrameAck {
                resources: Vec::new(),
                last_software_frame_id: Some(s.id),
            },
        }
    }
}

impl OutputSurface for InMemoryOutputSurface {
    fn swap_buffers(&mut self, frame: CompositorFrame) -> TesseraResult<()> {
        tracing::trace!(frames = self.frames.len() + 1, "frame swapped into memory");
        self.frames.push(frame);
        Ok(())
    }
}
