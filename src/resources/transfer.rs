use crate::foundation::geometry::IntSize;
use crate::resources::ResourceId;

/// Pixel layout of a resource.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ResourceFormat {
    /// Four 8-bit channels, premultiplied.
    #[default]
    Rgba8,
    /// Single 8-bit alpha channel.
    Alpha8,
    /// ETC1 compressed blocks.
    Etc1,
}

/// Sampling outside `[0, 1]` texture coordinates.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    /// Repeat edge pixels.
    #[default]
    Clamp,
    /// Tile the image.
    Repeat,
}

/// Opaque handle through which the consumer reaches the pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackingHandle {
    /// Shared-memory bitmap identified by a producer-local key.
    SharedBitmap {
        /// Stable for the lifetime of the backing store.
        key: u64,
    },
    /// GPU texture mailbox.
    Mailbox {
        /// Mailbox name.
        name: u64,
        /// Texture target enum of the producer's graphics API.
        target: u32,
    },
}

/// Serializable description of a resource handed to the consumer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TransferableResource {
    /// Producer-side id; returns reference it.
    pub id: ResourceId,
    /// Where the pixels live.
    pub backing_handle: BackingHandle,
    /// Size in pixels.
    pub size: IntSize,
    /// Pixel layout.
    pub format: ResourceFormat,
    /// Every pixel is opaque.
    pub is_opaque: bool,
    /// Sampled with [`WrapMode::Repeat`].
    pub is_repeated: bool,
}

impl TransferableResource {
    /// A single-use return for this resource.
    pub fn to_returned(&self) -> ReturnedResource {
        ReturnedResource::new(self.id)
    }
}

/// The consumer handing an exported resource back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReturnedResource {
    /// Producer-side id.
    pub id: ResourceId,
    /// How many exports this return balances.
    pub count: u32,
    /// The consumer lost the backing store; the pixels must not be reused.
    #[serde(default)]
    pub lost: bool,
}

impl ReturnedResource {
    /// Return balancing one export.
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            count: 1,
            lost: false,
        }
    }

    /// One return per transferable, in order.
    pub fn from_transferables(list: &[TransferableResource]) -> Vec<ReturnedResource> {
        list.iter().map(TransferableResource::to_returned).collect()
    }
}
