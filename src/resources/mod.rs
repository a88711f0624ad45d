//! Pixel resources referenced by quads, and their handoff to the consumer.

pub(crate) mod bitmap;
pub(crate) mod table;
pub(crate) mod transfer;

pub use bitmap::Bitmap;
pub use table::{Backing, Resource, ResourceId, ResourceTable, ScopedReadLock, TextureDescriptor};
pub use transfer::{
    BackingHandle, ResourceFormat, ReturnedResource, TransferableResource, WrapMode,
};
