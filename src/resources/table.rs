use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::foundation::error::{TesseraError, TesseraResult};
use crate::foundation::geometry::IntSize;
use crate::resources::bitmap::Bitmap;
use crate::resources::transfer::{
    BackingHandle, ResourceFormat, ReturnedResource, TransferableResource, WrapMode,
};

/// Producer-local resource handle. Never reused within one table.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// GPU texture owned by another context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TextureDescriptor {
    /// Mailbox name.
    pub name: u64,
    /// Texture target.
    pub target: u32,
}

/// Where a resource's pixels live.
#[derive(Clone, Debug)]
pub enum Backing {
    /// CPU pixels the software rasterizer can sample.
    Bitmap(Bitmap),
    /// GPU texture; transferable but not drawable in software.
    Texture(TextureDescriptor),
}

/// A fully written resource ready for registration.
#[derive(Clone, Debug)]
pub struct Resource {
    backing: Backing,
    size: IntSize,
    format: ResourceFormat,
    wrap_mode: WrapMode,
    opaque: bool,
}

impl Resource {
    /// CPU bitmap resource; size and opacity come from the pixels.
    pub fn bitmap(bitmap: Bitmap) -> Self {
        Self {
            size: bitmap.size(),
            opaque: bitmap.is_opaque(),
            backing: Backing::Bitmap(bitmap),
            format: ResourceFormat::Rgba8,
            wrap_mode: WrapMode::Clamp,
        }
    }

    /// GPU texture resource.
    pub fn texture(
        texture: TextureDescriptor,
        size: IntSize,
        format: ResourceFormat,
        opaque: bool,
    ) -> Self {
        Self {
            backing: Backing::Texture(texture),
            size,
            format,
            wrap_mode: WrapMode::Clamp,
            opaque,
        }
    }

    /// Override the wrap mode.
    pub fn with_wrap_mode(mut self, wrap_mode: WrapMode) -> Self {
        self.wrap_mode = wrap_mode;
        self
    }
}

#[derive(Debug)]
struct Entry {
    backing: Option<Backing>,
    size: IntSize,
    format: ResourceFormat,
    wrap_mode: WrapMode,
    opaque: bool,
    backing_key: u64,
    read_locks: AtomicU32,
    exported_count: u32,
    lost: bool,
    marked_for_deletion: bool,
}

impl Entry {
    fn read_lock_count(&self) -> u32 {
        self.read_locks.load(Ordering::Acquire)
    }

    fn can_delete(&self) -> bool {
        self.exported_count == 0 && self.read_lock_count() == 0
    }
}

/// Maps [`ResourceId`]s to pixels and tracks who still uses them.
///
/// Registration and unregistration need `&mut self` and so happen on one owning thread.
/// Read locks only need `&self` and may be taken from any thread that can see the table.
#[derive(Debug, Default)]
pub struct ResourceTable {
    entries: HashMap<ResourceId, Entry>,
    next_id: u64,
    next_backing_key: u64,
}

impl ResourceTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    fn mint_id(&mut self) -> ResourceId {
        self.next_id += 1;
        ResourceId(self.next_id)
    }

    fn mint_backing_key(&mut self) -> u64 {
        self.next_backing_key += 1;
        self.next_backing_key
    }

    /// Register a fully written resource.
    pub fn register(&mut self, resource: Resource) -> ResourceId {
        let id = self.mint_id();
        let backing_key = self.mint_backing_key();
        self.entries.insert(
            id,
            Entry {
                backing: Some(resource.backing),
                size: resource.size,
                format: resource.format,
                wrap_mode: resource.wrap_mode,
                opaque: resource.opaque,
                backing_key,
                read_locks: AtomicU32::new(0),
                exported_count: 0,
                lost: false,
                marked_for_deletion: false,
            },
        );
        tracing::trace!(%id, "resource registered");
        id
    }

    /// Reserve an id whose pixels arrive later through [`ResourceTable::set_pixels`].
    ///
    /// The resource cannot be read or exported until then.
    pub fn create_resource(
        &mut self,
        size: IntSize,
        format: ResourceFormat,
        wrap_mode: WrapMode,
    ) -> TesseraResult<ResourceId> {
        if size.is_empty() {
            return Err(TesseraError::validation(format!(
                "resource size {size} must not be empty"
            )));
        }
        let id = self.mint_id();
        self.entries.insert(
            id,
            Entry {
                backing: None,
                size,
                format,
                wrap_mode,
                opaque: false,
                backing_key: 0,
                read_locks: AtomicU32::new(0),
                exported_count: 0,
                lost: false,
                marked_for_deletion: false,
            },
        );
        Ok(id)
    }

    /// Provide the pixels of a resource made by [`ResourceTable::create_resource`].
    ///
    /// Pixels are write-once: a resource that already has a backing store is rejected.
    pub fn set_pixels(&mut self, id: ResourceId, bitmap: Bitmap) -> TesseraResult<()> {
        let backing_key = self.mint_backing_key();
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or_else(|| TesseraError::resource(format!("set_pixels: unknown resource {id}")))?;
        if entry.backing.is_some() || entry.marked_for_deletion {
            return Err(TesseraError::contract(format!(
                "set_pixels: resource {id} is already written; register a new resource instead"
            )));
        }
        if bitmap.size() != entry.size {
            return Err(TesseraError::validation(format!(
                "set_pixels: resource {id} is {} but bitmap is {}",
                entry.size,
                bitmap.size()
            )));
        }
        if entry.format != ResourceFormat::Rgba8 {
            return Err(TesseraError::validation(format!(
                "set_pixels: resource {id} is not RGBA8"
            )));
        }
        entry.opaque = bitmap.is_opaque();
        entry.backing = Some(Backing::Bitmap(bitmap));
        entry.backing_key = backing_key;
        Ok(())
    }

    /// Drop the producer's claim on `id`.
    ///
    /// Unknown or already unregistered ids are ignored. Resources still exported or
    /// read-locked stay alive until the last return or unlock.
    pub fn unregister(&mut self, id: ResourceId) {
        let Some(entry) = self.entries.get_mut(&id) else {
            tracing::trace!(%id, "unregister of unknown resource ignored");
            return;
        };
        if entry.marked_for_deletion {
            return;
        }
        if entry.can_delete() {
            self.entries.remove(&id);
            return;
        }
        entry.marked_for_deletion = true;
        tracing::trace!(
            %id,
            exported = entry.exported_count,
            "resource deletion deferred"
        );
    }

    /// Borrow `id`'s pixels for reading.
    ///
    /// `None` when the id is unknown, unallocated, lost or unregistered.
    pub fn acquire_read_lock(&self, id: ResourceId) -> Option<ScopedReadLock<'_>> {
        let entry = self.entries.get(&id)?;
        if entry.lost || entry.marked_for_deletion {
            return None;
        }
        let backing = entry.backing.as_ref()?;
        entry.read_locks.fetch_add(1, Ordering::AcqRel);
        Some(ScopedReadLock { id, entry, backing })
    }

    /// The backing store of `id` is gone (for example after a context loss).
    pub fn mark_lost(&mut self, id: ResourceId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.lost = true;
        }
    }

    /// Describe `ids` for the consumer and count each as exported.
    ///
    /// Fails, exporting nothing, if any id is unknown or has no pixels yet.
    pub fn prepare_send_to_parent(
        &mut self,
        ids: impl IntoIterator<Item = ResourceId>,
    ) -> TesseraResult<Vec<TransferableResource>> {
        let ids: Vec<ResourceId> = ids.into_iter().collect();
        let mut out = Vec::with_capacity(ids.len());
        for &id in &ids {
            let entry = self.entries.get(&id).ok_or_else(|| {
                TesseraError::resource(format!("cannot send unknown resource {id}"))
            })?;
            let backing_handle = match &entry.backing {
                Some(Backing::Bitmap(_)) => BackingHandle::SharedBitmap {
                    key: entry.backing_key,
                },
                Some(Backing::Texture(t)) => BackingHandle::Mailbox {
                    name: t.name,
                    target: t.target,
                },
                None => {
                    return Err(TesseraError::resource(format!(
                        "cannot send resource {id} before its pixels are set"
                    )));
                }
            };
            out.push(TransferableResource {
                id,
                backing_handle,
                size: entry.size,
                format: entry.format,
                is_opaque: entry.opaque,
                is_repeated: entry.wrap_mode == WrapMode::Repeat,
            });
        }
        for id in ids {
            if let Some(entry) = self.entries.get_mut(&id) {
                entry.exported_count += 1;
            }
        }
        Ok(out)
    }

    /// Balance earlier exports.
    ///
    /// Unknown ids and surplus counts are ignored. A lost flag sticks. Unregistered
    /// resources are deleted once nothing uses them.
    pub fn receive_returns_from_parent(&mut self, returned: &[ReturnedResource]) {
        for r in returned {
            let Some(entry) = self.entries.get_mut(&r.id) else {
                tracing::warn!(id = %r.id, "return for unknown resource ignored");
                continue;
            };
            if r.count > entry.exported_count {
                tracing::warn!(
                    id = %r.id,
                    returned = r.count,
                    exported = entry.exported_count,
                    "unbalanced resource return"
                );
            }
            entry.exported_count = entry.exported_count.saturating_sub(r.count);
            entry.lost |= r.lost;
            if entry.marked_for_deletion && entry.can_delete() {
                self.entries.remove(&r.id);
            }
        }
    }

    /// `true` while the consumer may still touch the pixels.
    pub fn in_use_by_consumer(&self, id: ResourceId) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|e| e.read_lock_count() > 0 || e.exported_count > 0 || e.lost)
    }

    /// Outstanding exports of `id`; 0 when unknown.
    pub fn exported_count(&self, id: ResourceId) -> u32 {
        self.entries.get(&id).map_or(0, |e| e.exported_count)
    }

    /// Outstanding read locks of `id`; 0 when unknown.
    pub fn read_lock_count(&self, id: ResourceId) -> u32 {
        self.entries.get(&id).map_or(0, Entry::read_lock_count)
    }

    /// `true` when the backing store was reported lost.
    pub fn is_lost(&self, id: ResourceId) -> bool {
        self.entries.get(&id).is_some_and(|e| e.lost)
    }

    /// `true` while the table still tracks `id`, including deferred deletions.
    pub fn contains(&self, id: ResourceId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Tracked resources, including deferred deletions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read access to one resource; released on drop.
pub struct ScopedReadLock<'a> {
    id: ResourceId,
    entry: &'a Entry,
    backing: &'a Backing,
}

impl ScopedReadLock<'_> {
    /// Locked id.
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Backing store.
    pub fn backing(&self) -> &Backing {
        self.backing
    }

    /// CPU pixels, when the resource is a bitmap.
    pub fn bitmap(&self) -> Option<&Bitmap> {
        match self.backing {
            Backing::Bitmap(b) => Some(b),
            Backing::Texture(_) => None,
        }
    }

    /// Size in pixels.
    pub fn size(&self) -> IntSize {
        self.entry.size
    }

    /// Pixel layout.
    pub fn format(&self) -> ResourceFormat {
        self.entry.format
    }

    /// Sampling mode outside the image.
    pub fn wrap_mode(&self) -> WrapMode {
        self.entry.wrap_mode
    }

    /// Every pixel is opaque.
    pub fn is_opaque(&self) -> bool {
        self.entry.opaque
    }
}

impl Drop for ScopedReadLock<'_> {
    fn drop(&mut self) {
        self.entry.read_locks.fetch_sub(1, Ordering::AcqRel);
    }
}

impl fmt::Debug for ScopedReadLock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedReadLock")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resources/table.rs"]
mod tests;
