use super::*;
use crate::foundation::core::Rgba8;

fn bitmap_resource(w: u32, h: u32) -> Resource {
    Resource::bitmap(Bitmap::solid(w, h, Rgba8::new(0, 128, 255, 255)).unwrap())
}

#[test]
fn ids_are_never_reused() {
    let mut t = ResourceTable::new();
    let a = t.register(bitmap_resource(1, 1));
    t.unregister(a);
    let b = t.register(bitmap_resource(1, 1));
    assert_ne!(a, b);
    assert!(!t.contains(a));
}

#[test]
fn double_unregister_is_a_no_op() {
    let mut t = ResourceTable::new();
    let keep = t.register(bitmap_resource(2, 2));
    let gone = t.register(bitmap_resource(2, 2));
    t.unregister(gone);
    assert_eq!(t.len(), 1);
    t.unregister(gone);
    assert_eq!(t.len(), 1);
    assert!(t.contains(keep));
    t.unregister(ResourceId(9999));
    assert_eq!(t.len(), 1);
}

#[test]
fn read_lock_counts_and_releases() {
    let mut t = ResourceTable::new();
    let id = t.register(bitmap_resource(4, 3));
    {
        let a = t.acquire_read_lock(id).unwrap();
        let b = t.acquire_read_lock(id).unwrap();
        assert_eq!(t.read_lock_count(id), 2);
        assert!(t.in_use_by_consumer(id));
        assert_eq!(a.size(), IntSize::new(4, 3));
        assert!(b.bitmap().unwrap().is_opaque());
        assert_eq!(a.wrap_mode(), WrapMode::Clamp);
    }
    assert_eq!(t.read_lock_count(id), 0);
    assert!(!t.in_use_by_consumer(id));
}

#[test]
fn unknown_unallocated_and_lost_resources_are_unreadable() {
    let mut t = ResourceTable::new();
    assert!(t.acquire_read_lock(ResourceId(42)).is_none());

    let pending = t
        .create_resource(IntSize::new(2, 2), ResourceFormat::Rgba8, WrapMode::Clamp)
        .unwrap();
    assert!(t.acquire_read_lock(pending).is_none());
    t.set_pixels(pending, Bitmap::solid(2, 2, Rgba8::WHITE).unwrap())
        .unwrap();
    assert!(t.acquire_read_lock(pending).is_some());

    t.mark_lost(pending);
    assert!(t.acquire_read_lock(pending).is_none());
    assert!(t.in_use_by_consumer(pending));
}

#[test]
fn pixels_are_write_once_and_size_checked() {
    let mut t = ResourceTable::new();
    let id = t
        .create_resource(IntSize::new(2, 2), ResourceFormat::Rgba8, WrapMode::Repeat)
        .unwrap();
    let wrong = t.set_pixels(id, Bitmap::solid(3, 2, Rgba8::WHITE).unwrap());
    assert!(matches!(wrong, Err(TesseraError::Validation(_))));
    t.set_pixels(id, Bitmap::solid(2, 2, Rgba8::WHITE).unwrap())
        .unwrap();
    let again = t.set_pixels(id, Bitmap::solid(2, 2, Rgba8::BLACK).unwrap());
    assert!(matches!(again, Err(TesseraError::Contract(_))));
    assert!(
        t.create_resource(IntSize::new(0, 5), ResourceFormat::Rgba8, WrapMode::Clamp)
            .is_err()
    );
}

#[test]
fn prepare_send_describes_and_counts_exports() {
    let mut t = ResourceTable::new();
    let bmp = t.register(bitmap_resource(5, 6).with_wrap_mode(WrapMode::Repeat));
    let tex = t.register(Resource::texture(
        TextureDescriptor {
            name: 77,
            target: 3553,
        },
        IntSize::new(8, 8),
        ResourceFormat::Etc1,
        true,
    ));

    let sent = t.prepare_send_to_parent([bmp, tex]).unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].id, bmp);
    assert_eq!(sent[0].size, IntSize::new(5, 6));
    assert!(sent[0].is_repeated);
    assert!(sent[0].is_opaque);
    assert!(matches!(sent[0].backing_handle, BackingHandle::SharedBitmap { .. }));
    assert_eq!(
        sent[1].backing_handle,
        BackingHandle::Mailbox {
            name: 77,
            target: 3553
        }
    );
    assert_eq!(sent[1].format, ResourceFormat::Etc1);
    assert_eq!(t.exported_count(bmp), 1);
    assert_eq!(t.read_lock_count(bmp), 0);

    let json = serde_json::to_string(&sent[0]).unwrap();
    let back: TransferableResource = serde_json::from_str(&json).unwrap();
    assert_eq!(back, sent[0]);
}

#[test]
fn prepare_send_rejects_unknown_ids_without_counting() {
    let mut t = ResourceTable::new();
    let ok = t.register(bitmap_resource(1, 1));
    assert!(t.prepare_send_to_parent([ok, ResourceId(500)]).is_err());
    assert_eq!(t.exported_count(ok), 0);
}

#[test]
fn unregister_while_exported_defers_until_return() {
    let mut t = ResourceTable::new();
    let id = t.register(bitmap_resource(1, 1));
    let sent = t.prepare_send_to_parent([id]).unwrap();

    t.unregister(id);
    assert!(t.contains(id));
    assert!(t.acquire_read_lock(id).is_none());
    t.unregister(id);
    assert!(t.contains(id));

    t.receive_returns_from_parent(&ReturnedResource::from_transferables(&sent));
    assert!(!t.contains(id));
}

#[test]
fn returns_balance_counts_and_tolerate_strays() {
    let mut t = ResourceTable::new();
    let id = t.register(bitmap_resource(1, 1));
    t.prepare_send_to_parent([id, id]).unwrap();
    assert_eq!(t.exported_count(id), 2);

    t.receive_returns_from_parent(&[ReturnedResource::new(ResourceId(31337))]);
    t.receive_returns_from_parent(&[ReturnedResource::new(id)]);
    assert_eq!(t.exported_count(id), 1);
    assert!(t.in_use_by_consumer(id));

    t.receive_returns_from_parent(&[ReturnedResource {
        id,
        count: 5,
        lost: false,
    }]);
    assert_eq!(t.exported_count(id), 0);
    assert!(!t.in_use_by_consumer(id));
    assert!(t.contains(id));
}

#[test]
fn lost_returns_make_resources_unreadable() {
    let mut t = ResourceTable::new();
    let id = t.register(bitmap_resource(1, 1));
    t.prepare_send_to_parent([id]).unwrap();
    t.receive_returns_from_parent(&[ReturnedResource {
        id,
        count: 1,
        lost: true,
    }]);
    assert!(t.is_lost(id));
    assert!(t.acquire_read_lock(id).is_none());
}

#[test]
fn read_locks_work_across_threads() {
    let mut t = ResourceTable::new();
    let id = t.register(bitmap_resource(2, 2));
    let table = &t;
    std::thread::scope(|s| {
        let h = s.spawn(move || table.acquire_read_lock(id).map(|l| l.size()));
        assert_eq!(h.join().unwrap(), Some(IntSize::new(2, 2)));
    });
    assert_eq!(t.read_lock_count(id), 0);
}
