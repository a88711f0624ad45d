use std::sync::{Arc, Mutex};

use super::*;
use crate::foundation::core::Rgba8;
use crate::foundation::geometry::IntSize;
use crate::quad::Material;

fn solid_quad(pass: &mut RenderPass, rect: IntRect) -> Quad {
    let sid = pass.create_and_append_shared_state().id();
    Quad::new(sid, rect, rect, Material::solid_color(Rgba8::WHITE)).unwrap()
}

#[test]
fn shallow_copy_keeps_geometry_and_drops_quads() {
    let mut pass = RenderPass::with_all(
        RenderPassId::new(3, 2),
        IntRect::new(45, 22, 120, 13),
        IntRect::new(56, 123, 19, 43),
        Transform3d::default(),
        false,
    )
    .unwrap();
    let q = solid_quad(&mut pass, IntRect::new(0, 0, 10, 10));
    pass.append_quad(q).unwrap();
    assert_eq!(pass.quads().len(), 1);

    let copy = pass.copy(RenderPassId::new(63, 4)).unwrap();
    assert_eq!(copy.id(), RenderPassId::new(63, 4));
    assert_eq!(copy.output_rect(), IntRect::new(45, 22, 120, 13));
    assert_eq!(copy.damage_rect(), pass.damage_rect());
    assert!(!copy.has_transparent_background());
    assert!(copy.quads().is_empty());
    assert!(copy.shared_quad_states().is_empty());
}

#[test]
fn with_all_clips_damage_but_new_rejects_it() {
    let pass = RenderPass::with_all(
        RenderPassId::new(3, 2),
        IntRect::new(45, 22, 120, 13),
        IntRect::new(56, 123, 19, 43),
        Transform3d::default(),
        true,
    )
    .unwrap();
    assert!(pass.damage_rect().is_empty());

    let err = RenderPass::new(
        RenderPassId::new(3, 2),
        IntRect::new(45, 22, 120, 13),
        IntRect::new(56, 123, 19, 43),
        Transform3d::default(),
    )
    .unwrap_err();
    assert!(matches!(err, TesseraError::Validation(_)));
}

#[test]
fn invalid_ids_are_rejected() {
    let out = IntRect::new(0, 0, 4, 4);
    for id in [RenderPassId::new(0, 0), RenderPassId::new(-1, 0), RenderPassId::new(1, -1)] {
        assert!(RenderPass::new(id, out, IntRect::default(), Transform3d::default()).is_err());
    }
}

#[test]
fn quads_must_use_states_of_their_own_pass() {
    let out = IntRect::new(0, 0, 4, 4);
    let mut a = RenderPass::new(RenderPassId::new(1, 0), out, out, Transform3d::default()).unwrap();
    let mut b = RenderPass::new(RenderPassId::new(2, 0), out, out, Transform3d::default()).unwrap();
    let foreign = solid_quad(&mut a, out);

    let err = b.append_quad(foreign).unwrap_err();
    assert!(matches!(err, TesseraError::Contract(_)));
    assert!(b.quads().is_empty());
}

#[test]
fn shared_state_ids_stay_valid_as_more_are_appended() {
    let out = IntRect::new(0, 0, 4, 4);
    let mut pass = RenderPass::new(RenderPassId::new(1, 0), out, out, Transform3d::default()).unwrap();
    let first = pass.create_and_append_shared_state();
    first.opacity = 0.25;
    let first = first.id();
    for _ in 0..64 {
        pass.create_and_append_shared_state();
    }
    assert_eq!(pass.shared_quad_state(first).unwrap().opacity, 0.25);
    assert_eq!(first.index(), 0);
    assert_eq!(first.pass(), pass.id());
}

#[test]
fn deep_copy_preserves_structure() {
    let out = IntRect::new(0, 0, 32, 32);
    let mut pass = RenderPass::new(RenderPassId::new(1, 0), out, out, Transform3d::default()).unwrap();
    let s0 = pass.create_and_append_shared_state();
    s0.content_bounds = IntSize::new(16, 8);
    let s0 = s0.id();
    let s1 = pass.create_and_append_shared_state();
    s1.opacity = 0.5;
    s1.content_bounds = IntSize::new(16, 16);
    let s1 = s1.id();
    for (sid, rect, visible) in [
        (s0, IntRect::new(0, 0, 8, 8), IntRect::new(2, 0, 6, 8)),
        (s0, IntRect::new(8, 0, 8, 8), IntRect::new(8, 0, 8, 8)),
        (s1, IntRect::new(0, 8, 8, 8), IntRect::new(0, 8, 8, 3)),
        (s1, IntRect::new(8, 8, 8, 8), IntRect::new(8, 8, 8, 8)),
    ] {
        pass.append_quad(Quad::new(sid, rect, visible, Material::solid_color(Rgba8::BLACK)).unwrap())
            .unwrap();
    }

    let copies = RenderPass::copy_all(std::slice::from_ref(&pass)).unwrap();
    let copy = &copies[0];
    assert_eq!(copy.id(), pass.id());
    assert_eq!(copy.shared_quad_states().len(), 2);
    assert_eq!(copy.quads().len(), 4);
    for (a, b) in copy.quads().iter().zip(pass.quads()) {
        assert_eq!(a.rect(), b.rect());
        assert_eq!(a.visible_rect(), b.visible_rect());
        assert_eq!(a.shared_state().index(), b.shared_state().index());
        assert_eq!(
            copy.shared_quad_state(a.shared_state()).unwrap().content_bounds,
            pass.shared_quad_state(b.shared_state()).unwrap().content_bounds,
        );
    }
    assert_eq!(copy.quads()[0].visible_rect(), IntRect::new(2, 0, 6, 8));
    assert_eq!(copy.shared_quad_state(s0).unwrap().content_bounds, IntSize::new(16, 8));
    assert_eq!(copy.shared_quad_state(s1).unwrap().opacity, 0.5);
    copy.validate().unwrap();
}

#[test]
fn deep_copy_refuses_pending_copy_requests() {
    let out = IntRect::new(0, 0, 4, 4);
    let mut pass = RenderPass::new(RenderPassId::new(1, 0), out, out, Transform3d::default()).unwrap();
    let delivered = Arc::new(Mutex::new(0));
    let d = Arc::clone(&delivered);
    pass.request_copy_of_output(CopyOutputRequest::new(move |_| *d.lock().unwrap() += 1));

    let err = RenderPass::copy_all(std::slice::from_ref(&pass)).unwrap_err();
    assert!(matches!(err, TesseraError::Contract(_)));
    assert!(pass.has_copy_requests());

    drop(pass);
    assert_eq!(*delivered.lock().unwrap(), 1);
}

#[test]
fn set_all_rebinds_states_and_quads_to_the_new_id() {
    let out = IntRect::new(0, 0, 8, 8);
    let mut pass = RenderPass::new(RenderPassId::new(1, 0), out, out, Transform3d::default()).unwrap();
    let q = solid_quad(&mut pass, out);
    pass.append_quad(q).unwrap();

    pass.set_all(RenderPassId::new(5, 1), out, out, Transform3d::default(), true)
        .unwrap();
    assert_eq!(pass.quads()[0].shared_state().pass(), RenderPassId::new(5, 1));
    assert!(pass.shared_quad_state(pass.quads()[0].shared_state()).is_some());
    pass.validate().unwrap();
}

#[test]
fn resources_include_duplicates() {
    let out = IntRect::new(0, 0, 8, 8);
    let mut pass = RenderPass::new(RenderPassId::new(1, 0), out, out, Transform3d::default()).unwrap();
    let sid = pass.create_and_append_shared_state().id();
    for _ in 0..2 {
        pass.append_quad(Quad::new(sid, out, out, Material::texture(ResourceId(4))).unwrap())
            .unwrap();
    }
    let mut seen = Vec::new();
    pass.iterate_resources(|id| seen.push(id));
    assert_eq!(seen, vec![ResourceId(4), ResourceId(4)]);
}

#[test]
fn take_copy_requests_empties_the_queue() {
    let out = IntRect::new(0, 0, 4, 4);
    let mut pass = RenderPass::new(RenderPassId::new(1, 0), out, out, Transform3d::default()).unwrap();
    pass.request_copy_of_output(CopyOutputRequest::new(|_| {}));
    assert_eq!(pass.take_copy_requests().len(), 1);
    assert!(!pass.has_copy_requests());
}
