use super::*;
use crate::foundation::core::Rgba8;
use crate::foundation::geometry::IntSize;

fn sid() -> SharedStateId {
    SharedStateId {
        pass: RenderPassId::new(1, 0),
        index: 0,
    }
}

fn state(opacity: f32, bounds: IntSize) -> SharedQuadState {
    let mut s = SharedQuadState::new(sid());
    s.opacity = opacity;
    s.content_bounds = bounds;
    s
}

fn translucent_texture() -> Material {
    Material::texture(ResourceId(1))
}

#[test]
fn visible_rect_must_lie_inside_rect() {
    let rect = IntRect::new(0, 0, 10, 10);
    let err = Quad::create(
        sid(),
        rect,
        IntRect::default(),
        IntRect::new(5, 5, 10, 10),
        false,
        Material::solid_color(Rgba8::WHITE),
    )
    .unwrap_err();
    assert!(matches!(err, TesseraError::Validation(_)));
}

#[test]
fn non_empty_opaque_rect_must_lie_inside_rect() {
    let rect = IntRect::new(0, 0, 10, 10);
    assert!(
        Quad::create(
            sid(),
            rect,
            IntRect::new(-1, 0, 4, 4),
            rect,
            false,
            Material::solid_color(Rgba8::WHITE),
        )
        .is_err()
    );
    // Empty opaque rects may sit anywhere.
    assert!(
        Quad::create(
            sid(),
            rect,
            IntRect::new(50, 50, 0, 0),
            rect,
            false,
            Material::solid_color(Rgba8::WHITE),
        )
        .is_ok()
    );
}

#[test]
fn failed_set_all_leaves_quad_untouched() {
    let rect = IntRect::new(0, 0, 10, 10);
    let mut q = Quad::new(sid(), rect, rect, Material::solid_color(Rgba8::WHITE)).unwrap();
    let before = q.clone();
    assert!(
        q.set_all(
            sid(),
            rect,
            IntRect::default(),
            IntRect::new(0, 0, 11, 10),
            true,
            translucent_texture(),
        )
        .is_err()
    );
    assert_eq!(q, before);
}

#[test]
fn new_derives_opacity_hints_from_the_material() {
    let rect = IntRect::new(0, 0, 4, 4);
    let solid = Quad::new(sid(), rect, rect, Material::solid_color(Rgba8::WHITE)).unwrap();
    assert_eq!(solid.opaque_rect(), rect);
    assert!(!solid.needs_blending());

    let half = Quad::new(
        sid(),
        rect,
        rect,
        Material::solid_color(Rgba8::new(255, 255, 255, 128)),
    )
    .unwrap();
    assert!(half.opaque_rect().is_empty());

    let border = Quad::new(
        sid(),
        rect,
        rect,
        Material::DebugBorder(DebugBorderMaterial {
            color: Rgba8::new(255, 0, 0, 100),
            width: 1.0,
        }),
    )
    .unwrap();
    assert!(border.needs_blending());
}

#[test]
fn opacity_below_one_forces_blending() {
    let rect = IntRect::new(0, 0, 4, 4);
    let q = Quad::create(
        sid(),
        rect,
        IntRect::default(),
        rect,
        false,
        translucent_texture(),
    )
    .unwrap();
    assert!(q.should_draw_with_blending(&state(0.5, IntSize::new(4, 4))));
}

#[test]
fn opaque_full_opacity_quad_does_not_blend() {
    let rect = IntRect::new(0, 0, 4, 4);
    let q = Quad::new(sid(), rect, rect, Material::solid_color(Rgba8::BLACK)).unwrap();
    assert!(!q.should_draw_with_blending(&state(1.0, IntSize::new(4, 4))));
    assert!(q.should_draw_with_blending(&state(0.99, IntSize::new(4, 4))));
}

#[test]
fn resources_per_material() {
    let rect = IntRect::new(0, 0, 4, 4);
    let ids = |m: Material| Quad::new(sid(), rect, rect, m).unwrap().resource_ids();

    assert!(ids(Material::solid_color(Rgba8::WHITE)).is_empty());
    assert!(ids(Material::Checkerboard(CheckerboardMaterial { color: Rgba8::WHITE })).is_empty());
    assert!(ids(Material::Unsupported(UnsupportedMaterial::default())).is_empty());
    assert_eq!(ids(translucent_texture()).as_slice(), &[ResourceId(1)]);
    assert_eq!(
        ids(Material::Tile(TileMaterial {
            resource_id: ResourceId(9),
            tex_coord_rect: rect.to_rect(),
        }))
        .as_slice(),
        &[ResourceId(9)]
    );

    let bare = Material::render_pass(RenderPassId::new(2, 0));
    assert!(ids(bare.clone()).is_empty());
    let Material::RenderPassReference(mut masked) = bare else {
        unreachable!()
    };
    masked.mask_resource_id = Some(ResourceId(5));
    assert_eq!(
        ids(Material::RenderPassReference(masked)).as_slice(),
        &[ResourceId(5)]
    );
}

#[test]
fn copy_rebinds_state_and_keeps_geometry() {
    let rect = IntRect::new(1, 2, 3, 4);
    let q = Quad::new(sid(), rect, IntRect::new(1, 2, 1, 1), translucent_texture()).unwrap();
    let other = SharedStateId {
        pass: RenderPassId::new(7, 1),
        index: 3,
    };
    let c = q.copy(other);
    assert_eq!(c.shared_state(), other);
    assert_eq!(c.rect(), q.rect());
    assert_eq!(c.visible_rect(), q.visible_rect());
    assert_eq!(c.material(), q.material());
    assert!(c.is_partially_occluded());
}

#[test]
fn copy_can_retarget_render_pass_references() {
    let rect = IntRect::new(0, 0, 4, 4);
    let q = Quad::new(sid(), rect, rect, Material::render_pass(RenderPassId::new(2, 0))).unwrap();
    let c = q.copy_with_render_pass_id(sid(), RenderPassId::new(9, 9));
    assert!(matches!(
        c.material(),
        Material::RenderPassReference(m) if m.render_pass_id == RenderPassId::new(9, 9)
    ));

    let solid = Quad::new(sid(), rect, rect, Material::solid_color(Rgba8::WHITE)).unwrap();
    assert_eq!(
        solid.copy_with_render_pass_id(sid(), RenderPassId::new(9, 9)),
        solid
    );
}

#[test]
fn edges_follow_content_bounds() {
    let s = state(1.0, IntSize::new(20, 10));
    let full = Quad::new(
        sid(),
        IntRect::new(0, 0, 20, 10),
        IntRect::new(0, 0, 20, 10),
        Material::solid_color(Rgba8::WHITE),
    )
    .unwrap();
    assert!(full.all_edges_exterior(&s));

    let inner = Quad::new(
        sid(),
        IntRect::new(5, 2, 5, 5),
        IntRect::new(5, 2, 5, 5),
        Material::solid_color(Rgba8::WHITE),
    )
    .unwrap();
    assert!(!inner.is_edge(&s));

    let right_tile = Quad::new(
        sid(),
        IntRect::new(10, 0, 10, 5),
        IntRect::new(10, 0, 10, 5),
        Material::solid_color(Rgba8::WHITE),
    )
    .unwrap();
    assert!(right_tile.is_right_edge(&s));
    assert!(right_tile.is_top_edge());
    assert!(!right_tile.is_left_edge());
    assert!(!right_tile.is_bottom_edge(&s));
    assert!(!right_tile.all_edges_exterior(&s));
}

#[test]
fn serde_tags_materials_by_kind() {
    let rect = IntRect::new(0, 0, 2, 2);
    let q = Quad::new(sid(), rect, rect, Material::solid_color(Rgba8::WHITE)).unwrap();
    let v = serde_json::to_value(&q).unwrap();
    assert_eq!(v["material"]["kind"], "solid_color");
    let back: Quad = serde_json::from_value(v).unwrap();
    assert_eq!(back, q);
}
