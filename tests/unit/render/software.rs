use super::*;
use crate::foundation::transform::Transform3d;
use crate::frame::InMemoryOutputSurface;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn solid_root(size: i32, color: Rgba8) -> RenderPassList {
    let out = IntRect::new(0, 0, size, size);
    let mut pass = RenderPass::new(RenderPassId::new(1, 0), out, out, Transform3d::default()).unwrap();
    let sid = pass.create_and_append_shared_state().id();
    pass.append_quad(Quad::new(sid, out, out, Material::solid_color(color)).unwrap())
        .unwrap();
    RenderPassList::from(vec![pass])
}

#[test]
fn snap_rounds_corners_to_whole_pixels() {
    let a = Affine::translate((0.4, 0.6)) * Affine::scale(1.5);
    let snapped = snap_to_pixels(a, Rect::new(0.0, 0.0, 10.0, 10.0));
    let p0 = snapped * Point::new(0.0, 0.0);
    let p1 = snapped * Point::new(10.0, 10.0);
    assert!(approx(p0.x, 0.0) && approx(p0.y, 1.0));
    assert!(approx(p1.x, 15.0) && approx(p1.y, 16.0));
}

#[test]
fn rect_to_rect_maps_corners_and_mirrors() {
    let a = rect_to_rect(Rect::new(0.0, 0.0, 4.0, 2.0), Rect::new(10.0, 10.0, 18.0, 12.0)).unwrap();
    assert_eq!(a * Point::new(4.0, 2.0), Point::new(18.0, 12.0));

    let flipped = rect_to_rect(Rect::new(0.0, 2.0, 4.0, 0.0), Rect::new(0.0, 0.0, 4.0, 2.0)).unwrap();
    assert_eq!(flipped * Point::new(0.0, 2.0), Point::new(0.0, 0.0));

    assert!(rect_to_rect(Rect::new(1.0, 1.0, 1.0, 5.0), Rect::new(0.0, 0.0, 4.0, 4.0)).is_none());
}

#[test]
fn border_width_is_at_least_one_pixel() {
    let m = |width| DebugBorderMaterial {
        color: Rgba8::WHITE,
        width,
    };
    assert_eq!(border_width(&m(0.0)), 1.0);
    assert_eq!(border_width(&m(f32::NAN)), 1.0);
    assert_eq!(border_width(&m(3.0)), 3.0);
}

#[test]
fn wrap_modes_map_to_extends() {
    assert_eq!(extend_for(WrapMode::Clamp), vello_cpu::peniko::Extend::Pad);
    assert_eq!(extend_for(WrapMode::Repeat), vello_cpu::peniko::Extend::Repeat);
}

#[test]
fn singular_transforms_are_not_invertible() {
    assert!(affine_is_invertible(Affine::IDENTITY));
    assert!(!affine_is_invertible(Affine::scale_non_uniform(1.0, 0.0)));
    assert!(!affine_is_invertible(Affine::new([f64::NAN, 0.0, 0.0, 1.0, 0.0, 0.0])));
}

#[test]
fn frame_calls_out_of_order_are_contract_errors() {
    let mut r = SoftwareRenderer::new(RendererSettings::default());
    let mut passes = solid_root(4, Rgba8::WHITE);
    let table = ResourceTable::new();
    let mut surface = InMemoryOutputSurface::new();

    assert!(matches!(
        r.draw_frame(&mut passes, &table),
        Err(TesseraError::Contract(_))
    ));
    assert!(r.finish_frame().is_err());
    assert!(r.swap_buffers(FrameMetadata::default(), &mut surface).is_err());

    r.begin_frame(IntSize::new(4, 4), IntRect::new(0, 0, 4, 4)).unwrap();
    assert!(r.begin_frame(IntSize::new(4, 4), IntRect::new(0, 0, 4, 4)).is_err());
    r.draw_frame(&mut passes, &table).unwrap();
    r.finish_frame().unwrap();
    assert!(r.draw_frame(&mut passes, &table).is_err());
    r.swap_buffers(FrameMetadata::default(), &mut surface).unwrap();
    assert!(surface.frames.len() == 1);
}

#[test]
fn swap_fills_in_viewport_and_ack_frees_the_slot() {
    let mut r = SoftwareRenderer::new(RendererSettings::default());
    let mut passes = solid_root(4, Rgba8::WHITE);
    let table = ResourceTable::new();
    let mut surface = InMemoryOutputSurface::new();

    r.begin_frame(IntSize::new(4, 4), IntRect::default()).unwrap();
    let stats = r.draw_frame(&mut passes, &table).unwrap();
    assert_eq!(stats.passes_drawn, 1);
    assert_eq!(stats.quads_drawn, 1);
    r.finish_frame().unwrap();
    let id = r.swap_buffers(FrameMetadata::default(), &mut surface).unwrap();

    let frame = surface.last().unwrap();
    assert_eq!(frame.metadata.viewport_size, IntSize::new(4, 4));
    assert_eq!(frame.software().unwrap().id, id);
    assert_eq!(r.pending_frames(), 1);

    r.receive_swap_buffers_ack(&surface.ack_last());
    assert_eq!(r.pending_frames(), 0);
}

#[test]
fn discard_returns_to_idle() {
    let mut r = SoftwareRenderer::new(RendererSettings::default());
    let mut passes = solid_root(4, Rgba8::WHITE);
    let table = ResourceTable::new();

    r.begin_frame(IntSize::new(4, 4), IntRect::default()).unwrap();
    r.draw_frame(&mut passes, &table).unwrap();
    r.finish_frame().unwrap();
    r.discard_frame();
    assert_eq!(r.pending_frames(), 0);
    r.begin_frame(IntSize::new(4, 4), IntRect::default()).unwrap();
}

#[test]
fn opaque_axis_aligned_quad_overwrites() {
    let mut r = SoftwareRenderer::new(RendererSettings::default());
    let mut passes = solid_root(8, Rgba8::new(10, 20, 30, 255));
    let table = ResourceTable::new();

    r.begin_frame(IntSize::new(8, 8), IntRect::default()).unwrap();
    let stats = r.draw_frame(&mut passes, &table).unwrap();
    assert_eq!(stats.blended_quads, 0);
    assert_eq!(stats.antialiased_quads, 0);
    let frame = r.finish_frame().unwrap();
    assert_eq!(frame.pixels.pixel(3, 3), [10, 20, 30, 255]);
}
