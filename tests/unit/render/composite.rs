use super::*;

fn pixmap(w: u16, h: u16, rgba: [u8; 4]) -> vello_cpu::Pixmap {
    let mut p = vello_cpu::Pixmap::new(w, h);
    clear_pixmap(&mut p, rgba);
    p
}

fn px(p: &vello_cpu::Pixmap, x: usize, y: usize) -> [u8; 4] {
    let i = (y * usize::from(p.width()) + x) * 4;
    let d = p.data_as_u8_slice();
    [d[i], d[i + 1], d[i + 2], d[i + 3]]
}

#[test]
fn opaque_over_replaces_destination() {
    let mut dst = [10u8, 20, 30, 255];
    premul_over_in_place_opacity(&mut dst, &[200, 100, 50, 255], 1.0).unwrap();
    assert_eq!(dst, [200, 100, 50, 255]);
}

#[test]
fn half_opacity_over_black() {
    let mut dst = [0u8, 0, 0, 255];
    premul_over_in_place_opacity(&mut dst, &[255, 255, 255, 255], 0.5).unwrap();
    assert_eq!(dst, [128, 128, 128, 255]);
}

#[test]
fn zero_opacity_leaves_destination() {
    let mut dst = [1u8, 2, 3, 4];
    composite_over_rgba8_premul(&mut dst, &[255, 0, 0, 255], 0.0, BlendMode::Multiply).unwrap();
    assert_eq!(dst, [1, 2, 3, 4]);
}

#[test]
fn multiply_against_white_is_identity() {
    let mut dst = [255u8, 255, 255, 255];
    composite_over_rgba8_premul(&mut dst, &[64, 128, 192, 255], 1.0, BlendMode::Multiply)
        .unwrap();
    assert_eq!(dst, [64, 128, 192, 255]);
}

#[test]
fn screen_against_black_is_identity() {
    let mut dst = [0u8, 0, 0, 255];
    composite_over_rgba8_premul(&mut dst, &[64, 128, 192, 255], 1.0, BlendMode::Screen).unwrap();
    assert_eq!(dst, [64, 128, 192, 255]);
}

#[test]
fn mismatched_rows_are_rejected() {
    let mut dst = [0u8; 8];
    assert!(composite_over_rgba8_premul(&mut dst, &[0u8; 4], 1.0, BlendMode::Normal).is_err());
    assert!(mask_apply_alpha_in_place(&mut dst, &[0u8; 4]).is_err());
}

#[test]
fn mask_alpha_scales_all_channels() {
    let mut src = [200u8, 100, 50, 255, 200, 100, 50, 255];
    mask_apply_alpha_in_place(&mut src, &[0, 0, 0, 0, 9, 9, 9, 255]).unwrap();
    assert_eq!(src, [0, 0, 0, 0, 200, 100, 50, 255]);
}

#[test]
fn region_composite_respects_offset_and_clip() {
    let mut dst = pixmap(4, 4, [0, 0, 0, 255]);
    let src = pixmap(2, 2, [255, 0, 0, 255]);
    composite_region(
        &mut dst,
        IntRect::new(0, 0, 4, 3),
        &src,
        (2, 2),
        CompositeOp::Source,
    )
    .unwrap();
    assert_eq!(px(&dst, 2, 2), [255, 0, 0, 255]);
    assert_eq!(px(&dst, 3, 2), [255, 0, 0, 255]);
    assert_eq!(px(&dst, 2, 3), [0, 0, 0, 255]);
    assert_eq!(px(&dst, 1, 2), [0, 0, 0, 255]);
}

#[test]
fn region_composite_blends_with_opacity() {
    let mut dst = pixmap(2, 1, [0, 0, 0, 0]);
    let src = pixmap(2, 1, [0, 0, 255, 255]);
    composite_region(
        &mut dst,
        IntRect::new(0, 0, 2, 1),
        &src,
        (0, 0),
        CompositeOp::Blend {
            opacity: 0.5,
            mode: BlendMode::Normal,
        },
    )
    .unwrap();
    assert_eq!(px(&dst, 0, 0), [0, 0, 128, 128]);
}

#[test]
fn clear_rect_clips_to_pixmap() {
    let mut p = pixmap(3, 3, [0, 0, 0, 0]);
    clear_rect(&mut p, IntRect::new(2, -1, 5, 2), [9, 9, 9, 9]);
    assert_eq!(px(&p, 2, 0), [9, 9, 9, 9]);
    assert_eq!(px(&p, 1, 0), [0, 0, 0, 0]);
    assert_eq!(px(&p, 2, 1), [0, 0, 0, 0]);
}
