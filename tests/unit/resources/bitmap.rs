use std::io::Cursor;

use super::*;

#[test]
fn decode_png_premultiplies() {
    let img = image::RgbaImage::from_raw(1, 1, vec![100u8, 50, 200, 128]).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let bitmap = Bitmap::decode(&buf).unwrap();
    assert_eq!(bitmap.size(), IntSize::new(1, 1));
    assert_eq!(
        bitmap.pixel(0, 0),
        [
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128
        ]
    );
    assert!(!bitmap.is_opaque());
}

#[test]
fn decode_rejects_garbage() {
    assert!(Bitmap::decode(b"definitely not an image").is_err());
}

#[test]
fn solid_bitmaps_track_opacity() {
    let opaque = Bitmap::solid(3, 2, Rgba8::new(10, 20, 30, 255)).unwrap();
    assert!(opaque.is_opaque());
    assert_eq!(opaque.data().len(), 3 * 2 * 4);
    assert_eq!(opaque.pixel(2, 1), [10, 20, 30, 255]);
    assert_eq!(opaque.pixel(3, 0), [0, 0, 0, 0]);

    let clear = Bitmap::solid(1, 1, Rgba8::TRANSPARENT).unwrap();
    assert!(!clear.is_opaque());
}

#[test]
fn byte_length_mismatch_is_rejected() {
    assert!(Bitmap::from_premul_rgba8(2, 2, &[0u8; 12]).is_err());
}

#[test]
fn crop_copies_rows() {
    let mut bytes = Vec::new();
    for i in 0..16u8 {
        bytes.extend_from_slice(&[i, i, i, 255]);
    }
    let b = Bitmap::from_premul_rgba8(4, 4, &bytes).unwrap();
    let c = b.crop(IntRect::new(1, 2, 2, 5)).unwrap();
    assert_eq!(c.size(), IntSize::new(2, 2));
    assert_eq!(c.pixel(0, 0)[0], 9);
    assert_eq!(c.pixel(1, 1)[0], 14);
    assert!(b.crop(IntRect::new(10, 10, 2, 2)).is_err());
}

#[test]
fn straight_export_undoes_premultiplication() {
    let b = Bitmap::from_straight_rgba8(1, 1, &[200, 100, 0, 128]).unwrap();
    let straight = b.to_straight_rgba8();
    assert!((i32::from(straight[0]) - 200).abs() <= 1);
    assert!((i32::from(straight[1]) - 100).abs() <= 1);
    assert_eq!(straight[3], 128);
}

#[test]
fn solid_rejects_oversized_dimensions_up_front() {
    let err = Bitmap::solid(60_000, 60_000, Rgba8::WHITE).unwrap_err();
    assert!(matches!(err, TesseraError::Validation(_)));
    let err = Bitmap::solid(u32::MAX, 1, Rgba8::WHITE).unwrap_err();
    assert!(matches!(err, TesseraError::Validation(_)));
    assert_eq!(Bitmap::solid(3, 2, Rgba8::WHITE).unwrap().size(), IntSize::new(3, 2));
}
