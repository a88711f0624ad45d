use super::*;

#[test]
fn premultiply_rounds_to_nearest() {
    let p = Rgba8::new(255, 128, 0, 128).premultiply();
    assert_eq!(p, Rgba8Premul { r: 128, g: 64, b: 0, a: 128 });
    assert_eq!(Rgba8::WHITE.premultiply().to_array(), [255, 255, 255, 255]);
    assert_eq!(Rgba8::TRANSPARENT.premultiply(), Rgba8Premul::transparent());
}

#[test]
fn alpha_scaling_keeps_color_channels() {
    let c = Rgba8::new(10, 20, 30, 200).with_alpha_scaled(0.5);
    assert_eq!((c.r, c.g, c.b), (10, 20, 30));
    assert_eq!(c.a, 100);
    assert!(Rgba8::BLACK.is_opaque());
    assert!(!c.is_opaque());
}

#[test]
fn colors_deserialize_from_channel_objects() {
    let c: Rgba8 = serde_json::from_str(r#"{"r":1,"g":2,"b":3,"a":4}"#).unwrap();
    assert_eq!(c.to_array(), [1, 2, 3, 4]);
}
