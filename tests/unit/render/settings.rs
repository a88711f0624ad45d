use super::*;

fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
    move |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| (*v).to_string())
    }
}

#[test]
fn missing_fields_take_defaults() {
    let s: RendererSettings = serde_json::from_str(r#"{"partial_swap": true}"#).unwrap();
    assert!(s.partial_swap);
    assert_eq!(s.clear_rgba, Rgba8::BLACK);
    assert_eq!(s.max_frames_pending, 2);
    assert_eq!(s.pool, SurfacePoolOpts::default());
}

#[test]
fn overrides_apply_when_parseable() {
    let s = RendererSettings::default().with_overrides_from(vars(&[
        ("TESSERA_PARTIAL_SWAP", "on"),
        ("TESSERA_MAX_FRAMES_PENDING", "5"),
        ("TESSERA_SURFACE_POOL_BYTES", "1024"),
    ]));
    assert!(s.partial_swap);
    assert_eq!(s.max_frames_pending, 5);
    assert_eq!(s.pool.max_pool_bytes, 1024);
}

#[test]
fn garbage_and_zero_overrides_are_ignored() {
    let s = RendererSettings::default().with_overrides_from(vars(&[
        ("TESSERA_PARTIAL_SWAP", "maybe"),
        ("TESSERA_MAX_FRAMES_PENDING", "0"),
        ("TESSERA_SURFACE_POOL_BYTES", "lots"),
    ]));
    assert_eq!(s, RendererSettings::default());
}

#[test]
fn explicit_sentinel_wins() {
    let s = RendererSettings {
        sentinel_rgba: Some(Rgba8::new(1, 2, 3, 255)),
        ..Default::default()
    };
    assert_eq!(s.sentinel_color(), Rgba8::new(1, 2, 3, 255));
    let expected = if cfg!(debug_assertions) {
        Rgba8::MAGENTA
    } else {
        Rgba8::WHITE
    };
    assert_eq!(RendererSettings::default().sentinel_color(), expected);
}
