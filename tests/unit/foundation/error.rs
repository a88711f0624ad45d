use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        TesseraError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        TesseraError::contract("x")
            .to_string()
            .contains("contract violation:")
    );
    assert!(
        TesseraError::resource("x")
            .to_string()
            .contains("resource error:")
    );
    assert!(
        TesseraError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("disk gone");
    let err = TesseraError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("disk gone"));
}

#[test]
fn json_errors_map_to_serde() {
    let err: TesseraError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, TesseraError::Serde(_)));
}
