use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        TesseraError::validation("crop", "x")
            .to_string()
            .contains("validation error [crop]:")
    );
    assert!(
        TesseraError::capability("swirl")
            .to_string()
            .contains("no backend supports operation 'swirl'")
    );
    assert!(
        TesseraError::resolution("x")
            .to_string()
            .contains("resolution error:")
    );
    assert!(
        TesseraError::backend("magick", "x")
            .to_string()
            .contains("backend error (magick):")
    );
    assert!(
        TesseraError::resource("x")
            .to_string()
            .contains("resource error:")
    );
}

#[test]
fn op_tag_is_exposed_for_validation_and_capability() {
    assert_eq!(TesseraError::validation("blur", "x").op_tag(), Some("blur"));
    assert_eq!(TesseraError::capability("wave").op_tag(), Some("wave"));
    assert_eq!(TesseraError::resolution("x").op_tag(), None);
}

#[test]
fn timeouts_count_as_backend_failures() {
    let err = TesseraError::BackendTimeout {
        backend: "magick".to_owned(),
        after_ms: 10,
    };
    assert!(err.is_backend_failure());
    assert!(err.to_string().contains("timed out after 10 ms"));
    assert!(!TesseraError::render("x").is_backend_failure());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = TesseraError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
