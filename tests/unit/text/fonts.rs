use super::*;
use crate::assets::DefaultResolver;

#[test]
fn register_face_is_idempotent_per_content() {
    let reg = FontRegistry::new();
    let a = reg.register_face("a", vec![1, 2, 3]).unwrap();
    let again = reg.register_face("other-name", vec![1, 2, 3]).unwrap();
    assert!(Arc::ptr_eq(&a, &again));
    reg.register_face("b", vec![4, 5, 6]).unwrap();
    assert_eq!(reg.len(), 2);
}

#[test]
fn register_by_source_reads_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("f.ttf");
    std::fs::write(&path, [9u8; 16]).unwrap();
    let reg = FontRegistry::new();
    let resolver = DefaultResolver::new();
    let src = SourceRef::Path(path.clone());
    let first = reg.register("body", &src, &resolver).unwrap();
    std::fs::remove_file(&path).unwrap();
    let second = reg.register("body", &src, &resolver).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn resolve_by_name_and_default() {
    let reg = FontRegistry::new();
    let any = FaceStyle::default();
    assert!(matches!(reg.resolve(None, any), Err(TesseraError::Resource(_))));
    reg.register_face("first", vec![1]).unwrap();
    reg.register_face("second", vec![2]).unwrap();
    assert_eq!(reg.resolve(None, any).unwrap().name, "first");
    assert_eq!(reg.resolve(Some("second"), any).unwrap().name, "second");
    assert!(matches!(reg.resolve(Some("nope"), any), Err(TesseraError::Resource(_))));
}

#[test]
fn unreadable_font_source_is_a_resource_error() {
    let reg = FontRegistry::new();
    let err = reg
        .register("x", &SourceRef::from("/definitely/missing.ttf"), &DefaultResolver::new())
        .unwrap_err();
    assert!(matches!(err, TesseraError::Resource(_)));
}

#[test]
fn family_keeps_every_registered_face() {
    let reg = FontRegistry::new();
    reg.register_styled_face("Inter", FaceStyle::REGULAR, vec![1, 2, 3]).unwrap();
    reg.register_styled_face("Inter", FaceStyle::BOLD, vec![4, 5, 6]).unwrap();
    reg.register_styled_face("Inter", FaceStyle::new(400, true), vec![7, 8, 9]).unwrap();
    assert_eq!(reg.len(), 3);

    let bytes = |weight, italic| {
        let face = reg.resolve(Some("Inter"), FaceStyle::new(weight, italic)).unwrap();
        face.bytes.as_ref().clone()
    };
    assert_eq!(bytes(400, false), vec![1, 2, 3]);
    assert_eq!(bytes(700, false), vec![4, 5, 6]);
    // nearest weight wins
    assert_eq!(bytes(300, false), vec![1, 2, 3]);
    assert_eq!(bytes(600, false), vec![4, 5, 6]);
    // slant beats weight
    assert_eq!(bytes(700, true), vec![7, 8, 9]);
}

#[test]
fn default_family_resolves_by_style_too() {
    let reg = FontRegistry::new();
    reg.register_styled_face("body", FaceStyle::REGULAR, vec![1]).unwrap();
    reg.register_styled_face("body", FaceStyle::BOLD, vec![2]).unwrap();
    reg.register_face("other", vec![3]).unwrap();
    let bold = reg.resolve(None, FaceStyle::BOLD).unwrap();
    assert_eq!((bold.name.as_str(), bold.style), ("body", FaceStyle::BOLD));
}
