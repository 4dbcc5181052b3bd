use super::*;

#[test]
fn parse_classifies_strings() {
    assert!(matches!(SourceRef::parse("data:,x"), SourceRef::DataUri(_)));
    assert!(matches!(SourceRef::parse("https://x/y.png"), SourceRef::Remote(_)));
    assert!(matches!(SourceRef::parse("img/a.png"), SourceRef::Path(_)));
}

#[test]
fn data_uri_base64_and_percent() {
    let (b, media) = decode_data_uri("data:image/png;base64,aGVs bG8=").unwrap();
    assert_eq!(b, b"hello");
    assert_eq!(media, "image/png");

    let (b, media) = decode_data_uri("data:,a%20b").unwrap();
    assert_eq!(b, b"a b");
    assert_eq!(media, "text/plain");
}

#[test]
fn malformed_data_uris_are_source_errors() {
    for bad in ["data:nocomma", "data:;base64,***", "data:,%zz", "data:,%4"] {
        assert!(
            matches!(decode_data_uri(bad), Err(TesseraError::Source(_))),
            "{bad}"
        );
    }
}

#[test]
fn default_resolver_rejects_remote() {
    let r = DefaultResolver::new();
    let err = r.resolve(&SourceRef::Remote("https://example.com/a.png".into()));
    assert!(matches!(err, Err(TesseraError::Source(_))));
}

#[test]
fn default_resolver_reads_files_under_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.bin"), [1u8, 2, 3]).unwrap();
    let r = DefaultResolver::with_root(dir.path());
    assert_eq!(r.resolve(&SourceRef::from("a.bin")).unwrap(), vec![1, 2, 3]);
    assert!(matches!(
        r.resolve(&SourceRef::from("missing.bin")),
        Err(TesseraError::Resource(_))
    ));
}

#[test]
fn keys_are_stable_and_content_addressed() {
    let a = SourceRef::Bytes(vec![1, 2, 3]);
    let b = SourceRef::Bytes(vec![1, 2, 3]);
    assert_eq!(a.key(), b.key());
    assert_ne!(a.key(), SourceRef::Bytes(vec![3, 2, 1]).key());
}

#[test]
fn empty_sources_fail_validation() {
    let err = SourceRef::Path(PathBuf::new()).validate("overlay").unwrap_err();
    assert_eq!(err.op_tag(), Some("overlay"));
}
