use std::collections::HashMap;

use super::*;
use crate::compose::Layer;
use crate::encode::{ExportFormat, encode_raster};
use crate::foundation::color::Color;
use crate::ops::{OpTag, Operation, Sepia};

/// Claims sepia but is never reachable.
struct Down;

impl BatchBackend for Down {
    fn name(&self) -> &str {
        "down"
    }

    fn supports(&self, tag: OpTag) -> bool {
        tag == OpTag::Sepia
    }

    fn is_available(&self) -> bool {
        false
    }

    fn apply_batch(&self, _png: &[u8], _ops: &[Operation]) -> TesseraResult<Vec<u8>> {
        Err(TesseraError::backend("down", "unreachable"))
    }
}

fn offline(opts: RendererOpts) -> Renderer {
    Renderer::new(opts).with_batch_backend(Arc::new(Down))
}

#[test]
fn env_overrides_defaults() {
    let vars: HashMap<&str, &str> = [
        ("TESSERA_MAGICK_BINARY", "/opt/im/bin/magick"),
        ("TESSERA_BATCH_TIMEOUT_MS", "1500"),
        ("TESSERA_BATCH_MAX_OUTPUT_BYTES", " 4096 "),
        ("TESSERA_FALLBACK", "Strict"),
    ]
    .into_iter()
    .collect();
    let opts = RendererOpts::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
    assert_eq!(opts.magick_binary, Some(PathBuf::from("/opt/im/bin/magick")));
    assert_eq!(opts.batch_timeout_ms, 1500);
    assert_eq!(opts.batch_max_output_bytes, 4096);
    assert_eq!(opts.fallback, FallbackPolicy::Strict);
}

#[test]
fn unparsable_env_values_are_ignored() {
    let vars: HashMap<&str, &str> = [
        ("TESSERA_MAGICK_BINARY", "  "),
        ("TESSERA_BATCH_TIMEOUT_MS", "soon"),
        ("TESSERA_BATCH_MAX_OUTPUT_BYTES", "0"),
        ("TESSERA_FALLBACK", "sometimes"),
    ]
    .into_iter()
    .collect();
    let opts = RendererOpts::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
    assert_eq!(opts, RendererOpts::default());
}

#[test]
fn opts_deserialize_with_defaults() {
    let opts: RendererOpts =
        serde_json::from_str(r#"{ "fallback": "strict", "threads": 2 }"#).unwrap();
    assert_eq!(
        opts,
        RendererOpts::default()
            .with_fallback(FallbackPolicy::Strict)
            .with_threads(2)
    );
}

#[test]
fn nested_degradations_reach_the_top_level_report() {
    let inner = Asset::blank(4, 4, Color::rgb(90, 120, 200))
        .sepia(Sepia::default())
        .unwrap();
    let outer = Asset::blank(8, 8, Color::WHITE)
        .overlay(Layer::new(inner))
        .unwrap()
        .sepia(Sepia::default())
        .unwrap();

    let rendered = offline(RendererOpts::default()).render(&outer).unwrap();
    assert_eq!((rendered.raster.width, rendered.raster.height), (8, 8));
    let tags: Vec<OpTag> = rendered.report.degradations.iter().map(|d| d.op).collect();
    assert_eq!(tags, vec![OpTag::Sepia, OpTag::Sepia]);
    assert!(rendered.report.degradations.iter().all(|d| d.backend == "down"));
    assert_eq!(rendered.report.batch_invocations, 0);
}

#[test]
fn strict_renderer_fails_when_the_batch_backend_is_down() {
    let asset = Asset::blank(4, 4, Color::WHITE).sepia(Sepia::default()).unwrap();
    let err = offline(RendererOpts::default().with_fallback(FallbackPolicy::Strict))
        .render(&asset)
        .unwrap_err();
    assert!(err.is_backend_failure());
}

fn nested(levels: usize) -> Asset {
    let mut asset = Asset::blank(2, 2, Color::BLACK);
    for _ in 0..levels {
        asset = Asset::blank(2, 2, Color::WHITE)
            .overlay(Layer::new(asset))
            .unwrap();
    }
    asset
}

#[test]
fn configured_depth_limit_applies_while_rendering() {
    let renderer = offline(RendererOpts::default().with_max_nesting_depth(2));
    assert!(renderer.render(&nested(2)).is_ok());
    let err = renderer.render(&nested(3)).unwrap_err();
    assert_eq!(err.op_tag(), Some("overlay"));
}

#[test]
fn relative_sources_resolve_against_the_root() {
    let dir = tempfile::tempdir().unwrap();
    let png = encode_raster(
        &Raster::filled(3, 2, [0, 128, 0, 255]).unwrap(),
        ExportFormat::Png,
    )
    .unwrap();
    std::fs::write(dir.path().join("green.png"), png).unwrap();

    let renderer = offline(RendererOpts::default().with_source_root(dir.path()));
    let rendered = renderer.render(&Asset::from_path("green.png")).unwrap();
    assert_eq!(rendered.raster.pixel(2, 1), [0, 128, 0, 255]);
    // source decoding is not a backend hand-off
    assert_eq!(rendered.report.codec_conversions, 0);
}

#[test]
fn missing_source_is_a_resource_error() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = offline(RendererOpts::default().with_source_root(dir.path()));
    let err = renderer.render(&Asset::from_path("nope.png")).unwrap_err();
    assert!(matches!(err, TesseraError::Resource(_)));
}

#[test]
fn render_all_keeps_input_order_and_isolates_failures() {
    let renderer = offline(RendererOpts::default().with_threads(2));
    let assets = vec![
        Asset::blank(1, 1, Color::WHITE),
        Asset::from_bytes(b"not an image".to_vec()),
        Asset::blank(3, 1, Color::BLACK).flop().unwrap(),
    ];
    let results = renderer.render_all(&assets).unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().raster.width, 1);
    assert!(results[1].is_err());
    assert_eq!(results[2].as_ref().unwrap().raster.width, 3);
}

#[test]
fn in_memory_raster_source_is_used_as_is() {
    let raster = Raster::from_straight(1, 1, vec![255, 0, 0, 128]).unwrap();
    let rendered = offline(RendererOpts::default())
        .render(&Asset::from_raster(raster.clone()))
        .unwrap();
    assert_eq!(rendered.raster, raster);
    assert!(!rendered.report.is_degraded());
}

#[test]
fn shared_renderer_is_built_once() {
    let first = Renderer::shared();
    assert!(std::ptr::eq(first, Renderer::shared()));
    assert_eq!(first.opts(), &RendererOpts::default());
    let raster = Asset::blank(2, 2, Color::WHITE).flop().unwrap().render().unwrap();
    assert_eq!(raster.pixel(1, 1), [255, 255, 255, 255]);
}
