use rstest::rstest;

use super::*;
use crate::backend::NoBatch;
use crate::pipeline::RendererOpts;

fn renderer() -> Renderer {
    Renderer::new(RendererOpts::default()).with_batch_backend(std::sync::Arc::new(NoBatch))
}

#[test]
fn chaining_records_operations_in_order() {
    let asset = Asset::blank(20, 10, Color::WHITE)
        .flip()
        .unwrap()
        .blur(1.5)
        .unwrap()
        .rotate(90.0)
        .unwrap()
        .negate()
        .unwrap();
    let tags: Vec<OpTag> = asset.ops.iter().map(Operation::tag).collect();
    assert_eq!(tags, [OpTag::Flip, OpTag::Blur, OpTag::Rotate, OpTag::Negate]);
}

#[rstest]
#[case(Operation::Blur(Blur { sigma: 0.0 }), "blur")]
#[case(Operation::Posterize(Posterize { levels: 1 }), "posterize")]
#[case(Operation::Threshold(Threshold { percent: 120.0 }), "threshold")]
#[case(Operation::Rotate(Rotate::from(f64::NAN)), "rotate")]
fn invalid_parameters_name_the_operation(#[case] op: Operation, #[case] tag: &str) {
    let err = Asset::blank(4, 4, Color::WHITE).push(op).unwrap_err();
    assert_eq!(err.op_tag(), Some(tag));
}

#[test]
fn invalid_op_leaves_no_trace_in_a_clone() {
    let base = Asset::blank(4, 4, Color::WHITE).flip().unwrap();
    assert!(base.clone().posterize(0u32).is_err());
    assert_eq!(base.ops.len(), 1);
}

fn nested(levels: usize) -> Asset {
    let mut asset = Asset::blank(2, 2, Color::BLACK);
    for _ in 0..levels {
        asset = Asset {
            source: AssetSource::Blank {
                width: 2,
                height: 2,
                color: Color::WHITE,
            },
            ops: vec![Operation::Overlay(Box::new(Layer::new(asset)))],
        };
    }
    asset
}

#[test]
fn nesting_depth_counts_embedded_assets() {
    assert_eq!(Asset::blank(1, 1, Color::WHITE).nesting_depth(), 0);
    assert_eq!(nested(3).nesting_depth(), 3);
    let grouped = Asset::blank(4, 4, Color::WHITE)
        .group(Group::new(vec![
            Layer::new(nested(1)),
            Layer::new(nested(4)),
        ]))
        .unwrap();
    assert_eq!(grouped.nesting_depth(), 5);
}

#[test]
fn overlay_past_the_nesting_limit_is_rejected() {
    let deep = nested(MAX_NESTING_DEPTH);
    assert!(deep.validate().is_ok());
    let err = Asset::blank(2, 2, Color::WHITE)
        .overlay(Layer::new(deep))
        .unwrap_err();
    assert_eq!(err.op_tag(), Some("overlay"));
}

#[test]
fn empty_blank_canvas_fails_validation() {
    let err = Asset::blank(0, 5, Color::WHITE).validate().unwrap_err();
    assert_eq!(err.op_tag(), Some("source"));
}

#[test]
fn json_round_trip_keeps_the_pipeline() {
    let asset = Asset::from_path("photos/cat.png")
        .resize(Resize::to(320, 200).fit(Fit::Cover))
        .unwrap()
        .sepia(70.0)
        .unwrap()
        .overlay(Layer::new(Asset::blank(8, 8, Color::rgb(255, 0, 0))).opacity(0.5))
        .unwrap();
    let json = asset.to_json().unwrap();
    assert!(json.contains("\"op\": \"sepia\""), "{json}");
    assert_eq!(Asset::from_json(&json).unwrap(), asset);
}

#[test]
fn from_json_validates_again() {
    let json = r#"{
        "source": { "type": "blank", "width": 4, "height": 4 },
        "ops": [ { "op": "flip" }, { "op": "blur", "sigma": -1 } ]
    }"#;
    let err = Asset::from_json(json).unwrap_err();
    assert_eq!(err.op_tag(), Some("blur"));

    let err = Asset::from_json("{ not json").unwrap_err();
    assert_eq!(err.op_tag(), Some("asset"));
}

#[test]
fn from_json_file_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.json");
    std::fs::write(
        &path,
        r##"{ "source": { "type": "blank", "width": 3, "height": 2, "color": "#00ff00" },
              "ops": [ { "op": "negate" } ] }"##,
    )
    .unwrap();
    let asset = Asset::from_json_file(&path).unwrap();
    assert_eq!(asset.ops, vec![Operation::Negate]);

    let raster = asset.render_with(&renderer()).unwrap().raster;
    assert_eq!(raster.pixel(0, 0), [255, 0, 255, 255]);
}

#[test]
fn in_memory_rasters_do_not_serialize() {
    let asset = Asset::from_raster(Raster::new(2, 2).unwrap());
    assert_eq!(asset.to_json().unwrap_err().op_tag(), Some("asset"));
}

#[test]
fn blank_source_renders_its_color() {
    let raster = Asset::blank(5, 3, Color::rgb(10, 20, 30)).render().unwrap();
    assert_eq!((raster.width, raster.height), (5, 3));
    assert_eq!(raster.pixel(4, 2), [10, 20, 30, 255]);
}

#[test]
fn rendering_leaves_the_asset_untouched() {
    let asset = Asset::blank(6, 4, Color::WHITE).crop(Crop::px(0.0, 0.0, 3.0, 2.0)).unwrap();
    let before = asset.clone();
    let a = asset.render_with(&renderer()).unwrap().raster;
    let b = asset.render_with(&renderer()).unwrap().raster;
    assert_eq!(a, b);
    assert_eq!((a.width, a.height), (3, 2));
    assert_eq!(asset, before);
}

#[test]
fn exports_encode_the_rendered_image() {
    let asset = Asset::blank(4, 4, Color::rgb(0, 0, 255));
    let png = asset.to_bytes().unwrap();
    assert_eq!(crate::encode::sniff_mime(&png), Some("image/png"));
    assert!(asset.to_base64().unwrap().starts_with("data:image/png;base64,"));

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out").join("blue.jpg");
    asset.to_file(&out).unwrap();
    let written = std::fs::read(&out).unwrap();
    assert_eq!(crate::encode::sniff_mime(&written), Some("image/jpeg"));
    assert!(asset.to_file(dir.path().join("blue.bmp")).is_err());
}
