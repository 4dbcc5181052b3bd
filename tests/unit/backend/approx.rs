use rstest::rstest;

use super::*;
use crate::ops::{Contrast, Posterize, Quantize, Roll, Sepia, Solarize};

fn opaque(width: u32, height: u32, rgb: [u8; 3]) -> Raster {
    Raster::filled(width, height, [rgb[0], rgb[1], rgb[2], 255]).unwrap()
}

fn apply(raster: Raster, op: Operation) -> Raster {
    ApproxBackend.apply(raster, &op).unwrap()
}

#[rstest]
#[case(OpTag::Sepia, true)]
#[case(OpTag::Border, true)]
#[case(OpTag::MotionBlur, true)]
#[case(OpTag::Swirl, false)]
#[case(OpTag::Distort, false)]
#[case(OpTag::OilPaint, false)]
#[case(OpTag::Segment, false)]
fn approximation_coverage(#[case] tag: OpTag, #[case] expected: bool) {
    assert_eq!(ApproxBackend.approximates(tag), expected);
}

#[test]
fn unapproximated_ops_report_capability() {
    let err = ApproxBackend
        .apply(opaque(2, 2, [0, 0, 0]), &Operation::Swirl(Default::default()))
        .unwrap_err();
    assert_eq!(err.op_tag(), Some("swirl"));
}

#[test]
fn posterize_two_levels_snaps_to_extremes() {
    let src = Raster::from_premul(2, 1, vec![100, 100, 100, 255, 180, 180, 180, 255]).unwrap();
    let out = apply(src, Operation::Posterize(Posterize { levels: 2 }));
    assert_eq!(out.pixel(0, 0), [0, 0, 0, 255]);
    assert_eq!(out.pixel(1, 0), [255, 255, 255, 255]);
}

#[test]
fn solarize_inverts_above_threshold() {
    let src = Raster::from_premul(2, 1, vec![200, 200, 200, 255, 40, 40, 40, 255]).unwrap();
    let out = apply(src, Operation::Solarize(Solarize { threshold: 50.0 }));
    assert_eq!(out.pixel(0, 0), [55, 55, 55, 255]);
    assert_eq!(out.pixel(1, 0), [40, 40, 40, 255]);
}

#[test]
fn zero_contrast_is_identity() {
    let src = opaque(3, 3, [12, 130, 250]);
    let out = apply(src.clone(), Operation::Contrast(Contrast { amount: 0.0 }));
    assert_eq!(out, src);
}

#[test]
fn sepia_warms_grey() {
    let out = apply(opaque(1, 1, [128, 128, 128]), Operation::Sepia(Sepia { threshold: 100.0 }));
    let [r, g, b, a] = out.pixel(0, 0);
    assert_eq!(a, 255);
    assert!(r > g && g > b);
}

#[test]
fn border_grows_by_twice_the_width() {
    let out = apply(
        opaque(10, 6, [0, 255, 0]),
        Operation::Border(Border {
            width: 3,
            color: Color::rgb(255, 0, 0),
        }),
    );
    assert_eq!((out.width, out.height), (16, 12));
    assert_eq!(out.pixel(0, 0), [255, 0, 0, 255]);
    assert_eq!(out.pixel(8, 6), [0, 255, 0, 255]);
}

#[test]
fn frame_bevels_light_top_left_and_dark_bottom_right() {
    let out = apply(
        opaque(10, 10, [0, 0, 0]),
        Operation::Frame(Frame {
            width: 6,
            color: Color::rgb(128, 128, 128),
            inner_bevel: 2,
            outer_bevel: 2,
        }),
    );
    assert_eq!((out.width, out.height), (22, 22));
    let top = out.pixel(11, 0)[0];
    let bottom = out.pixel(11, 21)[0];
    let flat = out.pixel(11, 3)[0];
    assert!(top > flat && flat > bottom);
    assert_eq!(out.pixel(11, 11), [0, 0, 0, 255]);
}

#[test]
fn roll_wraps_around() {
    let mut data = Vec::new();
    for x in 0..4u8 {
        data.extend_from_slice(&[x, 0, 0, 255]);
    }
    let src = Raster::from_premul(4, 1, data).unwrap();
    let out = apply(src, Operation::Roll(Roll { x: 1, y: 0 }));
    assert_eq!(out.pixel(0, 0), [3, 0, 0, 255]);
    assert_eq!(out.pixel(1, 0), [0, 0, 0, 255]);
}

#[test]
fn quantize_reduces_distinct_colors() {
    let mut data = Vec::new();
    for i in 0..64u8 {
        data.extend_from_slice(&[i * 4, 255 - i * 4, i * 2, 255]);
    }
    let src = Raster::from_premul(8, 8, data).unwrap();
    let out = apply(
        src,
        Operation::Quantize(Quantize {
            colors: 8,
            dither: false,
        }),
    );
    let distinct: std::collections::BTreeSet<[u8; 4]> =
        out.data.chunks_exact(4).map(|p| [p[0], p[1], p[2], p[3]]).collect();
    assert!(distinct.len() <= 8);
}

#[test]
fn noise_is_deterministic_per_seed() {
    let op = Operation::Noise(AddNoise {
        seed: 7,
        ..AddNoise::default()
    });
    let a = apply(opaque(8, 8, [128, 128, 128]), op.clone());
    let b = apply(opaque(8, 8, [128, 128, 128]), op);
    assert_eq!(a, b);
    assert_ne!(a, opaque(8, 8, [128, 128, 128]));
}

#[test]
fn despeckle_removes_isolated_pixels() {
    let mut src = opaque(5, 5, [0, 0, 0]);
    let idx = (2 * 5 + 2) * 4;
    src.data[idx..idx + 3].copy_from_slice(&[255, 255, 255]);
    let out = apply(src, Operation::Despeckle);
    assert_eq!(out.pixel(2, 2), [0, 0, 0, 255]);
}

#[test]
fn edge_is_dark_on_flat_images() {
    let out = apply(opaque(6, 6, [90, 90, 90]), Operation::Edge(Default::default()));
    assert_eq!(out.pixel(3, 3), [0, 0, 0, 255]);
}

#[test]
fn vignette_darkens_corners_only() {
    let out = apply(
        opaque(40, 40, [200, 200, 200]),
        Operation::Vignette(Vignette {
            radius: 0.0,
            sigma: 10.0,
            color: Color::BLACK,
        }),
    );
    assert_eq!(out.pixel(20, 20), [200, 200, 200, 255]);
    assert!(out.pixel(0, 0)[0] < 100);
}

#[test]
fn motion_blur_keeps_uniform_images() {
    let src = opaque(12, 12, [30, 60, 90]);
    let out = apply(src.clone(), Operation::MotionBlur(MotionBlur::default()));
    assert_eq!(out, src);
}
