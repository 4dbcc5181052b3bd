use kurbo::PathEl;

use super::*;
use crate::foundation::error::TesseraError;
use crate::geometry::angle::AngleValue;
use crate::geometry::shape::{CornerRadius, PathSource, Shape};

fn approx(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-6, "{a} != {b}");
}

fn vertex_count(g: &Geometry) -> usize {
    g.path()
        .unwrap()
        .elements()
        .iter()
        .filter(|el| matches!(el, PathEl::MoveTo(_) | PathEl::LineTo(_)))
        .count()
}

fn assert_normalized(g: &Geometry) {
    let bb = g.path().unwrap().bounding_box();
    approx(bb.x0, 0.0);
    approx(bb.y0, 0.0);
}

#[test]
fn rect_is_normalized_and_radii_clamped() {
    let g = build_geometry(&Shape::rect(300.0, 150.0).kind).unwrap();
    approx(g.width, 300.0);
    approx(g.height, 150.0);
    assert!(g.closed);

    let huge = Shape::rounded_rect(
        10.0,
        20.0,
        CornerRadius::PerCorner {
            tl: 1000.0,
            tr: 0.0,
            br: 3.0,
            bl: 0.0,
        },
    );
    let g = build_geometry(&huge.kind).unwrap();
    approx(g.width, 10.0);
    approx(g.height, 20.0);
    assert_normalized(&g);
}

#[test]
fn triangle_sits_flat_on_bottom_edge() {
    let g = build_geometry(&Shape::polygon(3, 10.0).kind).unwrap();
    assert_eq!(vertex_count(&g), 3);
    approx(g.height, 15.0);
    let ys: Vec<f64> = g
        .path()
        .unwrap()
        .elements()
        .iter()
        .filter_map(|el| match el {
            PathEl::MoveTo(p) | PathEl::LineTo(p) => Some(p.y),
            _ => None,
        })
        .collect();
    approx(ys[0], 0.0);
    approx(ys[1], ys[2]);
}

#[test]
fn square_polygon_gets_half_step_offset() {
    let g = build_geometry(&Shape::polygon(4, 10.0).kind).unwrap();
    assert_eq!(vertex_count(&g), 4);
    approx(g.width, 10.0 * 2f64.sqrt());
    approx(g.height, 10.0 * 2f64.sqrt());
}

#[test]
fn star_alternates_radii() {
    let g = build_geometry(&Shape::star(5, 50.0).kind).unwrap();
    assert_eq!(vertex_count(&g), 10);
    assert_normalized(&g);
    assert!(g.height < 100.0 && g.height > 50.0);
}

#[test]
fn ellipse_and_pie_slice_bounds() {
    let g = build_geometry(&Shape::ellipse(80.0, 40.0).kind).unwrap();
    approx(g.width, 80.0);
    approx(g.height, 40.0);

    let quarter = Shape::arc(
        80.0,
        40.0,
        ArcSpec {
            start: AngleValue::Radians(0.0),
            end: AngleValue::from("90deg"),
            inner_ratio: 0.0,
        },
    );
    let g = build_geometry(&quarter.kind).unwrap();
    approx(g.width, 40.0);
    approx(g.height, 20.0);
}

#[test]
fn donut_half_spans_full_width() {
    let half = Shape::arc(
        100.0,
        100.0,
        ArcSpec {
            start: AngleValue::Radians(0.0),
            end: AngleValue::from("50%"),
            inner_ratio: 0.5,
        },
    );
    let g = build_geometry(&half.kind).unwrap();
    approx(g.width, 100.0);
    approx(g.height, 50.0);
}

#[test]
fn line_endpoints_follow_normalization() {
    let g = build_geometry(&Shape::line((10.0, 10.0), (110.0, 10.0)).kind).unwrap();
    approx(g.width, 100.0);
    approx(g.height, 1.0);
    assert!(!g.closed);
    let ends = g.line.unwrap();
    assert_eq!(ends.start, Point::new(0.0, 0.0));
    assert_eq!(ends.end, Point::new(100.0, 0.0));
}

#[test]
fn vector_paths_normalize_and_report_bad_data() {
    let g = build_geometry(&Shape::svg_path("M10 10 L50 10 L50 40 Z").kind).unwrap();
    approx(g.width, 40.0);
    approx(g.height, 30.0);
    assert_normalized(&g);

    let bad = ShapeKind::Vector {
        path: PathSource::Svg("M10 nonsense".into()),
        closed: true,
    };
    assert!(matches!(build_geometry(&bad), Err(TesseraError::Resolution(_))));
}

#[test]
fn degenerate_bounds_become_one_pixel() {
    let g = build_geometry(&Shape::svg_path("M5 5 L5 5").kind).unwrap();
    approx(g.width, 1.0);
    approx(g.height, 1.0);
}

#[test]
fn boolean_frame_covers_both_operands() {
    let shape = Shape::union(Shape::rect(10.0, 10.0), Shape::rect(10.0, 10.0))
        .with_operand_offset(5.0, -5.0);
    let g = build_geometry(&shape.kind).unwrap();
    approx(g.width, 15.0);
    approx(g.height, 15.0);
    let Outline::Boolean {
        a_offset, b_offset, ..
    } = g.outline
    else {
        panic!("expected boolean outline");
    };
    assert_eq!(a_offset, Vec2::new(0.0, 5.0));
    assert_eq!(b_offset, Vec2::new(5.0, 0.0));
}
