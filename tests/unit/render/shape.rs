use std::io::Cursor;

use super::*;
use crate::assets::{DefaultResolver, SourceRef};
use crate::foundation::color::Color;
use crate::geometry::{BooleanOp, CornerRadius, LineCap};
use crate::style::{Shadow, Texture};

fn render(shape: &Shape) -> Raster {
    let resolver = DefaultResolver::new();
    render_shape(shape, &Loader::new(&resolver)).unwrap()
}

const RED: Color = Color::rgb(255, 0, 0);
const BLUE: Color = Color::rgb(0, 0, 255);

#[test]
fn rounded_rect_with_inside_stroke_keeps_corners_clear() {
    let shape = Shape::rounded_rect(300.0, 150.0, CornerRadius::Uniform(20.0))
        .fill(BLUE)
        .stroke(Stroke::new(RED, 2.0).with_position(StrokePosition::Inside));
    let r = render(&shape);
    assert_eq!((r.width, r.height), (304, 154));
    assert_eq!(r.pixel(2, 2)[3], 0);
    assert_eq!(r.pixel(301, 151)[3], 0);
    assert_eq!(r.pixel(152, 77), [0, 0, 255, 255]);
    assert_eq!(r.pixel(3, 77), [255, 0, 0, 255]);
}

#[test]
fn outside_stroke_sits_beyond_the_fill() {
    let shape = Shape::rect(100.0, 50.0)
        .fill(BLUE)
        .stroke(Stroke::new(RED, 10.0).with_position(StrokePosition::Outside));
    let r = render(&shape);
    assert_eq!((r.width, r.height), (140, 90));
    assert_eq!(r.pixel(15, 45), [255, 0, 0, 255]);
    assert_eq!(r.pixel(5, 45)[3], 0);
    assert_eq!(r.pixel(25, 45), [0, 0, 255, 255]);
}

#[test]
fn ellipse_leaves_bounding_corners_transparent() {
    let r = render(&Shape::ellipse(100.0, 60.0).fill(RED));
    assert_eq!((r.width, r.height), (104, 64));
    assert_eq!(r.pixel(3, 3)[3], 0);
    assert_eq!(r.pixel(52, 32)[3], 255);
}

#[test]
fn boolean_subtract_cuts_a_hole() {
    let shape = Shape::subtract(Shape::rect(100.0, 100.0), Shape::rect(40.0, 40.0))
        .with_operand_offset(30.0, 30.0)
        .fill(RED);
    let r = render(&shape);
    assert_eq!((r.width, r.height), (104, 104));
    assert_eq!(r.pixel(52, 52)[3], 0);
    assert_eq!(r.pixel(10, 10)[3], 255);
}

fn overlapping_squares(op: BooleanOp) -> Raster {
    let shape = Shape::boolean(op, Shape::rect(60.0, 60.0), Shape::rect(60.0, 60.0))
        .with_operand_offset(30.0, 30.0)
        .fill(RED);
    render(&shape)
}

#[test]
fn boolean_intersect_keeps_only_the_overlap() {
    let r = overlapping_squares(BooleanOp::Intersect);
    assert_eq!((r.width, r.height), (94, 94));
    assert_eq!(r.pixel(47, 47), [255, 0, 0, 255]);
    assert_eq!(r.pixel(12, 12)[3], 0);
    assert_eq!(r.pixel(82, 82)[3], 0);
}

#[test]
fn boolean_exclude_drops_the_overlap() {
    let r = overlapping_squares(BooleanOp::Exclude);
    assert_eq!((r.width, r.height), (94, 94));
    assert_eq!(r.pixel(12, 12), [255, 0, 0, 255]);
    assert_eq!(r.pixel(82, 82), [255, 0, 0, 255]);
    assert_eq!(r.pixel(47, 47)[3], 0);
    assert_eq!(r.pixel(82, 12)[3], 0);
}

#[test]
fn boolean_outside_stroke_uses_distance_band() {
    let shape = Shape::union(Shape::rect(40.0, 40.0), Shape::rect(40.0, 40.0))
        .with_operand_offset(20.0, 20.0)
        .stroke(Stroke::new(RED, 4.0).with_position(StrokePosition::Outside));
    let r = render(&shape);
    let pad = 8;
    assert_eq!(r.width, 60 + 2 * pad);
    assert!(r.pixel(pad - 3, pad + 10)[3] > 200);
    assert_eq!(r.pixel(pad + 10, pad + 10)[3], 0);
}

#[test]
fn line_end_cap_is_drawn_past_the_stroke() {
    let shape = Shape::line((0.0, 0.0), (100.0, 0.0))
        .with_caps(LineCap::None, LineCap::ArrowFilled)
        .stroke(Stroke::new(Color::BLACK, 2.0));
    let r = render(&shape);
    assert_eq!((r.width, r.height), (114, 15));
    assert!(r.pixel(102, 5)[3] > 0);
    assert_eq!(r.pixel(20, 5)[3], 0);
    assert!(r.pixel(50, 7)[3] > 0);
}

#[test]
fn drop_shadow_is_drawn_behind_and_offset() {
    let shape = Shape::rect(20.0, 20.0).fill(BLUE).effect(Effect::DropShadow(Shadow {
        color: RED,
        dx: 6.0,
        dy: 0.0,
        blur: 0.0,
        spread: 0.0,
    }));
    let r = render(&shape);
    assert_eq!((r.width, r.height), (32, 32));
    assert_eq!(r.pixel(29, 16), [255, 0, 0, 255]);
    assert_eq!(r.pixel(16, 16), [0, 0, 255, 255]);
    assert_eq!(r.pixel(3, 16)[3], 0);
}

#[test]
fn texture_tiles_inside_the_silhouette() {
    let tile = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 255, 0, 255]));
    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(tile)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    let shape = Shape::rect(10.0, 10.0)
        .fill(Color::WHITE)
        .effect(Effect::Texture(Texture::new(SourceRef::Bytes(png))));
    let r = render(&shape);
    assert_eq!(r.pixel(7, 7), [0, 255, 0, 255]);
    assert_eq!(r.pixel(0, 0)[3], 0);
}

#[test]
fn missing_texture_is_a_resource_error() {
    let shape = Shape::rect(10.0, 10.0)
        .fill(Color::WHITE)
        .effect(Effect::Texture(Texture::new(SourceRef::from("/nonexistent/tile.png"))));
    let resolver = DefaultResolver::new();
    let err = render_shape(&shape, &Loader::new(&resolver)).unwrap_err();
    assert!(matches!(err, crate::TesseraError::Resource(_)));
}

#[test]
fn geometry_coverage_ignores_style_and_stretches() {
    let plain = geometry_coverage(&Shape::ellipse(10.0, 10.0), 50, 50).unwrap();
    let styled = geometry_coverage(
        &Shape::ellipse(10.0, 10.0)
            .fill(RED)
            .stroke(Stroke::new(BLUE, 6.0).with_position(StrokePosition::Outside)),
        50,
        50,
    )
    .unwrap();
    assert_eq!(plain, styled);
    assert_eq!(plain.get(25, 25), 255);
    assert_eq!(plain.get(1, 1), 0);
}

#[test]
fn oversized_shapes_fail_instead_of_overflowing() {
    let resolver = DefaultResolver::new();
    let loader = Loader::new(&resolver);

    let wide = Shape::rect(5.0e9, 10.0).fill(BLUE);
    wide.validate("overlay").unwrap();
    let err = render_shape(&wide, &loader).unwrap_err();
    assert!(matches!(err, TesseraError::Render(_)));

    let blurred = Shape::rect(10.0, 10.0)
        .fill(BLUE)
        .effect(Effect::LayerBlur { radius: 3.0e9 });
    let err = render_shape(&blurred, &loader).unwrap_err();
    assert!(matches!(err, TesseraError::Render(_)));
}
