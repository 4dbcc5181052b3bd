use super::*;
use crate::assets::DefaultResolver;
use crate::foundation::color::Color;
use crate::layout::placement::PlacementValue;

struct Ctx {
    resolver: DefaultResolver,
    fonts: FontRegistry,
}

impl Ctx {
    fn new() -> Self {
        Self {
            resolver: DefaultResolver::new(),
            fonts: FontRegistry::new(),
        }
    }
}

impl LayerContext for Ctx {
    fn loader(&self) -> Loader<'_> {
        Loader::new(&self.resolver)
    }

    fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    fn render_nested(&self, _asset: &Asset) -> TesseraResult<Raster> {
        Raster::filled(4, 4, [0, 255, 0, 255])
    }
}

fn base(w: u32, h: u32) -> Raster {
    Raster::new(w, h).unwrap()
}

#[test]
fn centered_ellipse_stays_inside_its_footprint() {
    let mut b = base(200, 200);
    let layer = Layer::new(Shape::ellipse(100.0, 100.0).fill(Color::rgb(255, 0, 0)))
        .anchor(Anchor::Center)
        .at(Position::new(PlacementValue::percent(50.0), PlacementValue::percent(50.0)));
    overlay(&mut b, &layer, &Ctx::new()).unwrap();
    assert_eq!(b.pixel(100, 100), [255, 0, 0, 255]);
    assert_eq!(b.pixel(55, 55)[3], 0);
    assert_eq!(b.pixel(10, 100)[3], 0);
    assert_eq!(b.pixel(190, 100)[3], 0);
}

#[test]
fn layers_clip_at_base_edges() {
    let mut b = base(10, 10);
    let layer = Layer::new(Shape::rect(20.0, 20.0).fill(Color::WHITE)).at(Position::new(-5, -5));
    overlay(&mut b, &layer, &Ctx::new()).unwrap();
    assert_eq!(b.pixel(0, 0), [255, 255, 255, 255]);
    assert_eq!(b.pixel(9, 9), [255, 255, 255, 255]);
}

#[test]
fn opacity_scales_coverage() {
    let mut b = base(20, 20);
    let layer = Layer::new(Shape::rect(20.0, 20.0).fill(Color::WHITE)).opacity(0.5);
    overlay(&mut b, &layer, &Ctx::new()).unwrap();
    let a = b.pixel(10, 10)[3];
    assert!((126..=129).contains(&a), "{a}");
}

#[test]
fn nested_assets_render_through_the_context() {
    let mut b = base(10, 10);
    let layer = Layer::new(Asset::blank(4, 4, Color::WHITE)).at(Position::new(2, 3));
    overlay(&mut b, &layer, &Ctx::new()).unwrap();
    assert_eq!(b.pixel(2, 3), [0, 255, 0, 255]);
    assert_eq!(b.pixel(1, 3)[3], 0);
}

#[test]
fn group_mask_applies_once_to_the_flattened_layers() {
    let mut b = base(100, 100);
    let layers = vec![
        Layer::new(Shape::rect(50.0, 100.0).fill(Color::rgb(255, 0, 0))),
        Layer::new(Shape::rect(50.0, 100.0).fill(Color::rgb(0, 0, 255))).at(Position::new(50, 0)),
    ];
    let g = Group::new(layers).mask(Mask::clip(Shape::ellipse(10.0, 10.0)));
    group(&mut b, &g, &Ctx::new()).unwrap();
    assert_eq!(b.pixel(1, 1)[3], 0);
    assert_eq!(b.pixel(98, 98)[3], 0);
    assert_eq!(b.pixel(30, 50), [255, 0, 0, 255]);
    assert_eq!(b.pixel(70, 50), [0, 0, 255, 255]);
}

#[test]
fn layer_validation_reports_the_op() {
    let layer = Layer::new(Shape::polygon(2, 10.0));
    assert_eq!(layer.validate("overlay").unwrap_err().op_tag(), Some("overlay"));
    let layer = Layer::new(Shape::rect(1.0, 1.0)).opacity(2.0);
    assert!(layer.validate("overlay").is_err());
}
