use serde::{Deserialize, Serialize};

use crate::assets::{Loader, SourceRef};
use crate::compose::mask::{Mask, apply_mask};
use crate::foundation::core::Raster;
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::geometry::Shape;
use crate::layout::placement::{Anchor, Position, composite_offset};
use crate::pipeline::Asset;
use crate::render::{composite_at, render_shape};
use crate::style::BlendMode;
use crate::text::{FontRegistry, Text, render_text};

/// What a layer draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum LayerContent {
    Shape(Shape),
    Text(Text),
    /// Nested pipeline rendered on its own first.
    Asset(Box<Asset>),
    /// Raster or SVG image.
    Source(SourceRef),
}

impl From<Shape> for LayerContent {
    fn from(s: Shape) -> Self {
        Self::Shape(s)
    }
}

impl From<Text> for LayerContent {
    fn from(t: Text) -> Self {
        Self::Text(t)
    }
}

impl From<Asset> for LayerContent {
    fn from(a: Asset) -> Self {
        Self::Asset(Box::new(a))
    }
}

impl From<SourceRef> for LayerContent {
    fn from(s: SourceRef) -> Self {
        Self::Source(s)
    }
}

/// Content plus placement, masking and blending on a base image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub content: LayerContent,
    #[serde(default)]
    pub anchor: Anchor,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub mask: Option<Mask>,
    #[serde(default = "full_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub blend: BlendMode,
}

fn full_opacity() -> f32 {
    1.0
}

impl Layer {
    pub fn new(content: impl Into<LayerContent>) -> Self {
        Self {
            content: content.into(),
            anchor: Anchor::TopLeft,
            position: Position::default(),
            mask: None,
            opacity: 1.0,
            blend: BlendMode::Normal,
        }
    }

    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn mask(mut self, mask: Mask) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    pub fn validate(&self, op: &'static str) -> TesseraResult<()> {
        if !(self.opacity.is_finite() && (0.0..=1.0).contains(&self.opacity)) {
            return Err(TesseraError::validation(op, "opacity must be within [0, 1]"));
        }
        if !(self.position.x.is_finite() && self.position.y.is_finite()) {
            return Err(TesseraError::validation(op, "position must be finite"));
        }
        if let Some(mask) = &self.mask {
            mask.validate(op)?;
        }
        match &self.content {
            LayerContent::Shape(s) => s.validate(op),
            LayerContent::Text(t) => t.validate(op),
            LayerContent::Asset(a) => a.validate(),
            LayerContent::Source(s) => s.validate(op),
        }
    }
}

/// Layers flattened onto a base-sized canvas before one shared mask applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub mask: Option<Mask>,
}

impl Group {
    pub fn new(layers: Vec<Layer>) -> Self {
        Self { layers, mask: None }
    }

    pub fn mask(mut self, mask: Mask) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn validate(&self, op: &'static str) -> TesseraResult<()> {
        for layer in &self.layers {
            layer.validate(op)?;
        }
        self.mask.as_ref().map_or(Ok(()), |m| m.validate(op))
    }
}

/// Services the compositor needs from the render that drives it.
pub trait LayerContext {
    fn loader(&self) -> Loader<'_>;
    fn fonts(&self) -> &FontRegistry;
    fn render_nested(&self, asset: &Asset) -> TesseraResult<Raster>;
}

/// Render layer content to a standalone raster.
pub fn render_content(content: &LayerContent, ctx: &dyn LayerContext) -> TesseraResult<Raster> {
    match content {
        LayerContent::Shape(shape) => render_shape(shape, &ctx.loader()),
        LayerContent::Text(text) => render_text(text, ctx.fonts()),
        LayerContent::Asset(asset) => ctx.render_nested(asset),
        LayerContent::Source(source) => ctx.loader().raster(source),
    }
}

/// Render, mask, place and composite one layer onto `base`.
#[tracing::instrument(skip_all, fields(anchor = ?layer.anchor, blend = ?layer.blend))]
pub fn overlay(base: &mut Raster, layer: &Layer, ctx: &dyn LayerContext) -> TesseraResult<()> {
    let mut content = render_content(&layer.content, ctx)?;
    if let Some(mask) = &layer.mask {
        apply_mask(&mut content, mask, &ctx.loader())?;
    }
    let (x, y) = layer
        .position
        .resolve(f64::from(base.width), f64::from(base.height))?;
    let (left, top) = composite_offset(layer.anchor, content.width, content.height, x, y);
    tracing::debug!(left, top, w = content.width, h = content.height, "compositing layer");
    composite_at(base, &content, left, top, layer.opacity, layer.blend)
}

/// Composite every layer onto a transparent base-sized canvas, mask it once, then composite
/// the canvas onto `base`.
#[tracing::instrument(skip_all, fields(layers = group.layers.len()))]
pub fn group(base: &mut Raster, group: &Group, ctx: &dyn LayerContext) -> TesseraResult<()> {
    let mut canvas = Raster::new(base.width, base.height)?;
    for layer in &group.layers {
        overlay(&mut canvas, layer, ctx)?;
    }
    if let Some(mask) = &group.mask {
        apply_mask(&mut canvas, mask, &ctx.loader())?;
    }
    composite_at(base, &canvas, 0, 0, 1.0, BlendMode::Normal)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/overlay.rs"]
mod tests;
