use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use kurbo::Affine;

use crate::foundation::core::Raster;
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::render::raster::{Surface, affine_to_cpu};
use crate::text::fonts::{FaceStyle, FontFace, FontRegistry};
use crate::text::layout::{TextMeasure, layout_text};
use crate::text::model::{Text, TextStyle};

/// RGBA8 brush carried through parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextBrush {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

/// One registry face with its own font collection, so shaping can only pick that face.
struct LoadedFace {
    font_ctx: parley::FontContext,
    family: String,
    data: vello_cpu::peniko::FontData,
}

/// Shapes text with parley against fonts from a [`FontRegistry`].
///
/// Each render owns one engine; shaping contexts are not shared between threads.
pub struct TextEngine<'a> {
    fonts: &'a FontRegistry,
    layout_ctx: parley::LayoutContext<TextBrush>,
    loaded: HashMap<String, LoadedFace>,
}

impl<'a> TextEngine<'a> {
    pub fn new(fonts: &'a FontRegistry) -> Self {
        Self {
            fonts,
            layout_ctx: parley::LayoutContext::new(),
            loaded: HashMap::new(),
        }
    }

    /// Load the registry face closest to `style`; returns its registry key.
    fn load(&mut self, style: &TextStyle) -> TesseraResult<String> {
        let want = FaceStyle::new(style.weight, style.italic);
        let face: Arc<FontFace> = self.fonts.resolve(style.font.as_deref(), want)?;
        if self.loaded.contains_key(&face.key) {
            return Ok(face.key.clone());
        }
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(face.bytes.as_ref().clone()),
            None,
        );
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            TesseraError::resource(format!("font '{}' contains no usable faces", face.name))
        })?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| {
                TesseraError::resource(format!("font '{}' has no family name", face.name))
            })?
            .to_owned();
        let data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(face.bytes.as_ref().clone()),
            0,
        );
        tracing::debug!(font = %face.name, weight = face.style.weight, "face loaded for shaping");
        self.loaded.insert(
            face.key.clone(),
            LoadedFace {
                font_ctx,
                family,
                data,
            },
        );
        Ok(face.key.clone())
    }

    fn shape(
        &mut self,
        text: &str,
        style: &TextStyle,
        letter_spacing: f64,
    ) -> TesseraResult<(parley::Layout<TextBrush>, String)> {
        let key = self.load(style)?;
        let face = self
            .loaded
            .get_mut(&key)
            .ok_or_else(|| TesseraError::render("font face vanished from the shaping context"))?;
        let family = face.family.clone();
        let [r, g, b, a] = style.color.to_straight();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut face.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(style.size));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrush { r, g, b, a }));
        builder.push_default(parley::style::StyleProperty::LetterSpacing(letter_spacing as f32));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(f32::from(style.weight)),
        ));
        if style.italic {
            builder.push_default(parley::style::StyleProperty::FontStyle(
                parley::style::FontStyle::Italic,
            ));
        }

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);
        Ok((layout, key))
    }
}

impl TextMeasure for TextEngine<'_> {
    fn advance(
        &mut self,
        text: &str,
        style: &TextStyle,
        letter_spacing: f64,
    ) -> TesseraResult<f64> {
        if text.is_empty() {
            return Ok(0.0);
        }
        let (layout, _) = self.shape(text, style, letter_spacing)?;
        Ok(f64::from(layout.full_width()))
    }
}

/// Lay out and rasterize `text` onto a transparent canvas sized to its box.
#[tracing::instrument(skip_all)]
pub fn render_text(text: &Text, fonts: &FontRegistry) -> TesseraResult<Raster> {
    let mut engine = TextEngine::new(fonts);
    let laid = layout_text(text, &mut engine)?;
    let width = laid.width.ceil().max(1.0) as u32;
    let height = laid.height.ceil().max(1.0) as u32;
    let mut surface = Surface::new(width, height)?;
    let ls = text.layout.letter_spacing;

    for (i, line) in laid.lines.iter().enumerate() {
        let line_top = laid.top + i as f64 * laid.line_height;
        for piece in line.pieces.iter().filter(|p| !p.space) {
            let style = &laid.styles[piece.run];
            let (layout, key) = engine.shape(&piece.text, style, ls)?;
            let font = engine
                .loaded
                .get(&key)
                .map(|f| f.data.clone())
                .ok_or_else(|| {
                    TesseraError::render("font face vanished from the shaping context")
                })?;
            // Half-leading: center the shaped line box inside the layout line.
            let dy = line_top + (laid.line_height - f64::from(layout.height())) / 2.0;
            surface
                .ctx
                .set_transform(affine_to_cpu(Affine::translate((piece.x, dy))));
            for parley_line in layout.lines() {
                for item in parley_line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };
                    let brush = run.style().brush;
                    surface.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                        brush.r, brush.g, brush.b, brush.a,
                    ));
                    let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    surface
                        .ctx
                        .glyph_run(&font)
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
        }
    }

    tracing::debug!(width, height, lines = laid.lines.len(), "text rasterized");
    surface.finish()
}

#[cfg(test)]
#[path = "../../tests/unit/text/engine.rs"]
mod tests;
