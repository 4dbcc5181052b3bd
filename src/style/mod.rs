//! Fill, stroke and effect stack attached to a shape, plus canvas padding.

pub mod effects;
pub mod stroke;

use serde::{Deserialize, Serialize};

use crate::foundation::color::Paint;
use crate::foundation::error::TesseraResult;

pub use effects::{Effect, Glass, Noise, Shadow, Texture};
pub use stroke::{Stroke, StrokeCap, StrokeJoin, StrokePosition};

/// Separable blend modes applied on straight color during source-over compositing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    SoftLight,
    HardLight,
    Difference,
    Exclusion,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeStyle {
    pub fill: Option<Paint>,
    pub stroke: Option<Stroke>,
    pub effects: Vec<Effect>,
}

impl ShapeStyle {
    pub fn validate(&self, op: &'static str) -> TesseraResult<()> {
        if let Some(fill) = &self.fill {
            fill.validate()?;
        }
        if let Some(stroke) = &self.stroke {
            stroke.validate(op)?;
        }
        for effect in &self.effects {
            effect.validate(op)?;
        }
        Ok(())
    }

    pub fn effects_padding(&self) -> f64 {
        self.effects.iter().map(Effect::bleed).fold(0.0, f64::max)
    }
}

/// Canvas padding on each side: `ceil(max(2, stroke, effects, caps))`.
pub fn padding(style: &ShapeStyle, cap_extent: f64) -> u32 {
    let stroke = style.stroke.as_ref().map(Stroke::padding).unwrap_or(0.0);
    let p = 2.0f64
        .max(stroke)
        .max(style.effects_padding())
        .max(cap_extent);
    if p.is_finite() { p.ceil() as u32 } else { 2 }
}

#[cfg(test)]
#[path = "../../tests/unit/style/padding.rs"]
mod tests;
