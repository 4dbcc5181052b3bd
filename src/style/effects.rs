use serde::{Deserialize, Serialize};

use crate::assets::source::SourceRef;
use crate::foundation::color::Color;
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::style::BlendMode;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shadow {
    pub color: Color,
    pub dx: f64,
    pub dy: f64,
    pub blur: f64,
    pub spread: f64,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            color: Color::rgba(0, 0, 0, 0.25),
            dx: 0.0,
            dy: 4.0,
            blur: 4.0,
            spread: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Noise {
    /// Edge length of one noise block in pixels.
    pub size: f64,
    pub opacity: f32,
    pub monochrome: bool,
    pub seed: u64,
}

impl Default for Noise {
    fn default() -> Self {
        Self {
            size: 2.0,
            opacity: 0.15,
            monochrome: true,
            seed: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    pub source: SourceRef,
    #[serde(default = "one_f64")]
    pub scale: f64,
    #[serde(default = "one_f32")]
    pub opacity: f32,
    #[serde(default)]
    pub blend: BlendMode,
}

impl Texture {
    pub fn new(source: SourceRef) -> Self {
        Self {
            source,
            scale: 1.0,
            opacity: 1.0,
            blend: BlendMode::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Glass {
    pub blur: f64,
    pub tint: Option<Color>,
    pub tint_opacity: f32,
    /// Opacity of the white top highlight; 0 disables it.
    pub highlight: f32,
}

impl Default for Glass {
    fn default() -> Self {
        Self {
            blur: 12.0,
            tint: Some(Color::WHITE),
            tint_opacity: 0.2,
            highlight: 0.25,
        }
    }
}

fn one_f64() -> f64 {
    1.0
}

fn one_f32() -> f32 {
    1.0
}

/// One entry of a shape's ordered effect list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Effect {
    DropShadow(Shadow),
    InnerShadow(Shadow),
    LayerBlur { radius: f64 },
    BackgroundBlur { radius: f64 },
    Noise(Noise),
    Texture(Texture),
    Glass(Glass),
}

impl Effect {
    pub fn validate(&self, op: &'static str) -> TesseraResult<()> {
        let finite_non_neg = |v: f64, what: &str| -> TesseraResult<()> {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(TesseraError::validation(op, format!("{what} must be >= 0")))
            }
        };
        let unit = |v: f32, what: &str| -> TesseraResult<()> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(TesseraError::validation(op, format!("{what} must be within [0, 1]")))
            }
        };
        match self {
            Effect::DropShadow(s) | Effect::InnerShadow(s) => {
                finite_non_neg(s.blur, "shadow blur")?;
                if !(s.dx.is_finite() && s.dy.is_finite() && s.spread.is_finite()) {
                    return Err(TesseraError::validation(op, "shadow offsets must be finite"));
                }
                Ok(())
            }
            Effect::LayerBlur { radius } | Effect::BackgroundBlur { radius } => {
                finite_non_neg(*radius, "blur radius")
            }
            Effect::Noise(n) => {
                if !(n.size.is_finite() && n.size >= 1.0) {
                    return Err(TesseraError::validation(op, "noise size must be >= 1"));
                }
                unit(n.opacity, "noise opacity")
            }
            Effect::Texture(t) => {
                if !(t.scale.is_finite() && t.scale > 0.0) {
                    return Err(TesseraError::validation(op, "texture scale must be > 0"));
                }
                t.source.validate(op)?;
                unit(t.opacity, "texture opacity")
            }
            Effect::Glass(g) => {
                finite_non_neg(g.blur, "glass blur")?;
                unit(g.tint_opacity, "glass tint opacity")?;
                unit(g.highlight, "glass highlight")
            }
        }
    }

    /// Maximum distance this effect can paint beyond the shape's bounds.
    pub fn bleed(&self) -> f64 {
        match self {
            Effect::DropShadow(s) | Effect::InnerShadow(s) => {
                s.dx.abs().max(s.dy.abs()) + s.blur + s.spread.abs()
            }
            Effect::LayerBlur { radius } | Effect::BackgroundBlur { radius } => radius * 2.0,
            Effect::Glass(g) => g.blur * 2.0,
            Effect::Noise(_) | Effect::Texture(_) => 0.0,
        }
    }
}
