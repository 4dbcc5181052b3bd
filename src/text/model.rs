use serde::{Deserialize, Serialize};

use crate::foundation::color::Color;
use crate::foundation::error::{TesseraError, TesseraResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// What happens to lines that do not fit in `max_height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Ellipsis,
}

/// Styling shared by every character of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// Registered family name; `None` picks the registry default.
    pub font: Option<String>,
    pub size: f32,
    pub color: Color,
    pub weight: u16,
    pub italic: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: None,
            size: 16.0,
            color: Color::BLACK,
            weight: 400,
            italic: false,
        }
    }
}

impl TextStyle {
    pub fn validate(&self, op: &'static str) -> TesseraResult<()> {
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(TesseraError::validation(op, "font size must be finite and > 0"));
        }
        if !(1..=1000).contains(&self.weight) {
            return Err(TesseraError::validation(op, "font weight must be within 1..=1000"));
        }
        if !(0.0..=1.0).contains(&self.color.a) {
            return Err(TesseraError::validation(op, "text alpha must be within [0, 1]"));
        }
        Ok(())
    }
}

/// An independently styled sub-range of a text value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(flatten)]
    pub style: TextStyle,
}

impl TextRun {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextContent {
    Plain(String),
    Runs(Vec<TextRun>),
}

/// Box the text is laid out in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextBox {
    /// Fixed width enabling wrapping and horizontal alignment.
    pub width: Option<f64>,
    pub max_height: Option<f64>,
    pub align: TextAlign,
    pub vertical_align: VerticalAlign,
    pub overflow: Overflow,
    /// Values `<= 3` multiply the largest font size; larger values are pixels.
    pub line_height: f64,
    pub letter_spacing: f64,
}

impl Default for TextBox {
    fn default() -> Self {
        Self {
            width: None,
            max_height: None,
            align: TextAlign::Left,
            vertical_align: VerticalAlign::Top,
            overflow: Overflow::Visible,
            line_height: 1.2,
            letter_spacing: 0.0,
        }
    }
}

/// Plain text or styled runs plus box options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub content: TextContent,
    /// Style of plain content.
    #[serde(default)]
    pub style: TextStyle,
    #[serde(default, rename = "box")]
    pub layout: TextBox,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            content: TextContent::Plain(text.into()),
            style: TextStyle::default(),
            layout: TextBox::default(),
        }
    }

    pub fn from_runs(runs: Vec<TextRun>) -> Self {
        Self {
            content: TextContent::Runs(runs),
            style: TextStyle::default(),
            layout: TextBox::default(),
        }
    }

    pub fn size(mut self, size: f32) -> Self {
        self.style.size = size;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.style.color = color;
        self
    }

    pub fn font(mut self, family: impl Into<String>) -> Self {
        self.style.font = Some(family.into());
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.layout.width = Some(width);
        self
    }

    pub fn max_height(mut self, height: f64) -> Self {
        self.layout.max_height = Some(height);
        self
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.layout.align = align;
        self
    }

    pub fn vertical_align(mut self, align: VerticalAlign) -> Self {
        self.layout.vertical_align = align;
        self
    }

    pub fn overflow(mut self, overflow: Overflow) -> Self {
        self.layout.overflow = overflow;
        self
    }

    pub fn line_height(mut self, line_height: f64) -> Self {
        self.layout.line_height = line_height;
        self
    }

    pub fn letter_spacing(mut self, spacing: f64) -> Self {
        self.layout.letter_spacing = spacing;
        self
    }

    /// Content as `(text, style)` runs.
    pub fn runs(&self) -> Vec<(&str, &TextStyle)> {
        match &self.content {
            TextContent::Plain(s) => vec![(s.as_str(), &self.style)],
            TextContent::Runs(runs) => runs.iter().map(|r| (r.text.as_str(), &r.style)).collect(),
        }
    }

    pub fn validate(&self, op: &'static str) -> TesseraResult<()> {
        match &self.content {
            TextContent::Plain(_) => self.style.validate(op)?,
            TextContent::Runs(runs) => {
                if runs.is_empty() {
                    return Err(TesseraError::validation(op, "text needs at least one run"));
                }
                for run in runs {
                    run.style.validate(op)?;
                }
            }
        }
        let positive = |v: Option<f64>| v.is_none_or(|v| v.is_finite() && v > 0.0);
        if !positive(self.layout.width) {
            return Err(TesseraError::validation(op, "text box width must be > 0"));
        }
        if !positive(self.layout.max_height) {
            return Err(TesseraError::validation(op, "text box max_height must be > 0"));
        }
        if !(self.layout.line_height.is_finite() && self.layout.line_height > 0.0) {
            return Err(TesseraError::validation(op, "line height must be > 0"));
        }
        if !self.layout.letter_spacing.is_finite() {
            return Err(TesseraError::validation(op, "letter spacing must be finite"));
        }
        Ok(())
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
