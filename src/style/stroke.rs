use serde::{Deserialize, Serialize};

use crate::foundation::color::{Color, Paint};
use crate::foundation::error::{TesseraError, TesseraResult};

/// Where a stroke sits relative to the outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrokePosition {
    Inside,
    Outside,
    #[default]
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrokeCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrokeJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stroke {
    pub paint: Paint,
    pub width: f64,
    pub position: StrokePosition,
    pub dash: Option<Vec<f64>>,
    pub cap: StrokeCap,
    pub join: StrokeJoin,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            paint: Paint::Solid(Color::BLACK),
            width: 1.0,
            position: StrokePosition::Center,
            dash: None,
            cap: StrokeCap::Butt,
            join: StrokeJoin::Miter,
        }
    }
}

impl Stroke {
    pub fn new(paint: impl Into<Paint>, width: f64) -> Self {
        Self {
            paint: paint.into(),
            width,
            ..Self::default()
        }
    }

    pub fn with_position(mut self, position: StrokePosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_dash(mut self, dash: Vec<f64>) -> Self {
        self.dash = Some(dash);
        self
    }

    pub fn with_cap(mut self, cap: StrokeCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_join(mut self, join: StrokeJoin) -> Self {
        self.join = join;
        self
    }

    pub fn validate(&self, op: &'static str) -> TesseraResult<()> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(TesseraError::validation(op, "stroke width must be > 0"));
        }
        if let Some(dash) = &self.dash
            && (dash.is_empty() || dash.iter().any(|d| !d.is_finite() || *d < 0.0))
        {
            return Err(TesseraError::validation(
                op,
                "dash pattern must be non-empty and non-negative",
            ));
        }
        self.paint.validate()
    }

    /// Outward reach of the stroke beyond the outline.
    pub fn padding(&self) -> f64 {
        match self.position {
            StrokePosition::Outside => self.width * 2.0,
            StrokePosition::Inside | StrokePosition::Center => self.width,
        }
    }

    /// kurbo stroke style at the given effective width.
    pub(crate) fn kurbo_style(&self, width: f64) -> kurbo::Stroke {
        let mut style = kurbo::Stroke::new(width)
            .with_caps(match self.cap {
                StrokeCap::Butt => kurbo::Cap::Butt,
                StrokeCap::Round => kurbo::Cap::Round,
                StrokeCap::Square => kurbo::Cap::Square,
            })
            .with_join(match self.join {
                StrokeJoin::Miter => kurbo::Join::Miter,
                StrokeJoin::Round => kurbo::Join::Round,
                StrokeJoin::Bevel => kurbo::Join::Bevel,
            });
        if let Some(dash) = &self.dash
            && dash.iter().any(|d| *d > 0.0)
        {
            style = style.with_dashes(0.0, dash.iter().copied());
        }
        style
    }
}
