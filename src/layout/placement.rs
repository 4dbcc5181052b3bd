use serde::{Deserialize, Serialize};

use crate::foundation::error::{TesseraError, TesseraResult};

/// A coordinate or length: absolute pixels or a percentage of the target dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementValue {
    Px(f64),
    Percent(f64),
}

impl PlacementValue {
    pub const ZERO: PlacementValue = PlacementValue::Px(0.0);

    pub fn px(v: f64) -> Self {
        Self::Px(v)
    }

    pub fn percent(p: f64) -> Self {
        Self::Percent(p)
    }

    /// Parse `"N%"` or a plain number.
    pub fn parse(text: &str) -> TesseraResult<Self> {
        let t = text.trim();
        if let Some(num) = t.strip_suffix('%') {
            return leading_float(num)
                .map(Self::Percent)
                .ok_or_else(|| {
                    TesseraError::resolution(format!("malformed percentage \"{text}\""))
                });
        }
        let t = t.strip_suffix("px").unwrap_or(t);
        t.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Self::Px)
            .ok_or_else(|| {
                TesseraError::resolution(format!("malformed placement value \"{text}\""))
            })
    }

    pub fn is_finite(&self) -> bool {
        match *self {
            Self::Px(v) | Self::Percent(v) => v.is_finite(),
        }
    }
}

impl Default for PlacementValue {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<f64> for PlacementValue {
    fn from(v: f64) -> Self {
        Self::Px(v)
    }
}

impl From<i32> for PlacementValue {
    fn from(v: i32) -> Self {
        Self::Px(f64::from(v))
    }
}

impl From<u32> for PlacementValue {
    fn from(v: u32) -> Self {
        Self::Px(f64::from(v))
    }
}

impl std::str::FromStr for PlacementValue {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PlacementValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match *self {
            Self::Px(v) => serializer.serialize_f64(v),
            Self::Percent(p) => serializer.serialize_str(&format!("{p}%")),
        }
    }
}

impl<'de> Deserialize<'de> for PlacementValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(f64),
            Text(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Num(v) => Ok(Self::Px(v)),
            Repr::Text(s) => Self::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}

/// Longest numeric prefix of `s` as a float (`"12.5abc"` -> 12.5).
fn leading_float(s: &str) -> Option<f64> {
    let s = s.trim();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Round half up. Integer translation commutes with this rounding.
pub(crate) fn round_px(v: f64) -> f64 {
    (v + 0.5).floor()
}

/// Resolve a placement value against `dimension` to whole pixels.
pub fn resolve(value: PlacementValue, dimension: f64) -> TesseraResult<i64> {
    let raw = match value {
        PlacementValue::Px(v) => v,
        PlacementValue::Percent(p) => p / 100.0 * dimension,
    };
    let out = round_px(raw);
    if !out.is_finite() || out.abs() > i64::MAX as f64 / 2.0 {
        return Err(TesseraError::resolution(format!(
            "placement {value:?} against {dimension} is not finite"
        )));
    }
    Ok(out as i64)
}

pub fn resolve_str(text: &str, dimension: f64) -> TesseraResult<i64> {
    resolve(PlacementValue::parse(text)?, dimension)
}

/// Two placement values, resolved against width and height respectively.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: PlacementValue,
    #[serde(default)]
    pub y: PlacementValue,
}

impl Position {
    pub fn new(x: impl Into<PlacementValue>, y: impl Into<PlacementValue>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }

    pub fn resolve(&self, width: f64, height: f64) -> TesseraResult<(i64, i64)> {
        Ok((resolve(self.x, width)?, resolve(self.y, height)?))
    }
}

/// Reference point on a piece of content that gets aligned to a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    #[default]
    TopLeft,
    Top,
    TopRight,
    Left,
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl Anchor {
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::Top,
        Anchor::TopRight,
        Anchor::Left,
        Anchor::Center,
        Anchor::Right,
        Anchor::BottomLeft,
        Anchor::Bottom,
        Anchor::BottomRight,
    ];
}

/// Fractional `(fx, fy)` in `[-1, 0]` applied to content width and height.
pub fn anchor_offset(anchor: Anchor) -> (f64, f64) {
    match anchor {
        Anchor::TopLeft => (0.0, 0.0),
        Anchor::Top => (-0.5, 0.0),
        Anchor::TopRight => (-1.0, 0.0),
        Anchor::Left => (0.0, -0.5),
        Anchor::Center => (-0.5, -0.5),
        Anchor::Right => (-1.0, -0.5),
        Anchor::BottomLeft => (0.0, -1.0),
        Anchor::Bottom => (-0.5, -1.0),
        Anchor::BottomRight => (-1.0, -1.0),
    }
}

/// Top-left corner at which content of the given size lands so that its anchor sits at `(x, y)`.
pub fn composite_offset(
    anchor: Anchor,
    content_w: u32,
    content_h: u32,
    x: i64,
    y: i64,
) -> (i64, i64) {
    let (fx, fy) = anchor_offset(anchor);
    let left = round_px(x as f64 + f64::from(content_w) * fx);
    let top = round_px(y as f64 + f64::from(content_h) * fy);
    (left as i64, top as i64)
}

#[cfg(test)]
#[path = "../../tests/unit/layout/placement.rs"]
mod tests;
