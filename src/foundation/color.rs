use serde::{Deserialize, Serialize};

use crate::foundation::error::{TesseraError, TesseraResult};

/// Straight-alpha color: 8-bit RGB channels plus alpha in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(..)`, `rgba(..)` or a basic name.
    pub fn parse(s: &str) -> TesseraResult<Self> {
        let t = s.trim();
        if let Some(hex) = t.strip_prefix('#') {
            return parse_hex(hex)
                .map_err(|e| TesseraError::resolution(format!("color \"{s}\": {e}")));
        }
        let lower = t.to_ascii_lowercase();
        if let Some(inner) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_functional(inner)
                .map_err(|e| TesseraError::resolution(format!("color \"{s}\": {e}")));
        }
        named(&lower).ok_or_else(|| TesseraError::resolution(format!("unknown color \"{s}\"")))
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn alpha_u8(self) -> u8 {
        (self.a.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    pub fn to_premul(self) -> [u8; 4] {
        let a = self.alpha_u8();
        let a16 = u16::from(a);
        let premul = |c: u8| -> u8 { (((u16::from(c) * a16) + 127) / 255) as u8 };
        [premul(self.r), premul(self.g), premul(self.b), a]
    }

    pub fn to_straight(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.alpha_u8()]
    }

    pub fn to_hex(self) -> String {
        let a = self.alpha_u8();
        if a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, a)
        }
    }
}

impl std::str::FromStr for Color {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Obj {
                r: u8,
                g: u8,
                b: u8,
                #[serde(default = "one")]
                a: f32,
            },
        }

        fn one() -> f32 {
            1.0
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => Color::parse(&s).map_err(serde::de::Error::custom),
            Repr::Obj { r, g, b, a } => Ok(Color::rgba(r, g, b, a.clamp(0.0, 1.0))),
        }
    }
}

fn parse_hex(hex: &str) -> Result<Color, String> {
    fn nibble(c: u8) -> Result<u8, String> {
        (c as char)
            .to_digit(16)
            .map(|d| d as u8)
            .ok_or_else(|| format!("invalid hex digit '{}'", c as char))
    }

    let b = hex.as_bytes();
    let mut ch = Vec::with_capacity(4);
    match b.len() {
        3 | 4 => {
            for &c in b {
                let n = nibble(c)?;
                ch.push(n * 16 + n);
            }
        }
        6 | 8 => {
            for pair in b.chunks_exact(2) {
                ch.push(nibble(pair[0])? * 16 + nibble(pair[1])?);
            }
        }
        _ => return Err("hex color must have 3, 4, 6 or 8 digits".to_owned()),
    }
    let a = ch.get(3).map(|&a| f32::from(a) / 255.0).unwrap_or(1.0);
    Ok(Color::rgba(ch[0], ch[1], ch[2], a))
}

fn parse_functional(inner: &str) -> Result<Color, String> {
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err("expected 3 or 4 components".to_owned());
    }
    let channel = |p: &str| -> Result<u8, String> {
        let v: f64 = p.parse().map_err(|_| format!("invalid channel \"{p}\""))?;
        if !(0.0..=255.0).contains(&v) {
            return Err(format!("channel {v} out of range 0..=255"));
        }
        Ok(v.round() as u8)
    };
    let a = match parts.get(3) {
        Some(p) => {
            let v: f32 = p.parse().map_err(|_| format!("invalid alpha \"{p}\""))?;
            if !(0.0..=1.0).contains(&v) {
                return Err(format!("alpha {v} out of range 0..=1"));
            }
            v
        }
        None => 1.0,
    };
    Ok(Color::rgba(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        a,
    ))
}

fn named(name: &str) -> Option<Color> {
    Some(match name {
        "black" => Color::BLACK,
        "white" => Color::WHITE,
        "transparent" => Color::TRANSPARENT,
        "red" => Color::rgb(255, 0, 0),
        "green" => Color::rgb(0, 128, 0),
        "blue" => Color::rgb(0, 0, 255),
        "yellow" => Color::rgb(255, 255, 0),
        "cyan" => Color::rgb(0, 255, 255),
        "magenta" => Color::rgb(255, 0, 255),
        "orange" => Color::rgb(255, 165, 0),
        "gray" | "grey" => Color::rgb(128, 128, 128),
        _ => return None,
    })
}

/// Geometry of a gradient, expressed relative to the painted bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GradientKind {
    /// Direction in degrees: 0 points up, 90 points right.
    Linear { angle_deg: f64 },
    /// Center and radius as fractions of the bounds (radius relative to the larger side).
    Radial { cx: f64, cy: f64, radius: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub kind: GradientKind,
    pub colors: Vec<Color>,
    pub stops: Vec<f64>,
}

impl Gradient {
    /// Left-to-right linear gradient. Without explicit stops, colors are spaced evenly.
    pub fn linear(colors: Vec<Color>, stops: Option<Vec<f64>>) -> TesseraResult<Self> {
        Self::build(GradientKind::Linear { angle_deg: 90.0 }, colors, stops)
    }

    /// Centered radial gradient reaching the bounds' edge.
    pub fn radial(colors: Vec<Color>, stops: Option<Vec<f64>>) -> TesseraResult<Self> {
        Self::build(
            GradientKind::Radial {
                cx: 0.5,
                cy: 0.5,
                radius: 0.5,
            },
            colors,
            stops,
        )
    }

    pub fn with_angle(mut self, angle_deg: f64) -> TesseraResult<Self> {
        if !angle_deg.is_finite() {
            return Err(TesseraError::validation("gradient", "angle must be finite"));
        }
        if let GradientKind::Linear { .. } = self.kind {
            self.kind = GradientKind::Linear { angle_deg };
        }
        Ok(self)
    }

    fn build(
        kind: GradientKind,
        colors: Vec<Color>,
        stops: Option<Vec<f64>>,
    ) -> TesseraResult<Self> {
        let stops = match stops {
            Some(s) => s,
            None if colors.len() >= 2 => {
                let n = colors.len() - 1;
                (0..=n).map(|i| i as f64 / n as f64).collect()
            }
            None => Vec::new(),
        };
        let g = Self { kind, colors, stops };
        g.validate()?;
        Ok(g)
    }

    pub fn validate(&self) -> TesseraResult<()> {
        if self.colors.len() < 2 {
            return Err(TesseraError::validation(
                "gradient",
                "a gradient requires at least 2 colors",
            ));
        }
        if self.stops.len() != self.colors.len() {
            return Err(TesseraError::validation(
                "gradient",
                format!(
                    "stop count {} does not match color count {}",
                    self.stops.len(),
                    self.colors.len()
                ),
            ));
        }
        let mut prev = f64::NEG_INFINITY;
        for &s in &self.stops {
            if !s.is_finite() || !(0.0..=1.0).contains(&s) {
                return Err(TesseraError::validation(
                    "gradient",
                    format!("stop {s} must be within [0, 1]"),
                ));
            }
            if s < prev {
                return Err(TesseraError::validation(
                    "gradient",
                    "stops must be sorted ascending",
                ));
            }
            prev = s;
        }
        if let GradientKind::Radial { radius, .. } = self.kind
            && !(radius.is_finite() && radius > 0.0)
        {
            return Err(TesseraError::validation(
                "gradient",
                "radial radius must be > 0",
            ));
        }
        Ok(())
    }

    /// Premultiplied color at parameter `t` (clamped to `[0, 1]`).
    pub fn sample_premul(&self, t: f64) -> [u8; 4] {
        let t = t.clamp(0.0, 1.0);
        let last = self.stops.len() - 1;
        if t <= self.stops[0] {
            return self.colors[0].to_premul();
        }
        if t >= self.stops[last] {
            return self.colors[last].to_premul();
        }
        let i = self.stops.iter().rposition(|&s| s <= t).unwrap_or(0).min(last - 1);
        let (s0, s1) = (self.stops[i], self.stops[i + 1]);
        let f = if s1 > s0 { (t - s0) / (s1 - s0) } else { 0.0 };
        let c0 = self.colors[i].to_straight();
        let c1 = self.colors[i + 1].to_straight();
        let lerp = |a: u8, b: u8| -> u8 {
            (f64::from(a) + (f64::from(b) - f64::from(a)) * f).round().clamp(0.0, 255.0) as u8
        };
        Color::rgba(
            lerp(c0[0], c1[0]),
            lerp(c0[1], c1[1]),
            lerp(c0[2], c1[2]),
            f32::from(lerp(c0[3], c1[3])) / 255.0,
        )
        .to_premul()
    }
}

/// Fill or stroke source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Paint {
    Solid(Color),
    Gradient(Gradient),
}

impl Paint {
    pub fn validate(&self) -> TesseraResult<()> {
        match self {
            Paint::Solid(_) => Ok(()),
            Paint::Gradient(g) => g.validate(),
        }
    }
}

impl From<Color> for Paint {
    fn from(c: Color) -> Self {
        Paint::Solid(c)
    }
}

impl From<Gradient> for Paint {
    fn from(g: Gradient) -> Self {
        Paint::Gradient(g)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/color.rs"]
mod tests;
