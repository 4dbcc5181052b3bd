use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{TesseraError, TesseraResult};

/// Angle given as radians, `"Ndeg"` or `"N%"` of a full turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AngleValue {
    Radians(f64),
    Text(String),
}

impl AngleValue {
    pub fn degrees(d: f64) -> Self {
        Self::Radians(d.to_radians())
    }

    pub fn to_radians(&self) -> TesseraResult<f64> {
        match self {
            Self::Radians(r) if r.is_finite() => Ok(*r),
            Self::Radians(r) => Err(TesseraError::resolution(format!("angle {r} is not finite"))),
            Self::Text(s) => parse_angle(s),
        }
    }

    pub(crate) fn validate(&self, op: &'static str) -> TesseraResult<()> {
        self.to_radians()
            .map(|_| ())
            .map_err(|e| TesseraError::validation(op, e.to_string()))
    }
}

impl From<f64> for AngleValue {
    fn from(r: f64) -> Self {
        Self::Radians(r)
    }
}

impl From<&str> for AngleValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

fn parse_angle(text: &str) -> TesseraResult<f64> {
    let t = text.trim();
    let bad = || TesseraError::resolution(format!("malformed angle \"{text}\""));
    let num = |s: &str| -> TesseraResult<f64> {
        s.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(bad)
    };
    if let Some(d) = t.strip_suffix("deg") {
        return Ok(num(d)?.to_radians());
    }
    if let Some(p) = t.strip_suffix('%') {
        return Ok(num(p)? / 100.0 * TAU);
    }
    num(t.strip_suffix("rad").unwrap_or(t))
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/angle.rs"]
mod tests;
