//! Parameter records for pipeline operations. Every record is fully defaulted.

use serde::{Deserialize, Serialize};

use crate::foundation::color::Color;
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::layout::placement::PlacementValue;

pub(crate) fn finite(op: &'static str, name: &str, v: f64) -> TesseraResult<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(TesseraError::validation(op, format!("{name} must be finite")))
    }
}

pub(crate) fn positive(op: &'static str, name: &str, v: f64) -> TesseraResult<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(TesseraError::validation(op, format!("{name} must be > 0 (got {v})")))
    }
}

pub(crate) fn non_negative(op: &'static str, name: &str, v: f64) -> TesseraResult<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(TesseraError::validation(op, format!("{name} must be >= 0 (got {v})")))
    }
}

pub(crate) fn within(op: &'static str, name: &str, v: f64, lo: f64, hi: f64) -> TesseraResult<()> {
    if v.is_finite() && (lo..=hi).contains(&v) {
        Ok(())
    } else {
        Err(TesseraError::validation(
            op,
            format!("{name} must be within [{lo}, {hi}] (got {v})"),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Crop {
    pub x: PlacementValue,
    pub y: PlacementValue,
    pub width: PlacementValue,
    pub height: PlacementValue,
}

impl Default for Crop {
    fn default() -> Self {
        Self {
            x: PlacementValue::ZERO,
            y: PlacementValue::ZERO,
            width: PlacementValue::Percent(100.0),
            height: PlacementValue::Percent(100.0),
        }
    }
}

impl Crop {
    pub fn px(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: PlacementValue::Px(x),
            y: PlacementValue::Px(y),
            width: PlacementValue::Px(width),
            height: PlacementValue::Px(height),
        }
    }

    pub fn validate(&self) -> TesseraResult<()> {
        for v in [self.x, self.y, self.width, self.height] {
            if !v.is_finite() {
                return Err(TesseraError::validation("crop", "crop values must be finite"));
            }
        }
        for v in [self.width, self.height] {
            if let PlacementValue::Px(p) | PlacementValue::Percent(p) = v
                && p <= 0.0
            {
                return Err(TesseraError::validation("crop", "crop size must be > 0"));
            }
        }
        Ok(())
    }
}

/// How the source is fitted into the requested box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Fit {
    /// Stretch to exactly the requested size.
    Fill,
    /// Largest size that fits inside the box, aspect preserved.
    #[default]
    Inside,
    /// Smallest size covering the box, then center-cropped to it.
    Cover,
    /// `Inside`, then letterboxed onto the box with the background color.
    Contain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl ResizeFilter {
    pub(crate) fn image_filter(self) -> image::imageops::FilterType {
        use image::imageops::FilterType;
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }

    pub(crate) fn magick_name(self) -> &'static str {
        match self {
            Self::Nearest => "Point",
            Self::Triangle => "Triangle",
            Self::CatmullRom => "Catrom",
            Self::Gaussian => "Gaussian",
            Self::Lanczos3 => "Lanczos",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resize {
    /// Missing side follows the aspect ratio.
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fit: Fit,
    pub filter: ResizeFilter,
    pub background: Color,
}

impl Default for Resize {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            fit: Fit::Inside,
            filter: ResizeFilter::Lanczos3,
            background: Color::TRANSPARENT,
        }
    }
}

impl Resize {
    /// Fit inside `width x height`, aspect preserved.
    pub fn to(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn fit(mut self, fit: Fit) -> Self {
        self.fit = fit;
        self
    }

    pub fn validate(&self) -> TesseraResult<()> {
        if self.width.is_none() && self.height.is_none() {
            return Err(TesseraError::validation("resize", "width or height is required"));
        }
        if self.width == Some(0) || self.height == Some(0) {
            return Err(TesseraError::validation("resize", "target size must be > 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rotate {
    /// Clockwise.
    pub degrees: f64,
    pub background: Color,
}

impl Default for Rotate {
    fn default() -> Self {
        Self {
            degrees: 90.0,
            background: Color::TRANSPARENT,
        }
    }
}

impl From<f64> for Rotate {
    fn from(degrees: f64) -> Self {
        Self {
            degrees,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Roll {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistortMethod {
    #[default]
    Affine,
    Perspective,
    Arc,
    Barrel,
    ScaleRotateTranslate,
}

impl DistortMethod {
    pub(crate) fn magick_name(self) -> &'static str {
        match self {
            Self::Affine => "Affine",
            Self::Perspective => "Perspective",
            Self::Arc => "Arc",
            Self::Barrel => "Barrel",
            Self::ScaleRotateTranslate => "SRT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Distort {
    pub method: DistortMethod,
    pub args: Vec<f64>,
    /// Grow the canvas to fit the distorted image.
    pub bestfit: bool,
}

impl Distort {
    pub fn validate(&self) -> TesseraResult<()> {
        if self.args.is_empty() {
            return Err(TesseraError::validation("distort", "distort needs arguments"));
        }
        if self.args.iter().any(|a| !a.is_finite()) {
            return Err(TesseraError::validation("distort", "distort arguments must be finite"));
        }
        Ok(())
    }
}

/// Black and white points in percent plus midtone gamma.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Level {
    pub black: f64,
    pub white: f64,
    pub gamma: f64,
}

impl Default for Level {
    fn default() -> Self {
        Self {
            black: 0.0,
            white: 100.0,
            gamma: 1.0,
        }
    }
}

impl Level {
    pub fn validate(&self) -> TesseraResult<()> {
        within("level", "black", self.black, 0.0, 100.0)?;
        within("level", "white", self.white, 0.0, 100.0)?;
        if self.black >= self.white {
            return Err(TesseraError::validation("level", "black must be below white"));
        }
        positive("level", "gamma", self.gamma)
    }
}

/// Percent of pixels clipped to black and to white.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearStretch {
    pub black: f64,
    pub white: f64,
}

impl Default for LinearStretch {
    fn default() -> Self {
        Self {
            black: 2.0,
            white: 1.0,
        }
    }
}

impl LinearStretch {
    pub fn validate(&self) -> TesseraResult<()> {
        within("linear-stretch", "black", self.black, 0.0, 100.0)?;
        within("linear-stretch", "white", self.white, 0.0, 100.0)?;
        if self.black + self.white >= 100.0 {
            return Err(TesseraError::validation(
                "linear-stretch",
                "black + white must stay below 100%",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quantize {
    pub colors: u32,
    pub dither: bool,
}

impl Default for Quantize {
    fn default() -> Self {
        Self {
            colors: 16,
            dither: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Segment {
    pub cluster_threshold: f64,
    pub smoothing: f64,
}

impl Default for Segment {
    fn default() -> Self {
        Self {
            cluster_threshold: 1.0,
            smoothing: 1.5,
        }
    }
}

/// Color blended over the image by `amount` percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorAmount {
    pub color: Color,
    pub amount: f64,
}

impl Default for ColorAmount {
    fn default() -> Self {
        Self {
            color: Color::rgb(255, 200, 120),
            amount: 50.0,
        }
    }
}

impl ColorAmount {
    pub fn validate(&self, op: &'static str) -> TesseraResult<()> {
        within(op, "amount", self.amount, 0.0, 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionBlur {
    pub radius: f64,
    pub sigma: f64,
    pub angle: f64,
}

impl Default for MotionBlur {
    fn default() -> Self {
        Self {
            radius: 0.0,
            sigma: 8.0,
            angle: 0.0,
        }
    }
}

impl MotionBlur {
    pub fn validate(&self) -> TesseraResult<()> {
        non_negative("motion-blur", "radius", self.radius)?;
        positive("motion-blur", "sigma", self.sigma)?;
        finite("motion-blur", "angle", self.angle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoiseKind {
    #[default]
    Gaussian,
    Uniform,
    Impulse,
    Laplacian,
    Poisson,
}

impl NoiseKind {
    pub(crate) fn magick_name(self) -> &'static str {
        match self {
            Self::Gaussian => "Gaussian",
            Self::Uniform => "Uniform",
            Self::Impulse => "Impulse",
            Self::Laplacian => "Laplacian",
            Self::Poisson => "Poisson",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddNoise {
    pub kind: NoiseKind,
    pub attenuate: f64,
    pub seed: u64,
}

impl Default for AddNoise {
    fn default() -> Self {
        Self {
            kind: NoiseKind::Gaussian,
            attenuate: 1.0,
            seed: 7,
        }
    }
}

/// Radius/sigma pair shared by several artistic filters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusSigma {
    pub radius: f64,
    pub sigma: f64,
}

impl Default for RadiusSigma {
    fn default() -> Self {
        Self {
            radius: 0.0,
            sigma: 1.0,
        }
    }
}

impl RadiusSigma {
    pub fn validate(&self, op: &'static str) -> TesseraResult<()> {
        non_negative(op, "radius", self.radius)?;
        positive(op, "sigma", self.sigma)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sketch {
    pub radius: f64,
    pub sigma: f64,
    pub angle: f64,
}

impl Default for Sketch {
    fn default() -> Self {
        Self {
            radius: 0.0,
            sigma: 20.0,
            angle: 120.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wave {
    pub amplitude: f64,
    pub wavelength: f64,
}

impl Default for Wave {
    fn default() -> Self {
        Self {
            amplitude: 10.0,
            wavelength: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vignette {
    pub radius: f64,
    pub sigma: f64,
    pub color: Color,
}

impl Default for Vignette {
    fn default() -> Self {
        Self {
            radius: 0.0,
            sigma: 40.0,
            color: Color::BLACK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Border {
    pub width: u32,
    pub color: Color,
}

impl Default for Border {
    fn default() -> Self {
        Self {
            width: 10,
            color: Color::BLACK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Frame {
    pub width: u32,
    pub color: Color,
    pub inner_bevel: u32,
    pub outer_bevel: u32,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            width: 16,
            color: Color::rgb(128, 128, 128),
            inner_bevel: 3,
            outer_bevel: 3,
        }
    }
}

impl Frame {
    pub fn validate(&self) -> TesseraResult<()> {
        if self.width == 0 {
            return Err(TesseraError::validation("frame", "frame width must be > 0"));
        }
        if self.inner_bevel + self.outer_bevel > self.width {
            return Err(TesseraError::validation(
                "frame",
                "bevels must fit inside the frame width",
            ));
        }
        Ok(())
    }
}

macro_rules! scalar_params {
    ($($(#[$meta:meta])* $name:ident { $field:ident: $ty:ty = $default:expr })*) => {$(
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            pub $field: $ty,
        }

        impl Default for $name {
            fn default() -> Self {
                Self { $field: $default }
            }
        }

        impl From<$ty> for $name {
            fn from(v: $ty) -> Self {
                Self { $field: v }
            }
        }
    )*};
}

scalar_params! {
    Gamma { value: f64 = 1.0 }
    /// Signed contrast change in percent, `-100..=100`.
    Contrast { amount: f64 = 20.0 }
    Posterize { levels: u32 = 4 }
    /// Sepia tone threshold in percent.
    Sepia { threshold: f64 = 80.0 }
    /// Luminance threshold in percent.
    Threshold { percent: f64 = 50.0 }
    Blur { sigma: f64 = 2.0 }
    Sharpen { sigma: f64 = 1.0 }
    RotationalBlur { angle: f64 = 10.0 }
    /// Wavelet threshold in percent.
    Denoise { threshold: f64 = 5.0 }
    OilPaint { radius: f64 = 3.0 }
    Edge { radius: f64 = 1.0 }
    /// Solarize threshold in percent.
    Solarize { threshold: f64 = 50.0 }
    Swirl { degrees: f64 = 90.0 }
    Implode { amount: f64 = 0.5 }
}
