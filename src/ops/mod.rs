//! The closed set of pipeline operations.

pub mod params;
pub mod region_blur;

use serde::{Deserialize, Serialize};

use crate::compose::{Group, Layer};
use crate::foundation::error::{TesseraError, TesseraResult};

pub use params::{
    AddNoise, Blur, Border, ColorAmount, Contrast, Crop, Denoise, Distort, DistortMethod, Edge, Fit,
    Frame, Gamma, Implode, Level, LinearStretch, MotionBlur, NoiseKind, OilPaint, Posterize,
    Quantize, RadiusSigma, Resize, ResizeFilter, Roll, Rotate, RotationalBlur, Segment, Sepia,
    Sharpen, Sketch, Solarize, Swirl, Threshold, Vignette, Wave,
};
pub use region_blur::{RegionBlur, RegionBlurMode, apply_region_blur, order_contour};

use params::{finite, non_negative, positive, within};

/// One immutable pipeline step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Operation {
    Crop(Crop),
    Resize(Resize),
    Rotate(Rotate),
    Flip,
    Flop,
    Roll(Roll),
    Distort(Distort),

    Grayscale,
    Negate,
    Normalize,
    Equalize,
    AutoLevel,
    AutoGamma,
    Gamma(Gamma),
    Level(Level),
    LinearStretch(LinearStretch),
    Contrast(Contrast),
    Posterize(Posterize),
    Sepia(Sepia),
    Tint(ColorAmount),
    Colorize(ColorAmount),
    Threshold(Threshold),
    Quantize(Quantize),
    Segment(Segment),

    Sharpen(Sharpen),
    Blur(Blur),
    MotionBlur(MotionBlur),
    RotationalBlur(RotationalBlur),
    RegionBlur(RegionBlur),
    Noise(AddNoise),
    Despeckle,
    Denoise(Denoise),

    Charcoal(RadiusSigma),
    Sketch(Sketch),
    OilPaint(OilPaint),
    Emboss(RadiusSigma),
    Edge(Edge),
    Solarize(Solarize),
    Swirl(Swirl),
    Wave(Wave),
    Implode(Implode),
    Vignette(Vignette),

    Border(Border),
    Frame(Frame),

    Overlay(Box<Layer>),
    Group(Group),
}

macro_rules! op_tags {
    ($($variant:ident => $tag:literal),* $(,)?) => {
        /// Stable kebab-case identifier of an operation kind.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum OpTag {
            $($variant),*
        }

        impl OpTag {
            pub const ALL: &'static [OpTag] = &[$(OpTag::$variant),*];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(OpTag::$variant => $tag),*
                }
            }
        }
    };
}

op_tags! {
    Crop => "crop",
    Resize => "resize",
    Rotate => "rotate",
    Flip => "flip",
    Flop => "flop",
    Roll => "roll",
    Distort => "distort",
    Grayscale => "grayscale",
    Negate => "negate",
    Normalize => "normalize",
    Equalize => "equalize",
    AutoLevel => "auto-level",
    AutoGamma => "auto-gamma",
    Gamma => "gamma",
    Level => "level",
    LinearStretch => "linear-stretch",
    Contrast => "contrast",
    Posterize => "posterize",
    Sepia => "sepia",
    Tint => "tint",
    Colorize => "colorize",
    Threshold => "threshold",
    Quantize => "quantize",
    Segment => "segment",
    Sharpen => "sharpen",
    Blur => "blur",
    MotionBlur => "motion-blur",
    RotationalBlur => "rotational-blur",
    RegionBlur => "region-blur",
    Noise => "noise",
    Despeckle => "despeckle",
    Denoise => "denoise",
    Charcoal => "charcoal",
    Sketch => "sketch",
    OilPaint => "oil-paint",
    Emboss => "emboss",
    Edge => "edge",
    Solarize => "solarize",
    Swirl => "swirl",
    Wave => "wave",
    Implode => "implode",
    Vignette => "vignette",
    Border => "border",
    Frame => "frame",
    Overlay => "overlay",
    Group => "group",
}

impl std::fmt::Display for OpTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Operation {
    pub fn tag(&self) -> OpTag {
        match self {
            Self::Crop(_) => OpTag::Crop,
            Self::Resize(_) => OpTag::Resize,
            Self::Rotate(_) => OpTag::Rotate,
            Self::Flip => OpTag::Flip,
            Self::Flop => OpTag::Flop,
            Self::Roll(_) => OpTag::Roll,
            Self::Distort(_) => OpTag::Distort,
            Self::Grayscale => OpTag::Grayscale,
            Self::Negate => OpTag::Negate,
            Self::Normalize => OpTag::Normalize,
            Self::Equalize => OpTag::Equalize,
            Self::AutoLevel => OpTag::AutoLevel,
            Self::AutoGamma => OpTag::AutoGamma,
            Self::Gamma(_) => OpTag::Gamma,
            Self::Level(_) => OpTag::Level,
            Self::LinearStretch(_) => OpTag::LinearStretch,
            Self::Contrast(_) => OpTag::Contrast,
            Self::Posterize(_) => OpTag::Posterize,
            Self::Sepia(_) => OpTag::Sepia,
            Self::Tint(_) => OpTag::Tint,
            Self::Colorize(_) => OpTag::Colorize,
            Self::Threshold(_) => OpTag::Threshold,
            Self::Quantize(_) => OpTag::Quantize,
            Self::Segment(_) => OpTag::Segment,
            Self::Sharpen(_) => OpTag::Sharpen,
            Self::Blur(_) => OpTag::Blur,
            Self::MotionBlur(_) => OpTag::MotionBlur,
            Self::RotationalBlur(_) => OpTag::RotationalBlur,
            Self::RegionBlur(_) => OpTag::RegionBlur,
            Self::Noise(_) => OpTag::Noise,
            Self::Despeckle => OpTag::Despeckle,
            Self::Denoise(_) => OpTag::Denoise,
            Self::Charcoal(_) => OpTag::Charcoal,
            Self::Sketch(_) => OpTag::Sketch,
            Self::OilPaint(_) => OpTag::OilPaint,
            Self::Emboss(_) => OpTag::Emboss,
            Self::Edge(_) => OpTag::Edge,
            Self::Solarize(_) => OpTag::Solarize,
            Self::Swirl(_) => OpTag::Swirl,
            Self::Wave(_) => OpTag::Wave,
            Self::Implode(_) => OpTag::Implode,
            Self::Vignette(_) => OpTag::Vignette,
            Self::Border(_) => OpTag::Border,
            Self::Frame(_) => OpTag::Frame,
            Self::Overlay(_) => OpTag::Overlay,
            Self::Group(_) => OpTag::Group,
        }
    }

    /// Overlay and group are handled by the compositor, never by a backend.
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Overlay(_) | Self::Group(_))
    }

    /// Check parameters; errors carry the operation tag.
    pub fn validate(&self) -> TesseraResult<()> {
        let op = self.tag().as_str();
        match self {
            Self::Crop(p) => p.validate(),
            Self::Resize(p) => p.validate(),
            Self::Rotate(p) => finite(op, "degrees", p.degrees),
            Self::Distort(p) => p.validate(),
            Self::Gamma(p) => positive(op, "gamma", p.value),
            Self::Level(p) => p.validate(),
            Self::LinearStretch(p) => p.validate(),
            Self::Contrast(p) => within(op, "amount", p.amount, -100.0, 100.0),
            Self::Posterize(p) => {
                if (2..=256).contains(&p.levels) {
                    Ok(())
                } else {
                    Err(TesseraError::validation(op, "posterize levels must be within 2..=256"))
                }
            }
            Self::Sepia(p) => within(op, "threshold", p.threshold, 0.0, 100.0),
            Self::Tint(p) | Self::Colorize(p) => p.validate(op),
            Self::Threshold(p) => within(op, "percent", p.percent, 0.0, 100.0),
            Self::Quantize(p) => {
                if (2..=65_536).contains(&p.colors) {
                    Ok(())
                } else {
                    Err(TesseraError::validation(op, "quantize colors must be within 2..=65536"))
                }
            }
            Self::Segment(p) => {
                positive(op, "cluster_threshold", p.cluster_threshold)?;
                non_negative(op, "smoothing", p.smoothing)
            }
            Self::Sharpen(p) => positive(op, "sigma", p.sigma),
            Self::Blur(p) => positive(op, "sigma", p.sigma),
            Self::MotionBlur(p) => p.validate(),
            Self::RotationalBlur(p) => within(op, "angle", p.angle, 0.0, 360.0),
            Self::RegionBlur(p) => p.validate(),
            Self::Noise(p) => positive(op, "attenuate", p.attenuate),
            Self::Denoise(p) => within(op, "threshold", p.threshold, 0.0, 100.0),
            Self::Charcoal(p) | Self::Emboss(p) => p.validate(op),
            Self::Sketch(p) => {
                non_negative(op, "radius", p.radius)?;
                positive(op, "sigma", p.sigma)?;
                finite(op, "angle", p.angle)
            }
            Self::OilPaint(p) => positive(op, "radius", p.radius),
            Self::Edge(p) => positive(op, "radius", p.radius),
            Self::Solarize(p) => within(op, "threshold", p.threshold, 0.0, 100.0),
            Self::Swirl(p) => finite(op, "degrees", p.degrees),
            Self::Wave(p) => {
                finite(op, "amplitude", p.amplitude)?;
                positive(op, "wavelength", p.wavelength)
            }
            Self::Implode(p) => within(op, "amount", p.amount, -1.0, 1.0),
            Self::Vignette(p) => {
                non_negative(op, "radius", p.radius)?;
                positive(op, "sigma", p.sigma)
            }
            Self::Border(p) => {
                if p.width == 0 {
                    Err(TesseraError::validation(op, "border width must be > 0"))
                } else {
                    Ok(())
                }
            }
            Self::Frame(p) => p.validate(),
            Self::Overlay(layer) => layer.validate(op),
            Self::Group(group) => group.validate(op),
            Self::Flip
            | Self::Flop
            | Self::Roll(_)
            | Self::Grayscale
            | Self::Negate
            | Self::Normalize
            | Self::Equalize
            | Self::AutoLevel
            | Self::AutoGamma
            | Self::Despeckle => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ops/operation.rs"]
mod tests;
