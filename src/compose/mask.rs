use serde::{Deserialize, Serialize};

use crate::assets::{Loader, SourceRef};
use crate::foundation::core::{Coverage, Raster};
use crate::foundation::error::TesseraResult;
use crate::foundation::math::luma_u8;
use crate::geometry::Shape;
use crate::render::{dest_in, geometry_coverage, render_shape};

/// Shape or external image providing mask weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaskSource {
    Shape(Shape),
    Image(SourceRef),
}

impl MaskSource {
    fn validate(&self, op: &'static str) -> TesseraResult<()> {
        match self {
            Self::Shape(s) => s.validate(op),
            Self::Image(src) => src.validate(op),
        }
    }
}

/// How a mask turns into per-pixel weights. Masks are stretched to the masked content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Mask {
    /// Geometry coverage only; fill, stroke and effects are ignored.
    Clip {
        #[serde(default)]
        shape: Option<Shape>,
        #[serde(default)]
        invert: bool,
    },
    /// Rendered alpha of the source.
    Alpha {
        source: MaskSource,
        #[serde(default)]
        invert: bool,
    },
    /// Luminance of the (premultiplied) source.
    Luminance {
        source: MaskSource,
        #[serde(default)]
        invert: bool,
    },
}

impl Mask {
    pub fn clip(shape: Shape) -> Self {
        Self::Clip {
            shape: Some(shape),
            invert: false,
        }
    }

    pub fn alpha(source: MaskSource) -> Self {
        Self::Alpha {
            source,
            invert: false,
        }
    }

    pub fn luminance(source: MaskSource) -> Self {
        Self::Luminance {
            source,
            invert: false,
        }
    }

    pub fn inverted(mut self) -> Self {
        match &mut self {
            Self::Clip { invert, .. }
            | Self::Alpha { invert, .. }
            | Self::Luminance { invert, .. } => {
                *invert = !*invert
            }
        }
        self
    }

    pub fn validate(&self, op: &'static str) -> TesseraResult<()> {
        match self {
            Self::Clip { shape, .. } => shape.as_ref().map_or(Ok(()), |s| s.validate(op)),
            Self::Alpha { source, .. } | Self::Luminance { source, .. } => source.validate(op),
        }
    }
}

/// Multiply `raster` by the mask weights (destination-in).
#[tracing::instrument(skip_all, fields(width = raster.width, height = raster.height))]
pub fn apply_mask(raster: &mut Raster, mask: &Mask, loader: &Loader<'_>) -> TesseraResult<()> {
    let (w, h) = (raster.width, raster.height);
    let (coverage, invert) = match mask {
        Mask::Clip { shape: None, .. } => return Ok(()),
        Mask::Clip {
            shape: Some(shape),
            invert,
        } => (geometry_coverage(shape, w, h)?, *invert),
        Mask::Alpha { source, invert } => (mask_raster(source, w, h, loader)?.alpha(), *invert),
        Mask::Luminance { source, invert } => {
            (luminance(&mask_raster(source, w, h, loader)?), *invert)
        }
    };
    dest_in(raster, &coverage, invert)
}

fn mask_raster(source: &MaskSource, w: u32, h: u32, loader: &Loader<'_>) -> TesseraResult<Raster> {
    let raster = match source {
        MaskSource::Shape(shape) => render_shape(shape, loader)?,
        MaskSource::Image(src) => loader.raster(src)?,
    };
    raster.resized(w, h, image::imageops::FilterType::Triangle)
}

fn luminance(raster: &Raster) -> Coverage {
    Coverage {
        width: raster.width,
        height: raster.height,
        data: raster
            .data
            .chunks_exact(4)
            .map(|px| luma_u8(px[0], px[1], px[2]))
            .collect(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/mask.rs"]
mod tests;
