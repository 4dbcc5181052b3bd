use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::assets::SourceRef;
use crate::compose::overlay::{Group, Layer, LayerContent};
use crate::encode::{ExportFormat, encode_raster, to_base64, to_file};
use crate::foundation::color::Color;
use crate::foundation::core::Raster;
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::ops::*;
use crate::pipeline::renderer::{Rendered, Renderer};

/// Overlay nesting allowed when an asset is recorded.
pub const MAX_NESTING_DEPTH: usize = 16;

/// Where an asset's pixels come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AssetSource {
    Source {
        source: SourceRef,
    },
    Blank {
        width: u32,
        height: u32,
        #[serde(default = "transparent")]
        color: Color,
    },
    /// In-memory pixels; not serializable.
    #[serde(skip)]
    Raster(Raster),
}

fn transparent() -> Color {
    Color::TRANSPARENT
}

/// A source plus the ordered operations applied to it.
///
/// Builder calls validate and append, returning the same asset. Rendering never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub source: AssetSource,
    #[serde(default)]
    pub ops: Vec<Operation>,
}

impl Asset {
    pub fn from_source(source: impl Into<SourceRef>) -> Self {
        Self {
            source: AssetSource::Source {
                source: source.into(),
            },
            ops: Vec::new(),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::from_source(path.as_ref())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::from_source(SourceRef::Bytes(bytes))
    }

    pub fn from_raster(raster: Raster) -> Self {
        Self {
            source: AssetSource::Raster(raster),
            ops: Vec::new(),
        }
    }

    /// Solid canvas; size is checked when rendered.
    pub fn blank(width: u32, height: u32, color: Color) -> Self {
        Self {
            source: AssetSource::Blank {
                width,
                height,
                color,
            },
            ops: Vec::new(),
        }
    }

    /// Validate `op` and append it.
    pub fn push(mut self, op: Operation) -> TesseraResult<Self> {
        op.validate()?;
        self.ops.push(op);
        if self.nesting_depth() > MAX_NESTING_DEPTH {
            return Err(nesting_error(MAX_NESTING_DEPTH));
        }
        Ok(self)
    }

    pub fn overlay(self, layer: Layer) -> TesseraResult<Self> {
        self.push(Operation::Overlay(Box::new(layer)))
    }

    pub fn group(self, group: Group) -> TesseraResult<Self> {
        self.push(Operation::Group(group))
    }

    /// Levels of assets embedded below this one through overlay or group layers.
    pub fn nesting_depth(&self) -> usize {
        fn layer_depth(layer: &Layer) -> usize {
            match &layer.content {
                LayerContent::Asset(a) => 1 + a.nesting_depth(),
                _ => 0,
            }
        }
        self.ops
            .iter()
            .map(|op| match op {
                Operation::Overlay(layer) => layer_depth(layer),
                Operation::Group(g) => g.layers.iter().map(layer_depth).max().unwrap_or(0),
                _ => 0,
            })
            .max()
            .unwrap_or(0)
    }

    /// Re-check the source, every recorded operation and the nesting bound.
    pub fn validate(&self) -> TesseraResult<()> {
        match &self.source {
            AssetSource::Source { source } => source.validate("source")?,
            AssetSource::Blank { width, height, .. } => {
                if *width == 0 || *height == 0 {
                    return Err(TesseraError::validation(
                        "source",
                        "blank canvas size must be > 0",
                    ));
                }
            }
            AssetSource::Raster(_) => {}
        }
        for op in &self.ops {
            op.validate()?;
        }
        if self.nesting_depth() > MAX_NESTING_DEPTH {
            return Err(nesting_error(MAX_NESTING_DEPTH));
        }
        Ok(())
    }

    /// Render with the shared default [`Renderer`].
    pub fn render(&self) -> TesseraResult<Raster> {
        Ok(Renderer::shared().render(self)?.raster)
    }

    pub fn render_with(&self, renderer: &Renderer) -> TesseraResult<Rendered> {
        renderer.render(self)
    }

    pub fn export(&self, format: ExportFormat) -> TesseraResult<Vec<u8>> {
        encode_raster(&self.render()?, format)
    }

    /// PNG bytes.
    pub fn to_bytes(&self) -> TesseraResult<Vec<u8>> {
        self.export(ExportFormat::Png)
    }

    /// PNG `data:` URI.
    pub fn to_base64(&self) -> TesseraResult<String> {
        Ok(to_base64(&self.to_bytes()?, Some(ExportFormat::Png.mime())))
    }

    /// Render and write, choosing the format from the extension.
    pub fn to_file(&self, path: impl AsRef<Path>) -> TesseraResult<()> {
        let path = path.as_ref();
        let format = ExportFormat::from_path(path)?;
        to_file(&self.export(format)?, path)
    }

    /// Load a serialized pipeline; every operation is validated again.
    pub fn from_json(json: &str) -> TesseraResult<Self> {
        let asset: Asset = serde_json::from_str(json)
            .map_err(|e| TesseraError::validation("asset", format!("parse pipeline JSON: {e}")))?;
        asset.validate()?;
        Ok(asset)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> TesseraResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            let msg = format!("open pipeline JSON '{}': {e}", path.display());
            TesseraError::validation("asset", msg)
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> TesseraResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TesseraError::validation("asset", format!("serialize pipeline: {e}")))
    }
}

pub(crate) fn nesting_error(max: usize) -> TesseraError {
    TesseraError::validation("overlay", format!("assets nest deeper than {max} levels"))
}

macro_rules! chain_ops {
    (
        params { $($(#[$pm:meta])* $method:ident => $variant:ident($param:ty),)* }
        unit { $($(#[$um:meta])* $unit:ident => $uvariant:ident,)* }
    ) => {
        impl Asset {
            $(
                $(#[$pm])*
                pub fn $method(self, params: impl Into<$param>) -> TesseraResult<Self> {
                    self.push(Operation::$variant(params.into()))
                }
            )*
            $(
                $(#[$um])*
                pub fn $unit(self) -> TesseraResult<Self> {
                    self.push(Operation::$uvariant)
                }
            )*
        }
    };
}

chain_ops! {
    params {
        crop => Crop(Crop),
        resize => Resize(Resize),
        rotate => Rotate(Rotate),
        roll => Roll(Roll),
        distort => Distort(Distort),
        gamma => Gamma(Gamma),
        level => Level(Level),
        linear_stretch => LinearStretch(LinearStretch),
        contrast => Contrast(Contrast),
        posterize => Posterize(Posterize),
        sepia => Sepia(Sepia),
        tint => Tint(ColorAmount),
        colorize => Colorize(ColorAmount),
        threshold => Threshold(Threshold),
        quantize => Quantize(Quantize),
        segment => Segment(Segment),
        sharpen => Sharpen(Sharpen),
        blur => Blur(Blur),
        motion_blur => MotionBlur(MotionBlur),
        rotational_blur => RotationalBlur(RotationalBlur),
        /// Pixelate or blur inside a polygon.
        region_blur => RegionBlur(RegionBlur),
        noise => Noise(AddNoise),
        denoise => Denoise(Denoise),
        charcoal => Charcoal(RadiusSigma),
        sketch => Sketch(Sketch),
        oil_paint => OilPaint(OilPaint),
        emboss => Emboss(RadiusSigma),
        edge => Edge(Edge),
        solarize => Solarize(Solarize),
        swirl => Swirl(Swirl),
        wave => Wave(Wave),
        implode => Implode(Implode),
        vignette => Vignette(Vignette),
        border => Border(Border),
        frame => Frame(Frame),
    }
    unit {
        /// Mirror top to bottom.
        flip => Flip,
        /// Mirror left to right.
        flop => Flop,
        grayscale => Grayscale,
        negate => Negate,
        normalize => Normalize,
        equalize => Equalize,
        auto_level => AutoLevel,
        auto_gamma => AutoGamma,
        despeckle => Despeckle,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/asset.rs"]
mod tests;
