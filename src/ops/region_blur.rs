//! Blur or pixelate the inside of a polygon.

use kurbo::{Affine, BezPath};
use serde::{Deserialize, Serialize};

use crate::foundation::core::Raster;
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::layout::placement::Position;
use crate::render::blur::gaussian_blur;
use crate::render::composite::mix_by_coverage;
use crate::render::raster::path_coverage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionBlurMode {
    /// Nearest-neighbor down/up scaling by a block size.
    #[default]
    Pixel,
    Gaussian,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionBlur {
    pub points: Vec<Position>,
    #[serde(default)]
    pub mode: RegionBlurMode,
    /// Block size in pixels (pixel mode) or sigma (gaussian mode).
    #[serde(default = "default_intensity")]
    pub intensity: f64,
}

fn default_intensity() -> f64 {
    10.0
}

impl Default for RegionBlur {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            mode: RegionBlurMode::Pixel,
            intensity: default_intensity(),
        }
    }
}

impl RegionBlur {
    pub fn new(points: Vec<Position>) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> TesseraResult<()> {
        if self.points.len() < 3 {
            return Err(TesseraError::validation(
                "region-blur",
                format!("a region needs at least 3 points (got {})", self.points.len()),
            ));
        }
        if self.points.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
            return Err(TesseraError::validation("region-blur", "points must be finite"));
        }
        if !(self.intensity.is_finite() && self.intensity > 0.0) {
            return Err(TesseraError::validation("region-blur", "intensity must be > 0"));
        }
        Ok(())
    }
}

/// Order points around their centroid by angle (ties: distance, then input index), starting at
/// the point with minimum `(y, x)`.
pub fn order_contour(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    if points.is_empty() {
        return Vec::new();
    }
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.0).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.1).sum::<f64>() / n;

    let mut keyed: Vec<(f64, f64, usize)> = points
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| ((y - cy).atan2(x - cx), (x - cx).hypot(y - cy), i))
        .collect();
    keyed.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then(a.1.total_cmp(&b.1))
            .then(a.2.cmp(&b.2))
    });
    let mut ordered: Vec<(f64, f64)> = keyed.iter().map(|k| points[k.2]).collect();

    let start = ordered
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.1.total_cmp(&b.1).then(a.0.total_cmp(&b.0)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    ordered.rotate_left(start);
    ordered
}

/// Process the polygon interior of `raster` and composite it over the untouched original.
#[tracing::instrument(skip_all, fields(points = params.points.len(), mode = ?params.mode))]
pub fn apply_region_blur(raster: &Raster, params: &RegionBlur) -> TesseraResult<Raster> {
    params.validate()?;
    let (w, h) = (f64::from(raster.width), f64::from(raster.height));
    let resolved = params
        .points
        .iter()
        .map(|p| {
            let (x, y) = p.resolve(w, h)?;
            Ok((x as f64, y as f64))
        })
        .collect::<TesseraResult<Vec<_>>>()?;
    let contour = order_contour(&resolved);

    let mut path = BezPath::new();
    for (i, &(x, y)) in contour.iter().enumerate() {
        if i == 0 {
            path.move_to((x, y));
        } else {
            path.line_to((x, y));
        }
    }
    path.close_path();
    let mask = path_coverage(&path, raster.width, raster.height, Affine::IDENTITY)?;

    let processed = match params.mode {
        RegionBlurMode::Pixel => pixelate(raster, params.intensity)?,
        RegionBlurMode::Gaussian => gaussian_blur(raster, params.intensity as f32)?,
    };
    let mut out = raster.clone();
    mix_by_coverage(&mut out, &processed, &mask)?;
    Ok(out)
}

pub(crate) fn pixelate(raster: &Raster, intensity: f64) -> TesseraResult<Raster> {
    use image::imageops::FilterType;

    let block = intensity.round().max(2.0) as u32;
    let small_w = raster.width.div_ceil(block).max(1);
    let small_h = raster.height.div_ceil(block).max(1);
    raster
        .resized(small_w, small_h, FilterType::Nearest)?
        .resized(raster.width, raster.height, FilterType::Nearest)
}

#[cfg(test)]
#[path = "../../tests/unit/ops/region_blur.rs"]
mod tests;
