use kurbo::{Affine, Rect, StrokeOpts};

use crate::assets::Loader;
use crate::foundation::color::Paint;
use crate::foundation::core::{Coverage, Raster};
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::foundation::math::mul_div255_u8;
use crate::geometry::{Geometry, Outline, Shape, build_geometry, cap_glyph};
use crate::render::blur::blur_radius;
use crate::render::composite::{dest_in, over_in_place};
use crate::render::distance::signed_distance;
use crate::render::effects;
use crate::render::paint::paint_raster;
use crate::render::raster::path_coverage;
use crate::style::{BlendMode, Effect, Stroke, StrokePosition, padding};

const TOLERANCE: f64 = 0.1;

/// Rasterize a styled shape onto its own padded canvas.
///
/// The canvas is `ceil(width) + 2p` by `ceil(height) + 2p` with the geometry drawn at `(p, p)`,
/// where `p` is [`padding`] for the shape's style and line caps.
#[tracing::instrument(skip_all, fields(kind = shape.kind.tag()))]
pub fn render_shape(shape: &Shape, loader: &Loader<'_>) -> TesseraResult<Raster> {
    let geom = build_geometry(&shape.kind)?;
    let style = &shape.style;
    let stroke = effective_stroke(shape, &geom);

    let stroke_w = stroke.as_ref().map(|s| s.width).unwrap_or(0.0);
    let cap_extent = geom.line.map(|l| l.cap_extent(stroke_w)).unwrap_or(0.0);
    let pad = padding(style, cap_extent);
    let pf = f64::from(pad);
    let cw = canvas_side(geom.width, pad)?;
    let ch = canvas_side(geom.height, pad)?;
    let origin = Affine::translate((pf, pf));
    let bounds = Rect::new(pf, pf, pf + geom.width, pf + geom.height);

    let fill_cov = outline_coverage(&geom, cw, ch, origin)?;
    let mut body = Raster::new(cw, ch)?;

    if geom.closed
        && let Some(fill) = &style.fill
    {
        paint_over(&mut body, fill, &fill_cov, bounds)?;
    }

    if let Some(stroke) = &stroke
        && stroke.width > 0.0
    {
        let cov = stroke_coverage(&geom, stroke, &fill_cov, cw, ch, origin)?;
        paint_over(&mut body, &stroke.paint, &cov, bounds)?;

        if let Some(line) = geom.line {
            let ends = [
                (line.start_cap, line.start, line.start - line.end),
                (line.end_cap, line.end, line.end - line.start),
            ];
            for (cap, tip, dir) in ends {
                let Some(glyph) = cap_glyph(cap, tip, dir, stroke.width) else {
                    continue;
                };
                let path = if glyph.filled {
                    glyph.path
                } else {
                    kurbo::stroke(
                        glyph.path.iter(),
                        &kurbo::Stroke::new(stroke.width),
                        &StrokeOpts::default(),
                        TOLERANCE,
                    )
                };
                let cov = path_coverage(&path, cw, ch, origin)?;
                paint_over(&mut body, &stroke.paint, &cov, bounds)?;
            }
        }
    }

    let silhouette = body.alpha();
    let mut canvas = Raster::new(cw, ch)?;
    for effect in &style.effects {
        if let Effect::DropShadow(shadow) = effect {
            let layer = effects::drop_shadow(&silhouette, shadow)?;
            over_in_place(&mut canvas.data, &layer.data, 1.0, BlendMode::Normal)?;
        }
    }
    over_in_place(&mut canvas.data, &body.data, 1.0, BlendMode::Normal)?;

    for effect in &style.effects {
        match effect {
            Effect::DropShadow(_) => {}
            Effect::InnerShadow(shadow) => {
                let layer = effects::inner_shadow(&silhouette, shadow)?;
                over_in_place(&mut canvas.data, &layer.data, 1.0, BlendMode::Normal)?;
            }
            Effect::LayerBlur { radius } => canvas = blur_radius(&canvas, *radius)?,
            Effect::BackgroundBlur { radius } => {
                effects::background_blur(&mut canvas, &silhouette, *radius)?
            }
            Effect::Noise(n) => effects::noise(&mut canvas, &silhouette, n)?,
            Effect::Texture(t) => {
                let tile = scaled_texture(loader.raster(&t.source)?, t.scale)?;
                effects::texture(&mut canvas, &silhouette, &tile, (pad, pad), t.opacity, t.blend)?;
            }
            Effect::Glass(g) => effects::glass(&mut canvas, &silhouette, g, bounds)?,
        }
    }

    tracing::debug!(width = cw, height = ch, padding = pad, "shape rasterized");
    Ok(canvas)
}

/// `ceil(extent) + 2 * pad`, or a render error when that does not fit a raster side.
fn canvas_side(extent: f64, pad: u32) -> TesseraResult<u32> {
    let side = extent.ceil() + 2.0 * f64::from(pad);
    if side.is_finite() && side <= f64::from(u32::MAX) {
        Ok(side as u32)
    } else {
        Err(TesseraError::render(format!(
            "shape canvas too large: {extent} plus {pad}px padding per side"
        )))
    }
}

/// Geometry-only coverage of `shape` stretched to `width x height`. Style is ignored.
pub fn geometry_coverage(shape: &Shape, width: u32, height: u32) -> TesseraResult<Coverage> {
    let geom = build_geometry(&shape.kind)?;
    let scale = Affine::scale_non_uniform(
        f64::from(width) / geom.width,
        f64::from(height) / geom.height,
    );
    outline_coverage(&geom, width, height, scale)
}

/// Open outlines (lines, open vectors) carry no fill, so a missing stroke falls back to a
/// 1px center stroke in the fill paint.
fn effective_stroke(shape: &Shape, geom: &Geometry) -> Option<Stroke> {
    match (&shape.style.stroke, &shape.style.fill) {
        (Some(s), _) => Some(s.clone()),
        (None, Some(fill)) if !geom.closed => Some(Stroke::new(fill.clone(), 1.0)),
        _ => None,
    }
}

fn outline_coverage(
    geom: &Geometry,
    width: u32,
    height: u32,
    transform: Affine,
) -> TesseraResult<Coverage> {
    match &geom.outline {
        Outline::Path(path) => path_coverage(path, width, height, transform),
        Outline::Boolean {
            op,
            a,
            b,
            a_offset,
            b_offset,
        } => {
            let ca = outline_coverage(a, width, height, transform * Affine::translate(*a_offset))?;
            let cb = outline_coverage(b, width, height, transform * Affine::translate(*b_offset))?;
            ca.zip_with(&cb, |x, y| op.combine(x, y))
        }
    }
}

fn stroke_coverage(
    geom: &Geometry,
    stroke: &Stroke,
    fill_cov: &Coverage,
    width: u32,
    height: u32,
    origin: Affine,
) -> TesseraResult<Coverage> {
    let position = if geom.closed {
        stroke.position
    } else {
        StrokePosition::Center
    };
    let Some(path) = geom.path() else {
        return Ok(distance_band(fill_cov, stroke.width, position));
    };

    let effective = match position {
        StrokePosition::Center => stroke.width,
        StrokePosition::Inside | StrokePosition::Outside => stroke.width * 2.0,
    };
    let outline = kurbo::stroke(
        path.iter(),
        &stroke.kurbo_style(effective),
        &StrokeOpts::default(),
        TOLERANCE,
    );
    let cov = path_coverage(&outline, width, height, origin)?;
    match position {
        StrokePosition::Center => Ok(cov),
        StrokePosition::Inside => {
            cov.zip_with(fill_cov, |s, f| mul_div255_u8(u16::from(s), u16::from(f)))
        }
        StrokePosition::Outside => {
            cov.zip_with(fill_cov, |s, f| mul_div255_u8(u16::from(s), u16::from(255 - f)))
        }
    }
}

/// Stroke band around a coverage edge, from its signed distance field.
fn distance_band(cov: &Coverage, width: f64, position: StrokePosition) -> Coverage {
    let sd = signed_distance(cov);
    let ramp = |v: f64| v.clamp(0.0, 1.0);
    let data = sd
        .iter()
        .map(|&d| {
            let a = match position {
                StrokePosition::Inside => ramp(0.5 - d) * ramp(d + width + 0.5),
                StrokePosition::Outside => ramp(d + 0.5) * ramp(width - d + 0.5),
                StrokePosition::Center => ramp(width / 2.0 - d.abs() + 0.5),
            };
            (a * 255.0).round() as u8
        })
        .collect();
    Coverage {
        width: cov.width,
        height: cov.height,
        data,
    }
}

fn paint_over(body: &mut Raster, paint: &Paint, cov: &Coverage, bounds: Rect) -> TesseraResult<()> {
    let mut layer = paint_raster(paint, body.width, body.height, bounds)?;
    dest_in(&mut layer, cov, false)?;
    over_in_place(&mut body.data, &layer.data, 1.0, BlendMode::Normal)
}

fn scaled_texture(tile: Raster, scale: f64) -> TesseraResult<Raster> {
    if (scale - 1.0).abs() < f64::EPSILON {
        return Ok(tile);
    }
    let w = (f64::from(tile.width) * scale).round().max(1.0) as u32;
    let h = (f64::from(tile.height) * scale).round().max(1.0) as u32;
    tile.resized(w, h, image::imageops::FilterType::Triangle)
}

#[cfg(test)]
#[path = "../../tests/unit/render/shape.rs"]
mod tests;
