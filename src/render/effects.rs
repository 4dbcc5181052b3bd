use kurbo::Rect;

use crate::foundation::color::{Color, Gradient, Paint};
use crate::foundation::core::{Coverage, Raster};
use crate::foundation::error::TesseraResult;
use crate::foundation::math::SplitMix64;
use crate::render::blur::blur_radius;
use crate::render::composite::{composite_at, dest_in, mix_by_coverage, over_in_place};
use crate::render::distance::signed_distance;
use crate::render::paint::paint_raster;
use crate::style::{BlendMode, Glass, Noise, Shadow};

/// Grow (`spread > 0`) or shrink (`spread < 0`) a coverage mask by a distance in pixels.
pub fn spread_coverage(cov: &Coverage, spread: f64) -> Coverage {
    if spread == 0.0 {
        return cov.clone();
    }
    let sd = signed_distance(cov);
    Coverage {
        width: cov.width,
        height: cov.height,
        data: sd
            .iter()
            .map(|&d| ((spread - d + 0.5).clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect(),
    }
}

fn colorize(cov: &Coverage, color: Color) -> TesseraResult<Raster> {
    let mut out = Raster::filled(cov.width, cov.height, color.to_premul())?;
    dest_in(&mut out, cov, false)?;
    Ok(out)
}

fn shifted(src: &Raster, dx: f64, dy: f64) -> TesseraResult<Raster> {
    let mut out = Raster::new(src.width, src.height)?;
    composite_at(
        &mut out,
        src,
        dx.round() as i64,
        dy.round() as i64,
        1.0,
        BlendMode::Normal,
    )?;
    Ok(out)
}

/// Shadow layer cast by `silhouette`, drawn behind the shape.
pub fn drop_shadow(silhouette: &Coverage, shadow: &Shadow) -> TesseraResult<Raster> {
    let shape = spread_coverage(silhouette, shadow.spread);
    let layer = shifted(&colorize(&shape, shadow.color)?, shadow.dx, shadow.dy)?;
    blur_radius(&layer, shadow.blur)
}

/// Shadow cast inward from the silhouette edge, clipped to the silhouette.
pub fn inner_shadow(silhouette: &Coverage, shadow: &Shadow) -> TesseraResult<Raster> {
    let outside = Coverage {
        width: silhouette.width,
        height: silhouette.height,
        data: silhouette.data.iter().map(|&v| 255 - v).collect(),
    };
    let grown = spread_coverage(&outside, shadow.spread);
    let layer = shifted(&colorize(&grown, shadow.color)?, shadow.dx, shadow.dy)?;
    let mut layer = blur_radius(&layer, shadow.blur)?;
    dest_in(&mut layer, silhouette, false)?;
    Ok(layer)
}

/// Blur what has been drawn so far, inside the silhouette only.
pub fn background_blur(
    canvas: &mut Raster,
    silhouette: &Coverage,
    radius: f64,
) -> TesseraResult<()> {
    let blurred = blur_radius(canvas, radius)?;
    mix_by_coverage(canvas, &blurred, silhouette)
}

/// Seeded blocks of random color (or grey), overlay-blended inside the silhouette.
pub fn noise(canvas: &mut Raster, silhouette: &Coverage, noise: &Noise) -> TesseraResult<()> {
    let block = noise.size.round().max(1.0) as u32;
    let cols = canvas.width.div_ceil(block);
    let rows = canvas.height.div_ceil(block);
    let mut rng = SplitMix64::new(noise.seed);
    let cells: Vec<[u8; 4]> = (0..cols * rows)
        .map(|_| {
            if noise.monochrome {
                let v = rng.next_u8();
                [v, v, v, 255]
            } else {
                [rng.next_u8(), rng.next_u8(), rng.next_u8(), 255]
            }
        })
        .collect();

    let mut layer = Raster::new(canvas.width, canvas.height)?;
    let w = canvas.width as usize;
    for (i, px) in layer.data.chunks_exact_mut(4).enumerate() {
        let (x, y) = ((i % w) as u32, (i / w) as u32);
        px.copy_from_slice(&cells[((y / block) * cols + x / block) as usize]);
    }
    dest_in(&mut layer, silhouette, false)?;
    over_in_place(&mut canvas.data, &layer.data, noise.opacity, BlendMode::Overlay)
}

/// Tile `texture` (already scaled) from `origin`, clipped to the silhouette.
pub fn texture(
    canvas: &mut Raster,
    silhouette: &Coverage,
    texture: &Raster,
    origin: (u32, u32),
    opacity: f32,
    blend: BlendMode,
) -> TesseraResult<()> {
    let mut layer = Raster::new(canvas.width, canvas.height)?;
    let (tw, th) = (i64::from(texture.width), i64::from(texture.height));
    let w = canvas.width as usize;
    for (i, px) in layer.data.chunks_exact_mut(4).enumerate() {
        let x = (i % w) as i64 - i64::from(origin.0);
        let y = (i / w) as i64 - i64::from(origin.1);
        px.copy_from_slice(&texture.pixel(x.rem_euclid(tw) as u32, y.rem_euclid(th) as u32));
    }
    dest_in(&mut layer, silhouette, false)?;
    over_in_place(&mut canvas.data, &layer.data, opacity, blend)
}

/// Background blur, tint and top highlight inside the silhouette.
pub fn glass(
    canvas: &mut Raster,
    silhouette: &Coverage,
    glass: &Glass,
    bounds: Rect,
) -> TesseraResult<()> {
    background_blur(canvas, silhouette, glass.blur)?;
    if let Some(tint) = glass.tint
        && glass.tint_opacity > 0.0
    {
        let layer = colorize(silhouette, tint)?;
        over_in_place(&mut canvas.data, &layer.data, glass.tint_opacity, BlendMode::Normal)?;
    }
    if glass.highlight > 0.0 {
        let g = Gradient::linear(
            vec![Color::WHITE, Color::WHITE.with_alpha(0.0)],
            Some(vec![0.0, 0.5]),
        )?
        .with_angle(180.0)?;
        let mut layer = paint_raster(&Paint::Gradient(g), canvas.width, canvas.height, bounds)?;
        dest_in(&mut layer, silhouette, false)?;
        over_in_place(&mut canvas.data, &layer.data, glass.highlight, BlendMode::Normal)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/effects.rs"]
mod tests;
