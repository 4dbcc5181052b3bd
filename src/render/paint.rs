use kurbo::Rect;

use crate::foundation::color::{Gradient, GradientKind, Paint};
use crate::foundation::core::Raster;
use crate::foundation::error::TesseraResult;

/// Raster of `width x height` painted with `paint`; gradients span `bounds`.
pub fn paint_raster(paint: &Paint, width: u32, height: u32, bounds: Rect) -> TesseraResult<Raster> {
    match paint {
        Paint::Solid(c) => Raster::filled(width, height, c.to_premul()),
        Paint::Gradient(g) => gradient_raster(g, width, height, bounds),
    }
}

fn gradient_raster(g: &Gradient, width: u32, height: u32, bounds: Rect) -> TesseraResult<Raster> {
    let mut out = Raster::new(width, height)?;
    let (bw, bh) = (bounds.width().max(1.0), bounds.height().max(1.0));
    let center = bounds.center();
    let param: Box<dyn Fn(f64, f64) -> f64> = match g.kind {
        GradientKind::Linear { angle_deg } => {
            let a = angle_deg.to_radians();
            let (dx, dy) = (a.sin(), -a.cos());
            let len = (bw * dx.abs() + bh * dy.abs()).max(1.0);
            Box::new(move |x, y| ((x - center.x) * dx + (y - center.y) * dy) / len + 0.5)
        }
        GradientKind::Radial { cx, cy, radius } => {
            let (ox, oy) = (bounds.x0 + cx * bw, bounds.y0 + cy * bh);
            let r = (radius * bw.max(bh)).max(1e-6);
            Box::new(move |x, y| ((x - ox).hypot(y - oy)) / r)
        }
    };
    for (i, px) in out.data.chunks_exact_mut(4).enumerate() {
        let x = (i % width as usize) as f64 + 0.5;
        let y = (i / width as usize) as f64 + 0.5;
        px.copy_from_slice(&g.sample_premul(param(x, y)));
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/paint.rs"]
mod tests;
