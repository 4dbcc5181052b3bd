use crate::foundation::core::{Coverage, Raster};
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::foundation::math::mul_div255_u8;
use crate::style::BlendMode;

/// Source-over of equal-length premultiplied buffers with a blend mode and opacity.
pub fn over_in_place(
    dst: &mut [u8],
    src: &[u8],
    opacity: f32,
    blend: BlendMode,
) -> TesseraResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(TesseraError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }

    // Blend dispatch happens once per call; each arm monomorphizes its kernel.
    match blend {
        BlendMode::Normal => {
            premul_over_opacity(dst, src, opacity);
            Ok(())
        }
        BlendMode::Multiply => blend_over(dst, src, opacity, |s, d| s * d),
        BlendMode::Screen => blend_over(dst, src, opacity, |s, d| s + d - s * d),
        BlendMode::Overlay => blend_over(dst, src, opacity, |s, d| {
            if d <= 0.5 {
                2.0 * s * d
            } else {
                1.0 - 2.0 * (1.0 - s) * (1.0 - d)
            }
        }),
        BlendMode::Darken => blend_over(dst, src, opacity, |s, d| s.min(d)),
        BlendMode::Lighten => blend_over(dst, src, opacity, |s, d| s.max(d)),
        BlendMode::ColorDodge => blend_over(dst, src, opacity, |s, d| {
            if s >= 1.0 { 1.0 } else { (d / (1.0 - s)).min(1.0) }
        }),
        BlendMode::ColorBurn => blend_over(dst, src, opacity, |s, d| {
            if s <= 0.0 {
                0.0
            } else {
                1.0 - ((1.0 - d) / s).min(1.0)
            }
        }),
        BlendMode::SoftLight => blend_over(dst, src, opacity, |s, d| {
            if s <= 0.5 {
                d - (1.0 - 2.0 * s) * d * (1.0 - d)
            } else {
                let g = if d <= 0.25 {
                    ((16.0 * d - 12.0) * d + 4.0) * d
                } else {
                    d.sqrt()
                };
                d + (2.0 * s - 1.0) * (g - d)
            }
        }),
        BlendMode::HardLight => blend_over(dst, src, opacity, |s, d| {
            if s <= 0.5 {
                2.0 * s * d
            } else {
                1.0 - 2.0 * (1.0 - s) * (1.0 - d)
            }
        }),
        BlendMode::Difference => blend_over(dst, src, opacity, |s, d| (d - s).abs()),
        BlendMode::Exclusion => blend_over(dst, src, opacity, |s, d| d + s - 2.0 * d * s),
    }
}

fn premul_over_opacity(dst: &mut [u8], src: &[u8], opacity: f32) {
    let op = ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16;
    if op == 0 {
        return;
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = mul_div255_u8(u16::from(s[3]), op);
        if sa == 0 {
            continue;
        }
        let inv = 255u16 - u16::from(sa);
        d[3] = sa.saturating_add(mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            let sc = mul_div255_u8(u16::from(s[c]), op);
            let dc = mul_div255_u8(u16::from(d[c]), inv);
            d[c] = sc.saturating_add(dc);
        }
    }
}

#[inline(always)]
fn blend_over<F>(dst: &mut [u8], src: &[u8], opacity: f32, blend_fn: F) -> TesseraResult<()>
where
    F: Fn(f32, f32) -> f32,
{
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return Ok(());
    }

    let unpremul = |p: f32, a: f32| if a > 0.0 { (p / a).clamp(0.0, 1.0) } else { 0.0 };

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        // out_a = sa + da * (1 - sa)
        // out_p = sp * (1 - da) + dp * (1 - sa) + B(sc, dc) * sa * da
        let sa = (s[3] as f32 / 255.0) * opacity;
        if sa <= 0.0 {
            continue;
        }
        let da = d[3] as f32 / 255.0;
        for c in 0..3 {
            let sp = (s[c] as f32 / 255.0) * opacity;
            let dp = d[c] as f32 / 255.0;
            let b = blend_fn(unpremul(sp, sa), unpremul(dp, da)).clamp(0.0, 1.0);
            let out = (sp * (1.0 - da) + dp * (1.0 - sa) + b * sa * da).clamp(0.0, 1.0);
            d[c] = (out * 255.0).round() as u8;
        }
        d[3] = ((sa + da * (1.0 - sa)).clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    Ok(())
}

/// Composite `src` onto `dst` with its top-left corner at `(left, top)`.
/// Out-of-bounds parts are clipped.
pub fn composite_at(
    dst: &mut Raster,
    src: &Raster,
    left: i64,
    top: i64,
    opacity: f32,
    blend: BlendMode,
) -> TesseraResult<()> {
    let x0 = left.max(0);
    let y0 = top.max(0);
    let x1 = (left + i64::from(src.width)).min(i64::from(dst.width));
    let y1 = (top + i64::from(src.height)).min(i64::from(dst.height));
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }
    let span = ((x1 - x0) as usize) * 4;
    let dst_stride = dst.width as usize * 4;
    let src_stride = src.width as usize * 4;
    for y in y0..y1 {
        let d_off = (y as usize) * dst_stride + (x0 as usize) * 4;
        let s_off = ((y - top) as usize) * src_stride + ((x0 - left) as usize) * 4;
        over_in_place(
            &mut dst.data[d_off..d_off + span],
            &src.data[s_off..s_off + span],
            opacity,
            blend,
        )?;
    }
    Ok(())
}

/// Destination-in: scale every channel by the coverage (optionally inverted).
pub fn dest_in(raster: &mut Raster, coverage: &Coverage, inverted: bool) -> TesseraResult<()> {
    if raster.width != coverage.width || raster.height != coverage.height {
        return Err(TesseraError::render(format!(
            "mask {}x{} does not match raster {}x{}",
            coverage.width, coverage.height, raster.width, raster.height
        )));
    }
    for (px, &m) in raster.data.chunks_exact_mut(4).zip(coverage.data.iter()) {
        let w = u16::from(if inverted { 255 - m } else { m });
        for c in px.iter_mut() {
            *c = mul_div255_u8(u16::from(*c), w);
        }
    }
    Ok(())
}

/// Destination-out: erase where the coverage is set.
pub fn dest_out(raster: &mut Raster, coverage: &Coverage) -> TesseraResult<()> {
    dest_in(raster, coverage, true)
}

/// Per-pixel linear mix `a * (1 - m) + b * m`, writing into `a`.
pub fn mix_by_coverage(a: &mut Raster, b: &Raster, coverage: &Coverage) -> TesseraResult<()> {
    if a.data.len() != b.data.len() || a.width != coverage.width || a.height != coverage.height {
        return Err(TesseraError::render("mix_by_coverage expects equal-size inputs"));
    }
    for ((pa, pb), &m) in a
        .data
        .chunks_exact_mut(4)
        .zip(b.data.chunks_exact(4))
        .zip(coverage.data.iter())
    {
        let m16 = u16::from(m);
        let inv = 255 - m16;
        for c in 0..4 {
            pa[c] = mul_div255_u8(u16::from(pa[c]), inv)
                .saturating_add(mul_div255_u8(u16::from(pb[c]), m16));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
