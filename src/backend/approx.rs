use crate::backend::FallbackBackend;
use crate::backend::image_ops::{
    blend_toward, build_lut, gamma, luma_histogram, map_lut, map_straight, normalize,
};
use crate::foundation::color::Color;
use crate::foundation::core::Raster;
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::foundation::math::{SplitMix64, luma_u8, unpremultiply_rgba8_in_place};
use crate::ops::{
    AddNoise, Border, Frame, Level, MotionBlur, NoiseKind, OpTag, Operation, Vignette,
};
use crate::render::blur::gaussian_blur;
use crate::render::composite::composite_at;
use crate::style::BlendMode;

/// Simple in-process stand-ins for operations normally run by the batch backend.
///
/// Results are close in spirit, not pixel-identical; every use is reported as a degradation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxBackend;

impl ApproxBackend {
    pub const APPROXIMATED: &'static [OpTag] = &[
        OpTag::Sepia,
        OpTag::Posterize,
        OpTag::Solarize,
        OpTag::Contrast,
        OpTag::Colorize,
        OpTag::Level,
        OpTag::AutoLevel,
        OpTag::AutoGamma,
        OpTag::Equalize,
        OpTag::Despeckle,
        OpTag::Denoise,
        OpTag::Emboss,
        OpTag::Edge,
        OpTag::Vignette,
        OpTag::Border,
        OpTag::Frame,
        OpTag::Noise,
        OpTag::Roll,
        OpTag::Quantize,
        OpTag::MotionBlur,
    ];
}

impl FallbackBackend for ApproxBackend {
    fn name(&self) -> &str {
        "approx"
    }

    fn approximates(&self, tag: OpTag) -> bool {
        Self::APPROXIMATED.contains(&tag)
    }

    fn apply(&self, raster: Raster, op: &Operation) -> TesseraResult<Raster> {
        match op {
            Operation::Sepia(p) => sepia(&raster, p.threshold),
            Operation::Posterize(p) => posterize(&raster, p.levels),
            Operation::Solarize(p) => {
                let t = p.threshold / 100.0;
                map_lut(&raster, &build_lut(|v| if v > t { 1.0 - v } else { v }))
            }
            Operation::Contrast(p) => {
                let k = (100.0 + p.amount) / 100.0;
                map_lut(&raster, &build_lut(|v| (v - 0.5) * k + 0.5))
            }
            Operation::Colorize(p) => blend_toward(&raster, p),
            Operation::Level(p) => level(&raster, p),
            Operation::AutoLevel => normalize(&raster),
            Operation::AutoGamma => auto_gamma(&raster),
            Operation::Equalize => equalize(&raster),
            Operation::Despeckle => median3(&raster),
            Operation::Denoise(p) => gaussian_blur(&raster, (0.5 + p.threshold / 10.0) as f32),
            Operation::Emboss(_) => emboss(&raster),
            Operation::Edge(_) => edge(&raster),
            Operation::Vignette(p) => vignette(&raster, p),
            Operation::Border(p) => border(&raster, p),
            Operation::Frame(p) => frame(&raster, p),
            Operation::Noise(p) => add_noise(&raster, p),
            Operation::Roll(p) => Ok(roll(&raster, p.x, p.y)),
            Operation::Quantize(p) => {
                let levels = (f64::from(p.colors).cbrt().round() as u32).max(2);
                posterize(&raster, levels)
            }
            Operation::MotionBlur(p) => motion_blur(&raster, p),
            other => Err(TesseraError::capability(other.tag().as_str())),
        }
    }
}

fn sepia(raster: &Raster, threshold: f64) -> TesseraResult<Raster> {
    let k = (threshold / 100.0).clamp(0.0, 1.0);
    map_straight(raster, |[r, g, b, a]| {
        let (fr, fg, fb) = (f64::from(r), f64::from(g), f64::from(b));
        let tone = [
            0.393 * fr + 0.769 * fg + 0.189 * fb,
            0.349 * fr + 0.686 * fg + 0.168 * fb,
            0.272 * fr + 0.534 * fg + 0.131 * fb,
        ];
        let mix = |orig: f64, t: f64| (orig * (1.0 - k) + t * k).round().clamp(0.0, 255.0) as u8;
        [mix(fr, tone[0]), mix(fg, tone[1]), mix(fb, tone[2]), a]
    })
}

fn posterize(raster: &Raster, levels: u32) -> TesseraResult<Raster> {
    let n = f64::from(levels.max(2) - 1);
    map_lut(raster, &build_lut(|v| (v * n).round() / n))
}

fn level(raster: &Raster, p: &Level) -> TesseraResult<Raster> {
    let (lo, hi) = (p.black / 100.0, p.white / 100.0);
    map_lut(
        raster,
        &build_lut(|v| ((v - lo) / (hi - lo)).clamp(0.0, 1.0).powf(1.0 / p.gamma)),
    )
}

/// Gamma that moves the mean luma to the midpoint.
fn auto_gamma(raster: &Raster) -> TesseraResult<Raster> {
    let (hist, total) = luma_histogram(raster);
    if total == 0 {
        return Ok(raster.clone());
    }
    let sum: f64 = hist.iter().enumerate().map(|(i, &n)| i as f64 * n as f64).sum();
    let mean = sum / total as f64 / 255.0;
    if mean <= 0.0 || mean >= 1.0 {
        return Ok(raster.clone());
    }
    gamma(raster, mean.ln() / 0.5f64.ln())
}

fn equalize(raster: &Raster) -> TesseraResult<Raster> {
    let (hist, total) = luma_histogram(raster);
    if total == 0 {
        return Ok(raster.clone());
    }
    let mut lut = [0u8; 256];
    let mut acc = 0u64;
    for (i, slot) in lut.iter_mut().enumerate() {
        acc += hist[i];
        *slot = ((acc as f64 / total as f64) * 255.0).round() as u8;
    }
    map_lut(raster, &lut)
}

fn straight_copy(raster: &Raster) -> Vec<u8> {
    let mut data = raster.data.clone();
    unpremultiply_rgba8_in_place(&mut data);
    data
}

fn clamped(raster: &Raster, x: i64, y: i64) -> usize {
    let x = x.clamp(0, i64::from(raster.width) - 1) as usize;
    let y = y.clamp(0, i64::from(raster.height) - 1) as usize;
    (y * raster.width as usize + x) * 4
}

fn median3(raster: &Raster) -> TesseraResult<Raster> {
    let src = straight_copy(raster);
    let mut out = src.clone();
    for y in 0..i64::from(raster.height) {
        for x in 0..i64::from(raster.width) {
            let at = clamped(raster, x, y);
            for c in 0..4 {
                let mut window = [0u8; 9];
                let mut k = 0;
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        window[k] = src[clamped(raster, x + dx, y + dy) + c];
                        k += 1;
                    }
                }
                window.sort_unstable();
                out[at + c] = window[4];
            }
        }
    }
    Raster::from_straight(raster.width, raster.height, out)
}

/// 3x3 convolution over luma producing a grey image; alpha is kept.
fn convolve_luma(raster: &Raster, f: impl Fn(&[[f64; 3]; 3]) -> f64) -> TesseraResult<Raster> {
    let src = straight_copy(raster);
    let luma: Vec<f64> = src
        .chunks_exact(4)
        .map(|px| f64::from(luma_u8(px[0], px[1], px[2])))
        .collect();
    let mut out = src.clone();
    for y in 0..i64::from(raster.height) {
        for x in 0..i64::from(raster.width) {
            let mut win = [[0.0; 3]; 3];
            for (j, row) in win.iter_mut().enumerate() {
                for (i, v) in row.iter_mut().enumerate() {
                    *v = luma[clamped(raster, x + i as i64 - 1, y + j as i64 - 1) / 4];
                }
            }
            let v = f(&win).round().clamp(0.0, 255.0) as u8;
            let at = clamped(raster, x, y);
            out[at..at + 3].fill(v);
        }
    }
    Raster::from_straight(raster.width, raster.height, out)
}

fn emboss(raster: &Raster) -> TesseraResult<Raster> {
    const K: [[f64; 3]; 3] = [[-2.0, -1.0, 0.0], [-1.0, 1.0, 1.0], [0.0, 1.0, 2.0]];
    convolve_luma(raster, |w| {
        let mut acc = 0.0;
        for j in 0..3 {
            for i in 0..3 {
                acc += w[j][i] * K[j][i];
            }
        }
        acc * 0.5 + 64.0
    })
}

/// Sobel gradient magnitude.
fn edge(raster: &Raster) -> TesseraResult<Raster> {
    convolve_luma(raster, |w| {
        let gx = (w[0][2] + 2.0 * w[1][2] + w[2][2]) - (w[0][0] + 2.0 * w[1][0] + w[2][0]);
        let gy = (w[2][0] + 2.0 * w[2][1] + w[2][2]) - (w[0][0] + 2.0 * w[0][1] + w[0][2]);
        (gx * gx + gy * gy).sqrt()
    })
}

fn vignette(raster: &Raster, p: &Vignette) -> TesseraResult<Raster> {
    let (w, h) = (f64::from(raster.width), f64::from(raster.height));
    let rx = (w / 2.0 - p.radius).max(1.0);
    let ry = (h / 2.0 - p.radius).max(1.0);
    let inner = 1.0 - (p.sigma / (w.min(h) / 2.0)).clamp(0.05, 1.0);
    let color = p.color.to_straight();
    let mut data = straight_copy(raster);
    for y in 0..raster.height {
        for x in 0..raster.width {
            let dx = (f64::from(x) + 0.5 - w / 2.0) / rx;
            let dy = (f64::from(y) + 0.5 - h / 2.0) / ry;
            let d = (dx * dx + dy * dy).sqrt();
            let t = ((d - inner) / (1.0 - inner).max(1e-6)).clamp(0.0, 1.0);
            if t == 0.0 {
                continue;
            }
            let at = ((y as usize) * raster.width as usize + x as usize) * 4;
            for c in 0..3 {
                let v = f64::from(data[at + c]) * (1.0 - t) + f64::from(color[c]) * t;
                data[at + c] = v.round() as u8;
            }
        }
    }
    Raster::from_straight(raster.width, raster.height, data)
}

fn padded(raster: &Raster, width: u32, color: Color) -> TesseraResult<Raster> {
    let grow = width
        .checked_mul(2)
        .ok_or_else(|| TesseraError::render("border width overflow"))?;
    let out_w = raster
        .width
        .checked_add(grow)
        .ok_or_else(|| TesseraError::render("border width overflow"))?;
    let out_h = raster
        .height
        .checked_add(grow)
        .ok_or_else(|| TesseraError::render("border width overflow"))?;
    let mut canvas = Raster::filled(out_w, out_h, color.to_premul())?;
    composite_at(
        &mut canvas,
        raster,
        i64::from(width),
        i64::from(width),
        1.0,
        BlendMode::Normal,
    )?;
    Ok(canvas)
}

fn border(raster: &Raster, p: &Border) -> TesseraResult<Raster> {
    padded(raster, p.width, p.color)
}

/// Border with a raised outer bevel and a sunken inner bevel.
fn frame(raster: &Raster, p: &Frame) -> TesseraResult<Raster> {
    let mut out = padded(raster, p.width, p.color)?;
    let (w, h) = (i64::from(out.width), i64::from(out.height));
    let fw = i64::from(p.width);
    let (outer, inner) = (i64::from(p.outer_bevel), i64::from(p.inner_bevel));
    let shade = |px: &mut [u8], light: bool| {
        let target = if light { 255u16 } else { 0u16 };
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            let t = target * a / 255;
            *c = ((u16::from(*c) + t) / 2) as u8;
        }
    };
    for y in 0..h {
        for x in 0..w {
            let to_outer = x.min(y).min(w - 1 - x).min(h - 1 - y);
            if to_outer >= fw {
                continue;
            }
            let at = ((y * w + x) * 4) as usize;
            let px = &mut out.data[at..at + 4];
            if to_outer < outer {
                let light = x.min(y) == to_outer;
                shade(px, light);
            } else if to_outer >= fw - inner {
                let light = x.min(y) != to_outer;
                shade(px, light);
            }
        }
    }
    Ok(out)
}

fn add_noise(raster: &Raster, p: &AddNoise) -> TesseraResult<Raster> {
    let mut rng = SplitMix64::new(p.seed);
    let mut data = straight_copy(raster);
    let amp = 32.0 * p.attenuate;
    for px in data.chunks_exact_mut(4) {
        if px[3] == 0 {
            continue;
        }
        match p.kind {
            NoiseKind::Impulse => {
                if f64::from(rng.next_f32()) < 0.05 * p.attenuate {
                    let v = if rng.next_u8() & 1 == 0 { 0 } else { 255 };
                    px[..3].fill(v);
                }
            }
            _ => {
                for c in &mut px[..3] {
                    let n = (f64::from(rng.next_f32()) - 0.5) * 2.0 * amp;
                    *c = (f64::from(*c) + n).round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    }
    Raster::from_straight(raster.width, raster.height, data)
}

/// Wrap-around shift by `(dx, dy)`.
fn roll(raster: &Raster, dx: i64, dy: i64) -> Raster {
    let (w, h) = (i64::from(raster.width), i64::from(raster.height));
    let mut out = raster.clone();
    for y in 0..h {
        for x in 0..w {
            let src = ((y * w + x) * 4) as usize;
            let tx = (x + dx).rem_euclid(w);
            let ty = (y + dy).rem_euclid(h);
            let dst = ((ty * w + tx) * 4) as usize;
            out.data[dst..dst + 4].copy_from_slice(&raster.data[src..src + 4]);
        }
    }
    out
}

/// Gaussian-weighted average along the blur direction.
fn motion_blur(raster: &Raster, p: &MotionBlur) -> TesseraResult<Raster> {
    let reach = if p.radius > 0.0 { p.radius } else { (p.sigma * 3.0).ceil() };
    let reach = reach.clamp(1.0, 256.0) as i64;
    let sigma = p.sigma.max(0.5);
    let (sin, cos) = p.angle.to_radians().sin_cos();
    let taps: Vec<(i64, i64, f64)> = (0..=reach)
        .map(|k| {
            let k = k as f64;
            (
                (k * cos).round() as i64,
                (k * sin).round() as i64,
                (-(k * k) / (2.0 * sigma * sigma)).exp(),
            )
        })
        .collect();
    let total: f64 = taps.iter().map(|t| t.2).sum();
    let mut out = raster.clone();
    for y in 0..i64::from(raster.height) {
        for x in 0..i64::from(raster.width) {
            let mut acc = [0.0f64; 4];
            for &(ox, oy, wgt) in &taps {
                let at = clamped(raster, x - ox, y - oy);
                for c in 0..4 {
                    acc[c] += f64::from(raster.data[at + c]) * wgt;
                }
            }
            let at = clamped(raster, x, y);
            for c in 0..4 {
                out.data[at + c] = (acc[c] / total).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/backend/approx.rs"]
mod tests;
