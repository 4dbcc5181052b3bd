use image::imageops;

use crate::backend::RasterBackend;
use crate::foundation::color::Color;
use crate::foundation::core::Raster;
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::foundation::math::{luma_u8, unpremultiply_rgba8_in_place};
use crate::layout::placement::resolve;
use crate::ops::{
    ColorAmount, Crop, Fit, LinearStretch, OpTag, Operation, Resize, Rotate, apply_region_blur,
};
use crate::render::blur::gaussian_blur;
use crate::render::composite::composite_at;
use crate::style::BlendMode;

/// In-process raster backend built on the `image` crate and crate-local kernels.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageBackend;

impl ImageBackend {
    pub const SUPPORTED: &'static [OpTag] = &[
        OpTag::Crop,
        OpTag::Resize,
        OpTag::Rotate,
        OpTag::Flip,
        OpTag::Flop,
        OpTag::Grayscale,
        OpTag::Negate,
        OpTag::Normalize,
        OpTag::Gamma,
        OpTag::LinearStretch,
        OpTag::Threshold,
        OpTag::Tint,
        OpTag::Blur,
        OpTag::Sharpen,
        OpTag::RegionBlur,
    ];
}

impl RasterBackend for ImageBackend {
    fn name(&self) -> &str {
        "image"
    }

    fn supports(&self, tag: OpTag) -> bool {
        Self::SUPPORTED.contains(&tag)
    }

    fn apply(&self, raster: Raster, op: &Operation) -> TesseraResult<Raster> {
        match op {
            Operation::Crop(p) => crop(&raster, p),
            Operation::Resize(p) => resize(raster, p),
            Operation::Rotate(p) => rotate(&raster, p),
            Operation::Flip => {
                Raster::from_premul_image(imageops::flip_vertical(&raster.premul_image()))
            }
            Operation::Flop => {
                Raster::from_premul_image(imageops::flip_horizontal(&raster.premul_image()))
            }
            Operation::Grayscale => Ok(grayscale(raster)),
            Operation::Negate => Ok(negate(raster)),
            Operation::Normalize => normalize(&raster),
            Operation::Gamma(p) => gamma(&raster, p.value),
            Operation::LinearStretch(p) => linear_stretch(&raster, p),
            Operation::Threshold(p) => threshold(&raster, p.percent),
            Operation::Tint(p) => blend_toward(&raster, p),
            Operation::Blur(p) => gaussian_blur(&raster, p.sigma as f32),
            Operation::Sharpen(p) => sharpen(&raster, p.sigma),
            Operation::RegionBlur(p) => apply_region_blur(&raster, p),
            other => Err(TesseraError::capability(other.tag().as_str())),
        }
    }
}

/// Apply `f` to every pixel in straight-alpha space.
pub(crate) fn map_straight(
    raster: &Raster,
    f: impl Fn([u8; 4]) -> [u8; 4],
) -> TesseraResult<Raster> {
    let mut data = raster.data.clone();
    unpremultiply_rgba8_in_place(&mut data);
    for px in data.chunks_exact_mut(4) {
        let out = f([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&out);
    }
    Raster::from_straight(raster.width, raster.height, data)
}

/// Remap straight RGB channels through a lookup table; alpha is kept.
pub(crate) fn map_lut(raster: &Raster, lut: &[u8; 256]) -> TesseraResult<Raster> {
    map_straight(raster, |[r, g, b, a]| {
        [lut[r as usize], lut[g as usize], lut[b as usize], a]
    })
}

pub(crate) fn build_lut(f: impl Fn(f64) -> f64) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, v) in lut.iter_mut().enumerate() {
        *v = (f(i as f64 / 255.0).clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    lut
}

/// Luma histogram of the visible pixels (straight colors).
pub(crate) fn luma_histogram(raster: &Raster) -> ([u64; 256], u64) {
    let mut data = raster.data.clone();
    unpremultiply_rgba8_in_place(&mut data);
    let mut hist = [0u64; 256];
    let mut total = 0u64;
    for px in data.chunks_exact(4) {
        if px[3] == 0 {
            continue;
        }
        hist[luma_u8(px[0], px[1], px[2]) as usize] += 1;
        total += 1;
    }
    (hist, total)
}

fn crop(raster: &Raster, p: &Crop) -> TesseraResult<Raster> {
    let (w, h) = (f64::from(raster.width), f64::from(raster.height));
    let x = resolve(p.x, w)?;
    let y = resolve(p.y, h)?;
    let x1 = (x + resolve(p.width, w)?).min(i64::from(raster.width));
    let y1 = (y + resolve(p.height, h)?).min(i64::from(raster.height));
    let (x0, y0) = (x.max(0), y.max(0));
    if x1 <= x0 || y1 <= y0 {
        return Err(TesseraError::resolution(format!(
            "crop region does not intersect the {}x{} image",
            raster.width, raster.height
        )));
    }
    let sub = imageops::crop_imm(
        &raster.premul_image(),
        x0 as u32,
        y0 as u32,
        (x1 - x0) as u32,
        (y1 - y0) as u32,
    )
    .to_image();
    Raster::from_premul_image(sub)
}

fn dim(v: f64) -> u32 {
    v.round().clamp(1.0, f64::from(u32::MAX)) as u32
}

fn resize(raster: Raster, p: &Resize) -> TesseraResult<Raster> {
    let (sw, sh) = (f64::from(raster.width), f64::from(raster.height));
    let filter = p.filter.image_filter();
    let (tw, th) = match (p.width, p.height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => return raster.resized(w, dim(sh * f64::from(w) / sw), filter),
        (None, Some(h)) => return raster.resized(dim(sw * f64::from(h) / sh), h, filter),
        (None, None) => {
            return Err(TesseraError::validation("resize", "width or height is required"));
        }
    };
    let (fw, fh) = (f64::from(tw), f64::from(th));
    match p.fit {
        Fit::Fill => raster.resized(tw, th, filter),
        Fit::Inside => {
            let s = (fw / sw).min(fh / sh);
            raster.resized(dim(sw * s), dim(sh * s), filter)
        }
        Fit::Cover => {
            let s = (fw / sw).max(fh / sh);
            let scaled = raster.resized(dim(sw * s).max(tw), dim(sh * s).max(th), filter)?;
            let x = (scaled.width - tw) / 2;
            let y = (scaled.height - th) / 2;
            let img = scaled.premul_image();
            Raster::from_premul_image(imageops::crop_imm(&img, x, y, tw, th).to_image())
        }
        Fit::Contain => {
            let s = (fw / sw).min(fh / sh);
            let scaled = raster.resized(dim(sw * s).min(tw), dim(sh * s).min(th), filter)?;
            let mut canvas = Raster::filled(tw, th, p.background.to_premul())?;
            let left = i64::from((tw - scaled.width) / 2);
            let top = i64::from((th - scaled.height) / 2);
            composite_at(&mut canvas, &scaled, left, top, 1.0, BlendMode::Normal)?;
            Ok(canvas)
        }
    }
}

fn rotate(raster: &Raster, p: &Rotate) -> TesseraResult<Raster> {
    let deg = p.degrees.rem_euclid(360.0);
    let near = |t: f64| (deg - t).abs() < 1e-9;
    if near(0.0) || near(360.0) {
        return Ok(raster.clone());
    }
    let img = raster.premul_image();
    if near(90.0) {
        return Raster::from_premul_image(imageops::rotate90(&img));
    }
    if near(180.0) {
        return Raster::from_premul_image(imageops::rotate180(&img));
    }
    if near(270.0) {
        return Raster::from_premul_image(imageops::rotate270(&img));
    }
    rotate_bilinear(raster, deg.to_radians(), p.background)
}

/// Clockwise rotation onto a canvas grown to the rotated bounds.
fn rotate_bilinear(raster: &Raster, theta: f64, background: Color) -> TesseraResult<Raster> {
    let (sw, sh) = (f64::from(raster.width), f64::from(raster.height));
    let (sin, cos) = theta.sin_cos();
    let out_w = (sw * cos.abs() + sh * sin.abs() - 1e-6).ceil().max(1.0) as u32;
    let out_h = (sw * sin.abs() + sh * cos.abs() - 1e-6).ceil().max(1.0) as u32;
    let bg = background.to_premul();
    let mut out = Raster::filled(out_w, out_h, bg)?;

    let (scx, scy) = (sw / 2.0, sh / 2.0);
    let (dcx, dcy) = (f64::from(out_w) / 2.0, f64::from(out_h) / 2.0);
    let sample = |x: i64, y: i64| -> [u8; 4] {
        if x < 0 || y < 0 || x >= i64::from(raster.width) || y >= i64::from(raster.height) {
            bg
        } else {
            raster.pixel(x as u32, y as u32)
        }
    };

    for dy in 0..out_h {
        for dx in 0..out_w {
            let rx = f64::from(dx) + 0.5 - dcx;
            let ry = f64::from(dy) + 0.5 - dcy;
            let sx = rx * cos + ry * sin + scx - 0.5;
            let sy = -rx * sin + ry * cos + scy - 0.5;
            let (x0, y0) = (sx.floor(), sy.floor());
            let (fx, fy) = (sx - x0, sy - y0);
            let (x0, y0) = (x0 as i64, y0 as i64);
            let p00 = sample(x0, y0);
            let p10 = sample(x0 + 1, y0);
            let p01 = sample(x0, y0 + 1);
            let p11 = sample(x0 + 1, y0 + 1);
            let idx = ((dy as usize) * (out_w as usize) + dx as usize) * 4;
            for c in 0..4 {
                let top = f64::from(p00[c]) * (1.0 - fx) + f64::from(p10[c]) * fx;
                let bottom = f64::from(p01[c]) * (1.0 - fx) + f64::from(p11[c]) * fx;
                let v = top * (1.0 - fy) + bottom * fy;
                out.data[idx + c] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    Ok(out)
}

/// Luma is linear, so it can be taken directly on premultiplied channels.
fn grayscale(mut raster: Raster) -> Raster {
    for px in raster.data.chunks_exact_mut(4) {
        let l = luma_u8(px[0], px[1], px[2]);
        px[0] = l;
        px[1] = l;
        px[2] = l;
    }
    raster
}

fn negate(mut raster: Raster) -> Raster {
    for px in raster.data.chunks_exact_mut(4) {
        let a = px[3];
        for c in &mut px[..3] {
            *c = a.saturating_sub(*c);
        }
    }
    raster
}

/// Stretch the visible channel range to the full `0..=255`.
pub(crate) fn normalize(raster: &Raster) -> TesseraResult<Raster> {
    let mut data = raster.data.clone();
    unpremultiply_rgba8_in_place(&mut data);
    let (mut lo, mut hi) = (255u8, 0u8);
    for px in data.chunks_exact(4).filter(|px| px[3] > 0) {
        for &c in &px[..3] {
            lo = lo.min(c);
            hi = hi.max(c);
        }
    }
    if hi <= lo {
        return Ok(raster.clone());
    }
    let (lo, hi) = (f64::from(lo) / 255.0, f64::from(hi) / 255.0);
    map_lut(raster, &build_lut(|v| (v - lo) / (hi - lo)))
}

pub(crate) fn gamma(raster: &Raster, value: f64) -> TesseraResult<Raster> {
    if !(value.is_finite() && value > 0.0) {
        return Err(TesseraError::validation("gamma", "gamma must be > 0"));
    }
    map_lut(raster, &build_lut(|v| v.powf(1.0 / value)))
}

fn linear_stretch(raster: &Raster, p: &LinearStretch) -> TesseraResult<Raster> {
    let (hist, total) = luma_histogram(raster);
    if total == 0 {
        return Ok(raster.clone());
    }
    let black_count = (p.black / 100.0 * total as f64).round() as u64;
    let white_count = (p.white / 100.0 * total as f64).round() as u64;

    let mut acc = 0u64;
    let mut lo = 0usize;
    for (i, &n) in hist.iter().enumerate() {
        acc += n;
        if acc > black_count {
            lo = i;
            break;
        }
    }
    acc = 0;
    let mut hi = 255usize;
    for (i, &n) in hist.iter().enumerate().rev() {
        acc += n;
        if acc > white_count {
            hi = i;
            break;
        }
    }
    if hi <= lo {
        return Ok(raster.clone());
    }
    let (lo, hi) = (lo as f64 / 255.0, hi as f64 / 255.0);
    map_lut(raster, &build_lut(|v| (v - lo) / (hi - lo)))
}

fn threshold(raster: &Raster, percent: f64) -> TesseraResult<Raster> {
    let cut = percent / 100.0 * 255.0;
    map_straight(raster, |[r, g, b, a]| {
        let v = if f64::from(luma_u8(r, g, b)) > cut { 255 } else { 0 };
        [v, v, v, a]
    })
}

/// Straight-space mix toward a color by `amount` percent (scaled by the color's alpha).
pub(crate) fn blend_toward(raster: &Raster, p: &ColorAmount) -> TesseraResult<Raster> {
    let t = (p.amount / 100.0 * f64::from(p.color.a)).clamp(0.0, 1.0);
    let target = [p.color.r, p.color.g, p.color.b];
    map_straight(raster, |[r, g, b, a]| {
        let mix = |c: u8, k: u8| (f64::from(c) * (1.0 - t) + f64::from(k) * t).round() as u8;
        [mix(r, target[0]), mix(g, target[1]), mix(b, target[2]), a]
    })
}

/// Unsharp mask with unit amount.
fn sharpen(raster: &Raster, sigma: f64) -> TesseraResult<Raster> {
    let blurred = gaussian_blur(raster, sigma as f32)?;
    let mut out = raster.clone();
    for (px, bl) in out.data.chunks_exact_mut(4).zip(blurred.data.chunks_exact(4)) {
        let a = i32::from(px[3]);
        for c in 0..3 {
            let v = 2 * i32::from(px[c]) - i32::from(bl[c]);
            px[c] = v.clamp(0, a) as u8;
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/backend/image_ops.rs"]
mod tests;
