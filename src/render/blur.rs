use rayon::prelude::*;

use crate::foundation::core::Raster;
use crate::foundation::error::{TesseraError, TesseraResult};

/// Gaussian blur where `radius` is the visual blur radius (sigma = radius / 2).
pub fn blur_radius(src: &Raster, radius: f64) -> TesseraResult<Raster> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(TesseraError::render("blur radius must be finite and >= 0"));
    }
    if radius < 0.5 {
        return Ok(src.clone());
    }
    gaussian_blur(src, (radius / 2.0) as f32)
}

/// Separable gaussian blur of premultiplied pixels with a kernel spanning `3 * sigma`.
pub fn gaussian_blur(src: &Raster, sigma: f32) -> TesseraResult<Raster> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(TesseraError::render("blur sigma must be finite and >= 0"));
    }
    if sigma < 0.05 {
        return Ok(src.clone());
    }
    let radius = (sigma * 3.0).ceil() as u32;
    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; src.data.len()];
    let mut dst = vec![0u8; src.data.len()];
    horizontal_blur_q16(&src.data, &mut tmp, src.width, &kernel);
    vertical_blur_q16(&tmp, &mut dst, src.width, src.height, &kernel);
    Raster::from_premul(src.width, src.height, dst)
}

pub(crate) fn gaussian_kernel_q16(radius: u32, sigma: f32) -> TesseraResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(TesseraError::render("blur sigma must be finite and > 0"));
    }

    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(TesseraError::render("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

fn horizontal_blur_q16(src: &[u8], dst: &mut [u8], width: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let stride = width as usize * 4;
    dst.par_chunks_exact_mut(stride)
        .zip(src.par_chunks_exact(stride))
        .for_each(|(out_row, row)| {
            for x in 0..w {
                let mut acc = [0u64; 4];
                for (ki, &kw) in k.iter().enumerate() {
                    let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                    let idx = (sx as usize) * 4;
                    for c in 0..4 {
                        acc[c] += u64::from(kw) * u64::from(row[idx + c]);
                    }
                }
                let o = (x as usize) * 4;
                for c in 0..4 {
                    out_row[o + c] = q16_to_u8(acc[c]);
                }
            }
        });
}

fn vertical_blur_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let h = height as i32;
    let stride = width as usize * 4;
    dst.par_chunks_exact_mut(stride)
        .enumerate()
        .for_each(|(y, out_row)| {
            for x in 0..width as usize {
                let mut acc = [0u64; 4];
                for (ki, &kw) in k.iter().enumerate() {
                    let sy = (y as i32 + ki as i32 - radius).clamp(0, h - 1);
                    let idx = (sy as usize) * stride + x * 4;
                    for c in 0..4 {
                        acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                    }
                }
                for c in 0..4 {
                    out_row[x * 4 + c] = q16_to_u8(acc[c]);
                }
            }
        });
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;
