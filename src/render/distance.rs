//! Euclidean distance transform of coverage masks (Felzenszwalb-Huttenlocher).

use crate::foundation::core::Coverage;

const INF: f64 = 1e20;

/// Per-pixel distance to the nearest pixel where `inside` differs.
///
/// Positive outside the shape, negative inside; pixels count as inside at coverage >= 128.
pub fn signed_distance(cov: &Coverage) -> Vec<f64> {
    let inside: Vec<bool> = cov.data.iter().map(|&v| v >= 128).collect();
    let to_inside = edt(&inside, cov.width as usize, cov.height as usize, true);
    let to_outside = edt(&inside, cov.width as usize, cov.height as usize, false);
    inside
        .iter()
        .zip(to_inside.iter().zip(to_outside.iter()))
        .map(|(&is_in, (&di, &dout))| {
            if is_in {
                -(dout.sqrt() - 0.5)
            } else {
                di.sqrt() - 0.5
            }
        })
        .collect()
}

/// Squared distance to the nearest pixel whose membership equals `target`.
fn edt(inside: &[bool], w: usize, h: usize, target: bool) -> Vec<f64> {
    let mut grid: Vec<f64> = inside
        .iter()
        .map(|&v| if v == target { 0.0 } else { INF })
        .collect();
    let n = w.max(h);
    let mut f = vec![0.0; n];
    let mut d = vec![0.0; n];
    let mut v = vec![0usize; n];
    let mut z = vec![0.0; n + 1];

    for x in 0..w {
        for y in 0..h {
            f[y] = grid[y * w + x];
        }
        edt_1d(&f[..h], &mut d[..h], &mut v, &mut z);
        for y in 0..h {
            grid[y * w + x] = d[y];
        }
    }
    for y in 0..h {
        f[..w].copy_from_slice(&grid[y * w..(y + 1) * w]);
        edt_1d(&f[..w], &mut d[..w], &mut v, &mut z);
        grid[y * w..(y + 1) * w].copy_from_slice(&d[..w]);
    }
    grid
}

fn edt_1d(f: &[f64], d: &mut [f64], v: &mut [usize], z: &mut [f64]) {
    let n = f.len();
    if n == 0 {
        return;
    }
    let meet = |q: usize, p: usize| -> f64 {
        let (qf, pf) = (q as f64, p as f64);
        ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * qf - 2.0 * pf)
    };
    let mut k = 0usize;
    v[0] = 0;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;
    for q in 1..n {
        let mut s = meet(q, v[k]);
        while s <= z[k] {
            k -= 1;
            s = meet(q, v[k]);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }
    k = 0;
    for q in 0..n {
        let qf = q as f64;
        while z[k + 1] < qf {
            k += 1;
        }
        let p = v[k] as f64;
        d[q] = (qf - p) * (qf - p) + f[v[k]];
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/distance.rs"]
mod tests;
