//! Table-driven O(n²) real DFT in the packed half-complex layout.
//!
//! Slow but exact enough to serve as the oracle every FFT backend is
//! compared against.

use std::f64::consts::TAU;

use crate::layouts::{Direction, FftPlanInfo};

/// Twiddles `cos(2πm/n)` and `sin(2πm/n)` for `m` in `[0, n)`.
#[derive(Debug, Clone)]
pub struct DftTable {
    length: usize,
    cos: Vec<f64>,
    sin: Vec<f64>,
}

impl DftTable {
    pub fn new(length: usize) -> Self {
        let (cos, sin): (Vec<f64>, Vec<f64>) = (0..length)
            .map(|m| {
                let theta: f64 = TAU * (m as f64) / (length as f64);
                (theta.cos(), theta.sin())
            })
            .unzip();
        Self { length, cos, sin }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    #[inline(always)]
    fn twiddle(&self, j: usize, k: usize) -> (f64, f64) {
        let m: usize = (j * k) % self.length;
        (self.cos[m], self.sin[m])
    }
}

/// Number of complex bins with a stored imaginary part.
#[inline(always)]
pub fn n_imag(length: usize) -> usize {
    (length + 1) / 2 - 1
}

/// Forward real DFT of `src` into packed `dst`, scaled by `scale`.
pub fn r2hc_ref(table: &DftTable, scale: f64, src: &[f64], dst: &mut [f64]) {
    let n: usize = table.length();
    debug_assert_eq!(src.len(), n);
    debug_assert_eq!(dst.len(), n);

    for k in 0..=n / 2 {
        let mut re: f64 = 0.0;
        let mut im: f64 = 0.0;
        for (j, x) in src.iter().enumerate() {
            let (c, s) = table.twiddle(j, k);
            re += x * c;
            im -= x * s;
        }
        dst[k] = re * scale;
        if k > 0 && k <= n_imag(n) {
            dst[n - k] = im * scale;
        }
    }
}

/// Backward real DFT of packed `src` into `dst`, scaled by `scale`.
///
/// Unnormalized: with `scale = 1` this is `n` times the inverse of
/// [`r2hc_ref`].
pub fn hc2r_ref(table: &DftTable, scale: f64, src: &[f64], dst: &mut [f64]) {
    let n: usize = table.length();
    debug_assert_eq!(src.len(), n);
    debug_assert_eq!(dst.len(), n);

    let half: usize = n_imag(n);
    for (j, x) in dst.iter_mut().enumerate() {
        let mut acc: f64 = src[0];
        for k in 1..=half {
            let (c, s) = table.twiddle(j, k);
            acc += 2.0 * (src[k] * c - src[n - k] * s);
        }
        if n.is_multiple_of(2) {
            let (c, _) = table.twiddle(j, n / 2);
            acc += src[n / 2] * c;
        }
        *x = acc * scale;
    }
}

/// Executes a plan over all batches with the reference transform.
pub fn fft_exec_ref(info: &FftPlanInfo, table: &DftTable, tdata: &mut [f64], fdata: &mut [f64]) {
    let n: usize = info.length;
    match info.direction {
        Direction::Forward => tdata
            .chunks_exact(n)
            .zip(fdata.chunks_exact_mut(n))
            .for_each(|(t, f)| r2hc_ref(table, info.scale, t, f)),
        Direction::Backward => fdata
            .chunks_exact(n)
            .zip(tdata.chunks_exact_mut(n))
            .for_each(|(f, t)| hc2r_ref(table, info.scale, f, t)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_is_flat() {
        for n in [1usize, 2, 5, 8] {
            let table: DftTable = DftTable::new(n);
            let mut x: Vec<f64> = vec![0.0; n];
            x[0] = 1.0;
            let mut f: Vec<f64> = vec![0.0; n];
            r2hc_ref(&table, 1.0, &x, &mut f);
            for k in 0..=n / 2 {
                assert!((f[k] - 1.0).abs() < 1e-15, "n={n} k={k}: {f:?}");
            }
            for k in n / 2 + 1..n {
                assert!(f[k].abs() < 1e-15, "n={n} k={k}: {f:?}");
            }
        }
    }

    #[test]
    fn cosine_and_sine_bins() {
        let n: usize = 16;
        let table: DftTable = DftTable::new(n);
        let x: Vec<f64> = (0..n)
            .map(|j| {
                let t: f64 = TAU * j as f64 / n as f64;
                (3.0 * t).cos() + 2.0 * (5.0 * t).sin()
            })
            .collect();
        let mut f: Vec<f64> = vec![0.0; n];
        r2hc_ref(&table, 1.0, &x, &mut f);

        // cos at bin 3 gives Re X3 = n/2, sin at bin 5 gives Im X5 = -n.
        for (i, v) in f.iter().enumerate() {
            let expected: f64 = match i {
                3 => 8.0,
                11 => -16.0,
                _ => 0.0,
            };
            assert!((v - expected).abs() < 1e-12, "bin {i}: {v} != {expected}");
        }
    }

    #[test]
    fn backward_inverts_forward() {
        for n in [1usize, 2, 3, 7, 16, 31] {
            let table: DftTable = DftTable::new(n);
            let x: Vec<f64> = (0..n).map(|j| (j as f64 * 0.37).sin() + 0.1 * j as f64).collect();
            let mut f: Vec<f64> = vec![0.0; n];
            let mut y: Vec<f64> = vec![0.0; n];
            r2hc_ref(&table, 1.0, &x, &mut f);
            hc2r_ref(&table, 1.0 / n as f64, &f, &mut y);
            x.iter()
                .zip(&y)
                .for_each(|(a, b)| assert!((a - b).abs() < 1e-12, "n={n}: {x:?} != {y:?}"));
        }
    }
}
