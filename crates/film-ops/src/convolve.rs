//! Spatial and FFT convolution of a [`Plane`] with a [`Kernel`].
//!
//! Both paths compute the same thing: a correlation with the kernel where
//! samples outside the plane repeat the nearest edge pixel. The FFT path pads
//! the plane by the kernel radius with replicated edges, so its linear
//! convolution matches the spatial result to float precision.
//!
//! Use [`ConvolutionEngine::convolve`](crate::ConvolutionEngine::convolve)
//! to pick a path by kernel size; the functions here are public so the two
//! can be checked against each other.

use std::sync::Arc;

use rayon::prelude::*;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use tracing::trace;

use film_core::Plane;

use crate::{Kernel, OpsError, OpsResult};

/// Direct convolution, row-parallel, clamp-to-edge.
///
/// Separable kernels run as two 1-D passes.
pub fn convolve_spatial(src: &Plane, kernel: &Kernel) -> OpsResult<Plane> {
    check_plane(src)?;
    let (w, h) = src.dimensions();
    let data = match kernel.profile() {
        Some(profile) => {
            let tmp = horizontal_pass(src.data(), w, h, profile);
            vertical_pass(&tmp, w, h, profile)
        }
        None => direct_2d(src.data(), w, h, kernel),
    };
    Ok(Plane::from_vec(w, h, data)?)
}

fn check_plane(src: &Plane) -> OpsResult<()> {
    if src.is_empty() {
        return Err(OpsError::InvalidParameter("cannot convolve an empty plane".into()));
    }
    Ok(())
}

#[inline]
fn clamp_index(i: isize, n: usize) -> usize {
    i.clamp(0, n as isize - 1) as usize
}

fn horizontal_pass(src: &[f32], w: usize, h: usize, taps: &[f32]) -> Vec<f32> {
    let r = (taps.len() / 2) as isize;
    let mut dst = vec![0.0f32; w * h];
    dst.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        let line = &src[y * w..(y + 1) * w];
        for (x, out) in row.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (i, &k) in taps.iter().enumerate() {
                acc += k * line[clamp_index(x as isize + i as isize - r, w)];
            }
            *out = acc;
        }
    });
    dst
}

fn vertical_pass(src: &[f32], w: usize, h: usize, taps: &[f32]) -> Vec<f32> {
    let r = (taps.len() / 2) as isize;
    let mut dst = vec![0.0f32; w * h];
    dst.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (i, &k) in taps.iter().enumerate() {
            let sy = clamp_index(y as isize + i as isize - r, h);
            let line = &src[sy * w..(sy + 1) * w];
            for (out, &v) in row.iter_mut().zip(line) {
                *out += k * v;
            }
        }
    });
    dst
}

fn direct_2d(src: &[f32], w: usize, h: usize, kernel: &Kernel) -> Vec<f32> {
    let size = kernel.size();
    let r = kernel.radius() as isize;
    let weights = kernel.data();
    let mut dst = vec![0.0f32; w * h];
    dst.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for ky in 0..size {
            let sy = clamp_index(y as isize + ky as isize - r, h);
            let line = &src[sy * w..(sy + 1) * w];
            let krow = &weights[ky * size..(ky + 1) * size];
            for (x, out) in row.iter_mut().enumerate() {
                let mut acc = 0.0f32;
                for (kx, &k) in krow.iter().enumerate() {
                    if k != 0.0 {
                        acc += k * line[clamp_index(x as isize + kx as isize - r, w)];
                    }
                }
                *out += acc;
            }
        }
    });
    dst
}

/// FFT convolution with edge-replicated padding.
///
/// The plane is padded by the kernel radius on every side, transformed with
/// `rustfft` at a 5-smooth size large enough to avoid wrap-around, multiplied
/// by the kernel spectrum and transformed back.
pub fn convolve_fft(src: &Plane, kernel: &Kernel) -> OpsResult<Plane> {
    check_plane(src)?;
    let (w, h) = src.dimensions();
    let r = kernel.radius();
    let pw = w + 2 * r;
    let ph = h + 2 * r;
    let fw = fft_len(pw);
    let fh = fft_len(ph);
    trace!(w, h, kernel = kernel.size(), fw, fh, "fft convolution");

    let fft = Fft2d::new(fw, fh);

    let zero = Complex::new(0.0f32, 0.0);
    let mut img = vec![zero; fw * fh];
    img.par_chunks_mut(fw).take(ph).enumerate().for_each(|(py, row)| {
        let sy = clamp_index(py as isize - r as isize, h);
        let line = src.row(sy);
        for (px, c) in row.iter_mut().take(pw).enumerate() {
            c.re = line[clamp_index(px as isize - r as isize, w)];
        }
    });

    // Flipped about the origin so the product is a correlation, which is
    // what the spatial path computes.
    let size = kernel.size();
    let mut kern = vec![zero; fw * fh];
    for ky in 0..size {
        let ty = (r + fh - ky) % fh;
        for kx in 0..size {
            let tx = (r + fw - kx) % fw;
            kern[ty * fw + tx].re = kernel.at(kx, ky);
        }
    }

    let mut spectrum = fft.forward(img);
    let kern_spectrum = fft.forward(kern);
    spectrum
        .par_iter_mut()
        .zip(kern_spectrum.par_iter())
        .for_each(|(a, b)| *a *= *b);
    let result = fft.inverse(spectrum);

    let scale = 1.0 / (fw * fh) as f32;
    let mut out = vec![0.0f32; w * h];
    out.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        let line = &result[(y + r) * fw..];
        for (x, v) in row.iter_mut().enumerate() {
            *v = line[x + r].re * scale;
        }
    });
    Ok(Plane::from_vec(w, h, out)?)
}

/// Smallest `n' >= n` whose only prime factors are 2, 3 and 5.
pub fn fft_len(n: usize) -> usize {
    let mut m = n.max(1);
    loop {
        let mut k = m;
        for p in [2, 3, 5] {
            while k % p == 0 {
                k /= p;
            }
        }
        if k == 1 {
            return m;
        }
        m += 1;
    }
}

/// Row/column 2-D FFT. The forward transform leaves data transposed
/// (`w` rows of `h` samples); the inverse expects that layout and returns
/// row-major data.
struct Fft2d {
    w: usize,
    h: usize,
    row_fwd: Arc<dyn Fft<f32>>,
    row_inv: Arc<dyn Fft<f32>>,
    col_fwd: Arc<dyn Fft<f32>>,
    col_inv: Arc<dyn Fft<f32>>,
}

impl Fft2d {
    fn new(w: usize, h: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            w,
            h,
            row_fwd: planner.plan_fft_forward(w),
            row_inv: planner.plan_fft_inverse(w),
            col_fwd: planner.plan_fft_forward(h),
            col_inv: planner.plan_fft_inverse(h),
        }
    }

    fn forward(&self, mut data: Vec<Complex<f32>>) -> Vec<Complex<f32>> {
        data.par_chunks_mut(self.w)
            .for_each(|row| self.row_fwd.process(row));
        let mut t = transpose(&data, self.w, self.h);
        t.par_chunks_mut(self.h)
            .for_each(|col| self.col_fwd.process(col));
        t
    }

    fn inverse(&self, mut t: Vec<Complex<f32>>) -> Vec<Complex<f32>> {
        t.par_chunks_mut(self.h)
            .for_each(|col| self.col_inv.process(col));
        let mut data = transpose(&t, self.h, self.w);
        data.par_chunks_mut(self.w)
            .for_each(|row| self.row_inv.process(row));
        data
    }
}

fn transpose(src: &[Complex<f32>], w: usize, h: usize) -> Vec<Complex<f32>> {
    let mut dst = vec![Complex::new(0.0, 0.0); w * h];
    dst.par_chunks_mut(h).enumerate().for_each(|(x, col)| {
        for (y, v) in col.iter_mut().enumerate() {
            *v = src[y * w + x];
        }
    });
    dst
}
