//! Resampling and input standardization.
//!
//! Every frame is brought to a fixed minimum edge before processing so that
//! pixel-sized physical parameters (PSF sigmas, grain size) mean the same thing
//! regardless of the source resolution.
//!
//! # Filters
//!
//! - [`Filter::Area`] - box filter scaled to the footprint, i.e. area averaging
//!   (used when shrinking)
//! - [`Filter::Lanczos3`] - windowed sinc (used when enlarging)
//!
//! Both are applied as a separable two-pass resize with per-tap weight
//! normalization.
//!
//! # Example
//!
//! ```rust
//! use film_core::{standardize, Image};
//!
//! let img = Image::filled(300, 200, &[0.5, 0.5, 0.5]).unwrap();
//! let std = standardize(&img, 100).unwrap();
//! assert_eq!(std.dimensions(), (150, 100));
//! ```

use rayon::prelude::*;
use tracing::debug;

use crate::{Error, Image, Plane, Result};

/// Default minimum edge length of a standardized frame.
pub const DEFAULT_MIN_EDGE: usize = 2400;

/// Resampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// Box filter widened to the source footprint (area averaging).
    Area,
    /// Lanczos-3 windowed sinc.
    Lanczos3,
}

impl Filter {
    /// Support radius in filter units.
    #[inline]
    pub fn support(&self) -> f32 {
        match self {
            Filter::Area => 0.5,
            Filter::Lanczos3 => 3.0,
        }
    }

    /// Evaluates the filter at `x`.
    #[inline]
    pub fn weight(&self, x: f32) -> f32 {
        match self {
            Filter::Area => {
                if x.abs() <= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            Filter::Lanczos3 => lanczos_weight(x, 3.0),
        }
    }
}

#[inline]
fn lanczos_weight(x: f32, a: f32) -> f32 {
    let ax = x.abs();
    if ax < 1e-8 {
        1.0
    } else if ax < a {
        let pi_x = std::f32::consts::PI * ax;
        let pi_x_a = pi_x / a;
        (pi_x.sin() / pi_x) * (pi_x_a.sin() / pi_x_a)
    } else {
        0.0
    }
}

/// Taps contributing to one output coordinate.
struct Taps {
    start: usize,
    weights: Vec<f32>,
}

/// Precomputes normalized taps for a 1-D resample from `src` to `dst` samples.
fn compute_taps(src: usize, dst: usize, filter: Filter) -> Vec<Taps> {
    let scale = src as f32 / dst as f32;
    let stretch = scale.max(1.0);
    let support = filter.support() * stretch;

    (0..dst)
        .map(|i| {
            let center = (i as f32 + 0.5) * scale - 0.5;
            let left = ((center - support).floor() as isize).max(0) as usize;
            let right = ((center + support).ceil().max(0.0) as usize).min(src - 1);

            let mut weights: Vec<f32> = (left..=right)
                .map(|s| filter.weight((s as f32 - center) / stretch))
                .collect();
            let total: f32 = weights.iter().sum();
            if total.abs() > f32::EPSILON {
                for w in &mut weights {
                    *w /= total;
                }
            } else {
                // Degenerate footprint: nearest sample.
                let nearest = (center.round().max(0.0) as usize).min(src - 1);
                weights = (left..=right).map(|s| (s == nearest) as u8 as f32).collect();
            }
            Taps {
                start: left,
                weights,
            }
        })
        .collect()
}

/// Resizes a plane with a separable filter.
///
/// # Errors
///
/// [`Error::InvalidDimensions`] for empty source or destination sizes.
pub fn resize_plane(src: &Plane, dst_w: usize, dst_h: usize, filter: Filter) -> Result<Plane> {
    let (src_w, src_h) = src.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(Error::invalid_dimensions(src_w, src_h, "empty source"));
    }
    if dst_w == 0 || dst_h == 0 {
        return Err(Error::invalid_dimensions(
            dst_w,
            dst_h,
            "destination size must be > 0",
        ));
    }

    // Horizontal pass: src_h rows of dst_w.
    let h_taps = compute_taps(src_w, dst_w, filter);
    let mut temp = vec![0.0f32; dst_w * src_h];
    temp.par_chunks_mut(dst_w)
        .zip(src.data().par_chunks(src_w))
        .for_each(|(dst_row, src_row)| {
            for (d, taps) in dst_row.iter_mut().zip(&h_taps) {
                *d = taps
                    .weights
                    .iter()
                    .enumerate()
                    .map(|(k, w)| src_row[taps.start + k] * w)
                    .sum();
            }
        });

    // Vertical pass.
    let v_taps = compute_taps(src_h, dst_h, filter);
    let mut out = vec![0.0f32; dst_w * dst_h];
    out.par_chunks_mut(dst_w)
        .zip(v_taps.par_iter())
        .for_each(|(dst_row, taps)| {
            for (k, w) in taps.weights.iter().enumerate() {
                let row = &temp[(taps.start + k) * dst_w..(taps.start + k + 1) * dst_w];
                for (d, &s) in dst_row.iter_mut().zip(row) {
                    *d += s * w;
                }
            }
        });

    Plane::from_vec(dst_w, dst_h, out)
}

/// Resizes every channel of an image.
pub fn resize(src: &Image, dst_w: usize, dst_h: usize, filter: Filter) -> Result<Image> {
    let planes = src
        .planes()
        .iter()
        .map(|p| resize_plane(p, dst_w, dst_h, filter))
        .collect::<Result<Vec<_>>>()?;
    Image::from_planes(&planes)
}

/// Target size for a frame whose shorter edge becomes `min_edge`.
///
/// Both dimensions are rounded down to even values, never below 2.
pub fn standardized_size(width: usize, height: usize, min_edge: usize) -> (usize, usize) {
    let short = width.min(height).max(1) as f64;
    let scale = min_edge as f64 / short;
    let even = |n: f64| -> usize {
        let n = n.round().max(2.0) as usize;
        (n - n % 2).max(2)
    };
    (even(width as f64 * scale), even(height as f64 * scale))
}

/// Resamples `image` so its shorter edge is `min_edge` with even dimensions.
///
/// Shrinking uses area averaging, enlarging uses Lanczos-3. Output samples are
/// clamped to the source value range so Lanczos ringing cannot introduce
/// negative light. A frame already at the target size is returned as a copy.
///
/// # Errors
///
/// [`Error::InvalidParameter`] when `min_edge < 2`.
pub fn standardize(image: &Image, min_edge: usize) -> Result<Image> {
    if min_edge < 2 {
        return Err(Error::InvalidParameter(format!(
            "minimum edge must be >= 2, got {min_edge}"
        )));
    }
    let (w, h) = image.dimensions();
    let (tw, th) = standardized_size(w, h, min_edge);
    if (tw, th) == (w, h) {
        return Ok(image.clone());
    }

    let filter = if tw * th < w * h {
        Filter::Area
    } else {
        Filter::Lanczos3
    };
    debug!(from = ?(w, h), to = ?(tw, th), ?filter, "standardizing frame");

    let lo = image.data().iter().copied().fold(f32::INFINITY, f32::min);
    let hi = image.data().iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut out = resize(image, tw, th, filter)?;
    if lo <= hi {
        out.map_in_place(|v| v.clamp(lo, hi));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_standardized_size_even() {
        assert_eq!(standardized_size(4000, 3000, 2400), (3200, 2400));
        assert_eq!(standardized_size(101, 51, 51), (100, 50));
        let (w, h) = standardized_size(333, 777, 2400);
        assert_eq!(w % 2, 0);
        assert_eq!(h % 2, 0);
        assert_eq!(w, 2400);
    }

    #[test]
    fn test_standardize_tiny_input() {
        let img = Image::filled(1, 1, &[0.3]).unwrap();
        let out = standardize(&img, 2).unwrap();
        assert_eq!(out.dimensions(), (2, 2));
        assert!((out.pixel(1, 1)[0] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_area_downscale_averages() {
        // 4x1 -> 2x1: pairs averaged
        let src = Plane::from_vec(4, 1, vec![0.0, 1.0, 2.0, 4.0]).unwrap();
        let dst = resize_plane(&src, 2, 1, Filter::Area).unwrap();
        assert_abs_diff_eq!(dst.get(0, 0), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(dst.get(1, 0), 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_uniform_is_preserved() {
        let img = Image::filled(64, 48, &[0.5, 0.25, 0.75]).unwrap();
        for target in [24, 96] {
            let out = standardize(&img, target).unwrap();
            assert_eq!(out.height(), target);
            for px in out.data().chunks_exact(3) {
                assert!((px[0] - 0.5).abs() < 1e-5);
                assert!((px[1] - 0.25).abs() < 1e-5);
                assert!((px[2] - 0.75).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_lanczos_upscale_stays_in_range() {
        let mut data = vec![0.0f32; 16 * 16];
        for y in 0..16 {
            for x in 8..16 {
                data[y * 16 + x] = 1.0;
            }
        }
        let img = Image::from_vec(16, 16, 1, data).unwrap();
        let out = standardize(&img, 40).unwrap();
        assert!(out.data().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_same_size_is_copy() {
        let img = Image::filled(10, 20, &[0.1]).unwrap();
        assert_eq!(standardize(&img, 10).unwrap(), img);
    }

    #[test]
    fn test_rejects_bad_edge() {
        let img = Image::filled(10, 20, &[0.1]).unwrap();
        assert!(standardize(&img, 1).is_err());
    }
}
