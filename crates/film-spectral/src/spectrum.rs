//! Band grid and the [`Spectrum`] value type.
//!
//! All spectral quantities share one grid: [`NUM_BANDS`] samples evenly
//! spaced over 380-780 nm, a step of 40/3 nm.

use std::ops::Index;

/// Number of spectral bands.
pub const NUM_BANDS: usize = 31;
/// Shortest sampled wavelength in nm.
pub const WAVELENGTH_MIN: f32 = 380.0;
/// Longest sampled wavelength in nm.
pub const WAVELENGTH_MAX: f32 = 780.0;

/// Wavelength of band `i` in nm.
#[inline]
pub fn wavelength(i: usize) -> f32 {
    WAVELENGTH_MIN + i as f32 * (WAVELENGTH_MAX - WAVELENGTH_MIN) / (NUM_BANDS - 1) as f32
}

/// All band wavelengths.
pub fn wavelengths() -> [f32; NUM_BANDS] {
    std::array::from_fn(wavelength)
}

/// Resamples a curve given at `xs` onto the band grid (clamped at the ends).
pub fn resample(xs: &[f32], ys: &[f32]) -> [f32; NUM_BANDS] {
    std::array::from_fn(|i| film_math::interp_clamped(xs, ys, wavelength(i)))
}

/// A 31-band spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spectrum(pub [f32; NUM_BANDS]);

impl Spectrum {
    /// All-zero spectrum.
    pub const ZERO: Spectrum = Spectrum([0.0; NUM_BANDS]);

    /// Spectrum with every band set to `value`.
    pub const fn flat(value: f32) -> Spectrum {
        Spectrum([value; NUM_BANDS])
    }

    /// Band samples.
    #[inline]
    pub fn samples(&self) -> &[f32; NUM_BANDS] {
        &self.0
    }

    /// Adds `k * other` band by band.
    #[inline]
    pub fn add_scaled(&mut self, other: &Spectrum, k: f32) {
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a += k * b;
        }
    }

    /// Clamps negative samples to zero.
    pub fn clamp_non_negative(mut self) -> Spectrum {
        for v in &mut self.0 {
            *v = v.max(0.0);
        }
        self
    }

    /// Weighted sum `Σ s[i] * w[i]` accumulated in f64.
    #[inline]
    pub fn dot(&self, weights: &[f32; NUM_BANDS]) -> f64 {
        self.0
            .iter()
            .zip(weights)
            .map(|(&s, &w)| s as f64 * w as f64)
            .sum()
    }
}

impl Index<usize> for Spectrum {
    type Output = f32;

    fn index(&self, i: usize) -> &f32 {
        &self.0[i]
    }
}
