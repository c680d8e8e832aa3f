//! Point-spread-function kernels.
//!
//! All kernels are square with an odd side and sum to one.
//!
//! - [`Kernel::gaussian`] - isotropic Gaussian, separable
//! - [`Kernel::exponential`] - `exp(-κr)` tail
//! - [`Kernel::dual`] - Gaussian core plus exponential tail
//!
//! A pure Gaussian falls to numerical zero within a few sigma, so scattering
//! that must stay visible tens of pixels away uses the dual kernel: the core
//! carries `core_fraction` of the energy and the tail carries the rest.
//!
//! # Example
//!
//! ```rust
//! use film_ops::Kernel;
//!
//! let k = Kernel::dual(2.0, 0.05, 0.8, 80).unwrap();
//! assert_eq!(k.size(), 161);
//! assert!((k.sum() - 1.0).abs() < 1e-3);
//! ```

use crate::{OpsError, OpsResult};

/// Square convolution kernel with an odd side.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    data: Vec<f32>,
    size: usize,
    /// 1-D factor when the kernel is an outer product of it with itself.
    profile: Option<Vec<f32>>,
}

impl Kernel {
    /// Creates a kernel from row-major weights. `size` must be odd.
    pub fn new(data: Vec<f32>, size: usize) -> OpsResult<Self> {
        if size % 2 == 0 {
            return Err(OpsError::InvalidParameter(format!(
                "kernel size must be odd, got {size}"
            )));
        }
        if data.len() != size * size {
            return Err(OpsError::InvalidParameter(format!(
                "kernel data size {} doesn't match {size}x{size}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            size,
            profile: None,
        })
    }

    /// Normalised Gaussian kernel.
    ///
    /// Even sizes are rounded up. A non-positive or non-finite `sigma` gives
    /// the identity (a centred delta).
    ///
    /// ```rust
    /// use film_ops::Kernel;
    ///
    /// let k = Kernel::gaussian(5, 1.5);
    /// assert_eq!(k.size(), 5);
    /// assert!(k.is_separable());
    /// ```
    pub fn gaussian(size: usize, sigma: f32) -> Self {
        let size = if size % 2 == 0 { size + 1 } else { size };
        let half = (size / 2) as i32;

        let mut profile: Vec<f32> = if sigma > 0.0 && sigma.is_finite() {
            let sigma2 = 2.0 * sigma * sigma;
            (-half..=half)
                .map(|x| (-((x * x) as f32) / sigma2).exp())
                .collect()
        } else {
            (-half..=half).map(|x| if x == 0 { 1.0 } else { 0.0 }).collect()
        };
        let sum: f32 = profile.iter().sum();
        for w in &mut profile {
            *w /= sum;
        }

        let data = profile
            .iter()
            .flat_map(|&wy| profile.iter().map(move |&wx| wx * wy))
            .collect();

        Self {
            data,
            size,
            profile: Some(profile),
        }
    }

    /// Gaussian with side `2·ceil(3σ) + 1`.
    pub fn gaussian_for_sigma(sigma: f32) -> Self {
        Self::gaussian(gaussian_size(sigma), sigma)
    }

    /// Normalised exponential kernel `exp(-κr)` with side `2·radius + 1`.
    pub fn exponential(radius: usize, kappa: f32) -> OpsResult<Self> {
        if !(kappa >= 0.0 && kappa.is_finite()) {
            return Err(OpsError::InvalidParameter(format!(
                "kappa must be finite and non-negative, got {kappa}"
            )));
        }
        let mut weights = radial(radius, |r| (-kappa * r).exp());
        normalize(&mut weights);
        Self::new(weights, 2 * radius + 1)
    }

    /// Dual PSF: `core·G(σ) + (1 − core)·E(κ)` on a `2·radius + 1` grid.
    ///
    /// Both components are normalised on the grid before mixing and the
    /// result is normalised again.
    pub fn dual(sigma: f32, kappa: f32, core_fraction: f32, radius: usize) -> OpsResult<Self> {
        if !(sigma > 0.0 && sigma.is_finite()) {
            return Err(OpsError::InvalidParameter(format!(
                "sigma must be positive, got {sigma}"
            )));
        }
        if !(kappa > 0.0 && kappa.is_finite()) {
            return Err(OpsError::InvalidParameter(format!(
                "kappa must be positive, got {kappa}"
            )));
        }
        if !(0.0..=1.0).contains(&core_fraction) {
            return Err(OpsError::InvalidParameter(format!(
                "core_fraction must be in [0, 1], got {core_fraction}"
            )));
        }
        if radius == 0 {
            return Err(OpsError::InvalidParameter(
                "dual kernel radius must be at least 1".into(),
            ));
        }

        let sigma2 = 2.0 * sigma * sigma;
        let mut core = radial(radius, |r| (-(r * r) / sigma2).exp());
        let mut tail = radial(radius, |r| (-kappa * r).exp());
        normalize(&mut core);
        normalize(&mut tail);

        let mut data: Vec<f32> = core
            .iter()
            .zip(&tail)
            .map(|(&g, &e)| core_fraction * g + (1.0 - core_fraction) * e)
            .collect();
        normalize(&mut data);
        Self::new(data, 2 * radius + 1)
    }

    /// Side length.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Half-size.
    #[inline]
    pub fn radius(&self) -> usize {
        self.size / 2
    }

    /// Row-major weights.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Weight at column `x`, row `y`.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.size + x]
    }

    /// 1-D factor for separable kernels.
    #[inline]
    pub fn profile(&self) -> Option<&[f32]> {
        self.profile.as_deref()
    }

    /// True if the kernel is an outer product of a 1-D profile.
    #[inline]
    pub fn is_separable(&self) -> bool {
        self.profile.is_some()
    }

    /// Sum of all weights.
    pub fn sum(&self) -> f64 {
        self.data.iter().map(|&v| v as f64).sum()
    }

    /// Centre weight.
    pub fn peak(&self) -> f32 {
        let r = self.radius();
        self.at(r, r)
    }
}

/// Kernel side covering ±3σ.
pub fn gaussian_size(sigma: f32) -> usize {
    if sigma > 0.0 && sigma.is_finite() {
        2 * (3.0 * sigma).ceil() as usize + 1
    } else {
        1
    }
}

fn radial(radius: usize, f: impl Fn(f32) -> f32) -> Vec<f32> {
    let r = radius as i32;
    (-r..=r)
        .flat_map(|y| (-r..=r).map(move |x| ((x * x + y * y) as f32).sqrt()))
        .map(f)
        .collect()
}

fn normalize(weights: &mut [f32]) {
    let sum: f64 = weights.iter().map(|&v| v as f64).sum();
    if sum > 0.0 {
        let inv = (1.0 / sum) as f32;
        for w in weights {
            *w *= inv;
        }
    }
}
