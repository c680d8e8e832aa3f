//! Convolution engine: kernel cache plus adaptive spatial/FFT dispatch.
//!
//! One engine is built per pipeline and dropped with it, so the cache never
//! outlives the renders that fill it.
//!
//! ```rust
//! use film_core::Plane;
//! use film_ops::ConvolutionEngine;
//!
//! let engine = ConvolutionEngine::new();
//! let mut plane = Plane::new(32, 32);
//! plane.set(16, 16, 1.0);
//! let blurred = engine.blur(&plane, 2.0).unwrap();
//! assert!((blurred.sum() - 1.0).abs() < 1e-4);
//! assert_eq!(engine.cache_stats().misses, 1);
//! ```

use std::sync::Arc;

use tracing::trace;

use film_core::Plane;

use crate::cache::{CacheStats, KernelCache, KernelKey, DEFAULT_KERNEL_CACHE_CAPACITY};
use crate::convolve::{convolve_fft, convolve_spatial};
use crate::kernel::gaussian_size;
use crate::{Kernel, OpsResult};

/// Kernels with a side up to this size use the spatial path.
pub const DEFAULT_FFT_THRESHOLD: usize = 31;

/// Builds, caches and applies PSF kernels.
#[derive(Debug)]
pub struct ConvolutionEngine {
    cache: KernelCache,
    fft_threshold: usize,
}

impl ConvolutionEngine {
    /// Engine with default cache capacity and FFT threshold.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_KERNEL_CACHE_CAPACITY)
    }

    /// Engine caching at most `capacity` kernels.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: KernelCache::new(capacity),
            fft_threshold: DEFAULT_FFT_THRESHOLD,
        }
    }

    /// Sets the largest kernel side handled spatially.
    pub fn with_fft_threshold(mut self, threshold: usize) -> Self {
        self.fft_threshold = threshold;
        self
    }

    /// Largest kernel side handled spatially.
    pub fn fft_threshold(&self) -> usize {
        self.fft_threshold
    }

    /// Cached normalised Gaussian. `size == 0` sizes the kernel to ±3σ.
    pub fn gaussian_kernel(&self, sigma: f32, size: usize) -> Arc<Kernel> {
        let size = if size == 0 { gaussian_size(sigma) } else { size | 1 };
        let built: Result<_, std::convert::Infallible> = self
            .cache
            .get_or_try_insert(KernelKey::gaussian(sigma, size), || {
                Ok(Kernel::gaussian(size, sigma))
            });
        match built {
            Ok(kernel) => kernel,
            Err(never) => match never {},
        }
    }

    /// Cached dual PSF, see [`Kernel::dual`].
    pub fn dual_kernel(
        &self,
        sigma: f32,
        kappa: f32,
        core_fraction: f32,
        radius: usize,
    ) -> OpsResult<Arc<Kernel>> {
        self.cache.get_or_try_insert(
            KernelKey::dual(sigma, kappa, core_fraction, radius),
            || Kernel::dual(sigma, kappa, core_fraction, radius),
        )
    }

    /// Cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Convolves with `kernel`, spatially for small kernels and via FFT otherwise.
    pub fn convolve(&self, src: &Plane, kernel: &Kernel) -> OpsResult<Plane> {
        if kernel.size() <= self.fft_threshold {
            trace!(size = kernel.size(), path = "spatial", "convolve");
            convolve_spatial(src, kernel)
        } else {
            trace!(size = kernel.size(), path = "fft", "convolve");
            convolve_fft(src, kernel)
        }
    }

    /// Gaussian blur with a cached ±3σ kernel. `sigma <= 0` copies the plane.
    pub fn blur(&self, src: &Plane, sigma: f32) -> OpsResult<Plane> {
        if !(sigma > 0.0 && sigma.is_finite()) {
            return Ok(src.clone());
        }
        let kernel = self.gaussian_kernel(sigma, 0);
        self.convolve(src, &kernel)
    }
}

impl Default for ConvolutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_requests_hit_cache() {
        let engine = ConvolutionEngine::new();
        let a = engine.gaussian_kernel(2.0, 13);
        let b = engine.gaussian_kernel(2.0, 13);
        assert!(Arc::ptr_eq(&a, &b));
        let c = engine.dual_kernel(2.0, 0.05, 0.8, 40).unwrap();
        let d = engine.dual_kernel(2.0, 0.05, 0.8, 40).unwrap();
        assert!(Arc::ptr_eq(&c, &d));
        let stats = engine.cache_stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 2);
    }

    #[test]
    fn test_cache_is_bounded() {
        let engine = ConvolutionEngine::with_capacity(3);
        for i in 1..=10 {
            engine.gaussian_kernel(i as f32 * 0.5, 0);
        }
        let stats = engine.cache_stats();
        assert_eq!(stats.len, 3);
        assert_eq!(stats.evictions, 7);
    }

    #[test]
    fn test_invalid_dual_reports_error() {
        let engine = ConvolutionEngine::new();
        assert!(engine.dual_kernel(1.0, -1.0, 0.5, 10).is_err());
        assert_eq!(engine.cache_stats().len, 0);
    }

    #[test]
    fn test_dispatch_paths_agree() {
        let mut plane = Plane::new(48, 48);
        plane.set(10, 20, 5.0);
        plane.set(30, 30, 2.0);
        let kernel = Kernel::dual(1.5, 0.1, 0.7, 20).unwrap();
        let spatial = ConvolutionEngine::new()
            .with_fft_threshold(usize::MAX)
            .convolve(&plane, &kernel)
            .unwrap();
        let fft = ConvolutionEngine::new()
            .with_fft_threshold(0)
            .convolve(&plane, &kernel)
            .unwrap();
        for (a, b) in spatial.data().iter().zip(fft.data()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_blur_non_positive_sigma_copies() {
        let engine = ConvolutionEngine::new();
        let plane = Plane::filled(4, 4, 0.3);
        assert_eq!(engine.blur(&plane, 0.0).unwrap(), plane);
        assert_eq!(engine.cache_stats().misses, 0);
    }
}
