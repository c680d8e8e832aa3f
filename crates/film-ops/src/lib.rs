//! # film-ops
//!
//! Point-spread functions, convolution and the optical scattering stages.
//!
//! - [`Kernel`] - Gaussian, exponential and dual core/tail PSFs
//! - [`ConvolutionEngine`] - bounded kernel cache and spatial/FFT dispatch
//! - [`BloomModel`] - [`NoBloom`], [`ArtisticBloom`], [`PhysicalBloom`], [`WavelengthBloom`]
//! - [`Halation`] - back-reflection halo after bloom
//!
//! Optical stages work on one [`film_core::Plane`] per emulsion layer and run
//! the layers in parallel; layers never read each other.
//!
//! # Example
//!
//! ```rust
//! use film_core::Plane;
//! use film_ops::{BloomModel, BloomParams, ConvolutionEngine, PhysicalBloom};
//!
//! let engine = ConvolutionEngine::new();
//! let bloom = PhysicalBloom::new(&BloomParams::default()).unwrap();
//!
//! let mut plane = Plane::new(64, 64);
//! plane.set(32, 32, 10.0);
//! let mut planes = vec![plane];
//! bloom.apply(&engine, &mut planes).unwrap();
//! assert!((planes[0].sum() - 10.0).abs() < 1e-3);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bloom;
pub mod cache;
pub mod convolve;
pub mod engine;
pub mod error;
pub mod halation;
pub mod kernel;
pub mod params;

pub use bloom::{
    ArtisticBloom, BloomModel, ChannelScatter, NoBloom, PhysicalBloom, WavelengthBloom,
};
pub use cache::{CacheStats, KernelCache, KernelKey, DEFAULT_KERNEL_CACHE_CAPACITY};
pub use convolve::{convolve_fft, convolve_spatial, fft_len};
pub use engine::{ConvolutionEngine, DEFAULT_FFT_THRESHOLD};
pub use error::{OpsError, OpsResult};
pub use halation::{beer_lambert_transmittance, Halation};
pub use kernel::{gaussian_size, Kernel};
pub use params::{BloomParams, HalationParams, WavelengthBloomParams};
