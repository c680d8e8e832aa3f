//! # film-spectral
//!
//! Spectral reference data and colour/spectrum conversion.
//!
//! - [`Spectrum`] - 31 bands over 380-780 nm
//! - [`rgb_to_spectrum`] - Smits 7-basis construction, see [`smits`]
//! - [`spectrum_to_xyz`], [`xyz_to_srgb`] - CIE 1931 integration and display encoding
//! - [`SensitivityCurves`], [`SpectralResponse`] - per-film layer sensitivity
//! - [`MieTable`] - grain scattering lookup by (wavelength, ISO)
//!
//! Static tables are plain data embedded in the crate and parsed on first
//! use; nothing is recomputed after that.
//!
//! # Example
//!
//! ```rust
//! use film_spectral::{apply_film_spectral_sensitivity, rgb_to_spectrum, sensitivity_curves};
//!
//! let curves = sensitivity_curves("Portra400").unwrap();
//! let grey = rgb_to_spectrum([0.18, 0.18, 0.18]);
//! let film_rgb = apply_film_spectral_sensitivity(&grey, curves, true);
//! assert!((film_rgb[1] - 0.18).abs() < 0.01);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cie;
pub mod convert;
pub mod error;
pub mod mie;
pub mod sensitivity;
pub mod smits;
pub mod spectrum;
pub mod srgb;

pub use cie::{cie_1931, Cie1931, Illuminant};
pub use convert::{
    image_to_spectra, linear_srgb_to_xyz, spectrum_to_xyz, srgb_to_spectrum, xyz_to_linear_srgb,
    xyz_to_srgb, XYZ_TO_LINEAR_SRGB,
};
pub use error::{SpectralError, SpectralResult};
pub use mie::{lookup_mie_params, MieParams, MieTable};
pub use sensitivity::{
    apply_film_spectral_sensitivity, sensitivity_curves, SensitivityCurves, SensitivitySet,
    SpectralResponse,
};
pub use smits::{rgb_to_spectrum, Basis};
pub use spectrum::{wavelength, wavelengths, Spectrum, NUM_BANDS};
