//! RGB, spectrum, XYZ and sRGB conversions.
//!
//! ```text
//! sRGB --eotf--> linear RGB --Smits--> spectrum --CIE 1931 x illuminant--> XYZ
//!      <--oetf--            <----------- XYZ -> linear sRGB matrix ----------
//! ```
//!
//! XYZ is normalised so that a flat unit spectrum has `Y = 1` under the chosen
//! illuminant.
//!
//! # Example
//!
//! ```rust
//! use film_spectral::{srgb_to_spectrum, spectrum_to_xyz, xyz_to_srgb, Illuminant};
//!
//! let rgb = [0.8, 0.4, 0.2];
//! let back = xyz_to_srgb(spectrum_to_xyz(&srgb_to_spectrum(rgb), Illuminant::d65()));
//! for c in 0..3 {
//!     assert!((back[c] - rgb[c]).abs() < 0.03);
//! }
//! ```

use std::sync::OnceLock;

use film_core::Image;
use film_math::Mat3;

use crate::cie::{cie_1931, Illuminant};
use crate::smits::rgb_to_spectrum;
use crate::spectrum::{Spectrum, NUM_BANDS};
use crate::srgb;
use crate::SpectralResult;

/// CIE XYZ (D65 white) to linear sRGB.
pub const XYZ_TO_LINEAR_SRGB: Mat3 = Mat3::from_rows([
    [3.2404542, -1.5371385, -0.4985314],
    [-0.9692660, 1.8760108, 0.0415560],
    [0.0556434, -0.2040259, 1.0572252],
]);

/// Integrates a spectrum against the CIE 1931 observer under `illuminant`.
pub fn spectrum_to_xyz(spectrum: &Spectrum, illuminant: &Illuminant) -> [f32; 3] {
    let cie = cie_1931();
    let weighted = |cmf: &[f32; NUM_BANDS]| -> [f32; NUM_BANDS] {
        std::array::from_fn(|i| cmf[i] * illuminant.spd[i])
    };
    let wy = weighted(&cie.y);
    let norm: f64 = wy.iter().map(|&v| v as f64).sum();
    if norm <= 0.0 {
        return [0.0; 3];
    }
    [
        (spectrum.dot(&weighted(&cie.x)) / norm) as f32,
        (spectrum.dot(&wy) / norm) as f32,
        (spectrum.dot(&weighted(&cie.z)) / norm) as f32,
    ]
}

/// XYZ to linear sRGB (matrix only, unclipped).
#[inline]
pub fn xyz_to_linear_srgb(xyz: [f32; 3]) -> [f32; 3] {
    XYZ_TO_LINEAR_SRGB.transform(xyz)
}

/// Linear sRGB to XYZ.
pub fn linear_srgb_to_xyz(rgb: [f32; 3]) -> [f32; 3] {
    static INVERSE: OnceLock<Mat3> = OnceLock::new();
    INVERSE
        .get_or_init(|| XYZ_TO_LINEAR_SRGB.inverse().unwrap_or(Mat3::IDENTITY))
        .transform(rgb)
}

/// XYZ to display sRGB: matrix, OETF, clipped to [0, 1].
#[inline]
pub fn xyz_to_srgb(xyz: [f32; 3]) -> [f32; 3] {
    srgb::oetf_rgb(xyz_to_linear_srgb(xyz))
}

/// Decodes display sRGB and converts to a spectrum.
#[inline]
pub fn srgb_to_spectrum(rgb: [f32; 3]) -> Spectrum {
    rgb_to_spectrum(srgb::eotf_rgb(rgb))
}

/// Converts every pixel of a linear RGB image to a spectrum.
///
/// # Errors
///
/// [`film_core::Error::ChannelMismatch`] for non-RGB input.
pub fn image_to_spectra(image: &Image) -> SpectralResult<Vec<Spectrum>> {
    if image.channels() != 3 {
        return Err(film_core::Error::channel_mismatch(3, image.channels()).into());
    }
    Ok(image
        .data()
        .chunks_exact(3)
        .map(|px| rgb_to_spectrum([px[0], px[1], px[2]]))
        .collect())
}
