//! Film spectral sensitivity curves.
//!
//! Each film with spectral data has three curves, one per recording layer.
//! Curves are plain data in YAML (`data/sensitivity.yaml` is embedded and
//! loaded on first use); any other file with the same layout can be loaded
//! through [`SensitivitySet::from_file`].
//!
//! ```yaml
//! version: 1
//! wavelengths_nm: [380.0, 393.33, ...]
//! films:
//!   Portra400:
//!     red:   [...]
//!     green: [...]
//!     blue:  [...]
//! ```
//!
//! Curves on any wavelength grid are resampled onto the band grid at load
//! time. Lookup of a film without data fails with
//! [`SpectralError::SensitivityNotFound`]; there is no default curve.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use serde::Deserialize;
use tracing::debug;

use film_core::Image;

use crate::smits::{decompose, Basis};
use crate::spectrum::{resample, Spectrum, NUM_BANDS};
use crate::{SpectralError, SpectralResult};

const BUILTIN_YAML: &str = include_str!("../data/sensitivity.yaml");

#[derive(Debug, Deserialize)]
struct RawSensitivityFile {
    version: u32,
    wavelengths_nm: Vec<f32>,
    films: BTreeMap<String, RawCurves>,
}

#[derive(Debug, Deserialize)]
struct RawCurves {
    red: Vec<f32>,
    green: Vec<f32>,
    blue: Vec<f32>,
}

/// Red, green and blue sensitivity of one film.
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityCurves {
    name: String,
    raw: [[f32; NUM_BANDS]; 3],
    normalized: [[f32; NUM_BANDS]; 3],
}

impl SensitivityCurves {
    /// Builds curves from band-sampled data.
    ///
    /// # Errors
    ///
    /// [`SpectralError::InvalidData`] when a curve is negative, non-finite or
    /// integrates to zero.
    pub fn new(name: impl Into<String>, raw: [[f32; NUM_BANDS]; 3]) -> SpectralResult<Self> {
        let name = name.into();
        let mut normalized = raw;
        for (c, curve) in normalized.iter_mut().enumerate() {
            if curve.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(SpectralError::InvalidData(format!(
                    "{name}: channel {c} has negative or non-finite samples"
                )));
            }
            let total: f64 = curve.iter().map(|&v| v as f64).sum();
            if total <= 1e-12 {
                return Err(SpectralError::InvalidData(format!(
                    "{name}: channel {c} has zero integral"
                )));
            }
            for v in curve.iter_mut() {
                *v = (*v as f64 / total) as f32;
            }
        }
        Ok(Self {
            name,
            raw,
            normalized,
        })
    }

    /// Film name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Curves as loaded, before normalization.
    pub fn raw(&self) -> &[[f32; NUM_BANDS]; 3] {
        &self.raw
    }

    /// Curves scaled so each integrates to 1.
    pub fn normalized(&self) -> &[[f32; NUM_BANDS]; 3] {
        &self.normalized
    }

    /// Wavelength of peak sensitivity per channel, in nm.
    pub fn peak_wavelengths(&self) -> [f32; 3] {
        self.raw.map(|curve| {
            let i = (0..NUM_BANDS)
                .max_by(|&a, &b| curve[a].total_cmp(&curve[b]))
                .unwrap_or(0);
            crate::spectrum::wavelength(i)
        })
    }
}

/// A named collection of sensitivity curves.
#[derive(Debug, Clone, Default)]
pub struct SensitivitySet {
    films: BTreeMap<String, SensitivityCurves>,
}

impl SensitivitySet {
    /// Parses a YAML document.
    pub fn from_yaml_str(yaml: &str) -> SpectralResult<Self> {
        let raw: RawSensitivityFile = serde_yaml::from_str(yaml)?;
        Self::from_raw(raw)
    }

    /// Loads a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> SpectralResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SpectralError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    fn from_raw(raw: RawSensitivityFile) -> SpectralResult<Self> {
        if raw.version != 1 {
            return Err(SpectralError::InvalidData(format!(
                "unsupported sensitivity file version {}",
                raw.version
            )));
        }
        let n = raw.wavelengths_nm.len();
        if n < 2 || raw.wavelengths_nm.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(SpectralError::InvalidData(
                "wavelengths_nm must be strictly increasing with at least 2 samples".into(),
            ));
        }

        let mut films = BTreeMap::new();
        for (name, curves) in raw.films {
            for (label, c) in [("red", &curves.red), ("green", &curves.green), ("blue", &curves.blue)] {
                if c.len() != n {
                    return Err(SpectralError::InvalidData(format!(
                        "{name}.{label}: expected {n} samples, got {}",
                        c.len()
                    )));
                }
            }
            let banded = [
                resample(&raw.wavelengths_nm, &curves.red),
                resample(&raw.wavelengths_nm, &curves.green),
                resample(&raw.wavelengths_nm, &curves.blue),
            ];
            films.insert(name.clone(), SensitivityCurves::new(name, banded)?);
        }
        debug!(count = films.len(), "loaded sensitivity curves");
        Ok(Self { films })
    }

    /// The embedded curve set, parsed once.
    pub fn builtin() -> SpectralResult<&'static SensitivitySet> {
        static SET: OnceLock<Result<SensitivitySet, String>> = OnceLock::new();
        SET.get_or_init(|| Self::from_yaml_str(BUILTIN_YAML).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|e| SpectralError::DataUnavailable(e.clone()))
    }

    /// Looks up a film by exact name.
    pub fn get(&self, film: &str) -> SpectralResult<&SensitivityCurves> {
        self.films
            .get(film)
            .ok_or_else(|| SpectralError::SensitivityNotFound {
                film: film.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Film names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.films.keys().map(String::as_str).collect()
    }
}

/// Embedded sensitivity curves for `film`.
///
/// # Errors
///
/// [`SpectralError::SensitivityNotFound`] for a film without data.
pub fn sensitivity_curves(film: &str) -> SpectralResult<&'static SensitivityCurves> {
    SensitivitySet::builtin()?.get(film)
}

/// Integrates a spectrum against a film's three curves.
///
/// With `normalize` each curve is scaled to unit integral, so a flat spectrum
/// of value `v` maps to `(v, v, v)`.
pub fn apply_film_spectral_sensitivity(
    spectrum: &Spectrum,
    curves: &SensitivityCurves,
    normalize: bool,
) -> [f32; 3] {
    let table = if normalize {
        curves.normalized()
    } else {
        curves.raw()
    };
    [
        spectrum.dot(&table[0]) as f32,
        spectrum.dot(&table[1]) as f32,
        spectrum.dot(&table[2]) as f32,
    ]
}

/// Film response to each Smits basis spectrum.
///
/// Because the RGB-to-spectrum construction is linear in its three weights,
/// the film response of any colour is the same weighted sum of these seven
/// precomputed responses. A whole image goes through the spectral path
/// without materializing a spectrum per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralResponse {
    film: String,
    per_basis: [[f32; 3]; 7],
}

impl SpectralResponse {
    /// Precomputes normalized responses for `curves`.
    pub fn new(curves: &SensitivityCurves) -> Self {
        let per_basis =
            Basis::ALL.map(|b| apply_film_spectral_sensitivity(b.spectrum(), curves, true));
        Self {
            film: curves.name().to_string(),
            per_basis,
        }
    }

    /// Film name the response was built from.
    pub fn film(&self) -> &str {
        &self.film
    }

    /// Film RGB response to a linear RGB colour (negative input clamps to 0).
    #[inline]
    pub fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        let rgb = rgb.map(|v| if v.is_nan() { 0.0 } else { v.max(0.0) });
        let mut out = [0.0f32; 3];
        for (basis, w) in decompose(rgb) {
            let resp = &self.per_basis[basis.index()];
            for c in 0..3 {
                out[c] += w * resp[c];
            }
        }
        out
    }

    /// Maps every pixel of a linear 3-channel image.
    ///
    /// # Errors
    ///
    /// [`film_core::Error::ChannelMismatch`] for non-RGB input.
    pub fn apply_image(&self, image: &Image) -> SpectralResult<Image> {
        if image.channels() != 3 {
            return Err(film_core::Error::channel_mismatch(3, image.channels()).into());
        }
        let mut out = image.clone();
        for px in out.data_mut().chunks_exact_mut(3) {
            let mapped = self.apply([px[0], px[1], px[2]]);
            px.copy_from_slice(&mapped);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smits::rgb_to_spectrum;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_builtin_films() {
        let set = SensitivitySet::builtin().unwrap();
        let names = set.names();
        for film in ["CineStill800T", "Ektar100", "NC200", "Portra400"] {
            assert!(names.contains(&film), "missing {film}");
        }
    }

    #[test]
    fn test_unknown_film_is_error() {
        let err = sensitivity_curves("Velvia50").unwrap_err();
        match err {
            SpectralError::SensitivityNotFound { film, available } => {
                assert_eq!(film, "Velvia50");
                assert!(available.contains("Portra400"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_flat_spectrum_maps_to_unity() {
        let curves = sensitivity_curves("Portra400").unwrap();
        let rgb = apply_film_spectral_sensitivity(&Spectrum::flat(1.0), curves, true);
        for v in rgb {
            assert_relative_eq!(v, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_peaks_are_ordered() {
        let curves = sensitivity_curves("Ektar100").unwrap();
        let [r, g, b] = curves.peak_wavelengths();
        assert!(r > g && g > b);
        assert!((600.0..700.0).contains(&r));
        assert!((420.0..480.0).contains(&b));
    }

    #[test]
    fn test_response_matches_spectral_path() {
        let curves = sensitivity_curves("CineStill800T").unwrap();
        let response = SpectralResponse::new(curves);
        for rgb in [[0.2, 0.5, 0.9], [0.9, 0.1, 0.4], [0.3, 0.3, 0.3], [0.0, 1.0, 0.0]] {
            let direct = apply_film_spectral_sensitivity(&rgb_to_spectrum(rgb), curves, true);
            let fast = response.apply(rgb);
            for c in 0..3 {
                assert_abs_diff_eq!(direct[c], fast[c], epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let yaml = "version: 1\nwavelengths_nm: [400.0, 500.0, 600.0]\nfilms:\n  Bad:\n    red: [1.0, 1.0]\n    green: [1.0, 1.0, 1.0]\n    blue: [1.0, 1.0, 1.0]\n";
        assert!(matches!(
            SensitivitySet::from_yaml_str(yaml),
            Err(SpectralError::InvalidData(_))
        ));
    }

    #[test]
    fn test_coarse_grid_is_resampled() {
        let yaml = "version: 1\nwavelengths_nm: [380.0, 780.0]\nfilms:\n  Flat:\n    red: [1.0, 1.0]\n    green: [0.0, 2.0]\n    blue: [2.0, 0.0]\n";
        let set = SensitivitySet::from_yaml_str(yaml).unwrap();
        let flat = set.get("Flat").unwrap();
        let rgb = apply_film_spectral_sensitivity(&Spectrum::flat(0.5), flat, true);
        for v in rgb {
            assert_relative_eq!(v, 0.5, epsilon = 1e-5);
        }
    }
}
