//! Physical parameters derived from film speed.
//!
//! Faster films use larger silver-halide crystals. With mean crystal
//! diameter `d` (µm):
//!
//! ```text
//! d          = 0.6 · (ISO / 100)^(1/3) · k_type
//! intensity  = clamp(0.06 · √(ISO / 100) · k_type, 0.03, 0.35)
//! scattering = clamp(0.05 · (d / 0.6)², 0.03, 0.15)
//! x(λ)       = 2π · (d / 2) / λ
//! ```

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ProfileError, ProfileResult};

/// Lowest supported ISO.
pub const ISO_MIN: f32 = 25.0;
/// Highest supported ISO.
pub const ISO_MAX: f32 = 6400.0;

/// Wavelengths (nm) for the R, G, B Mie size parameters.
pub const MIE_WAVELENGTHS_NM: [f32; 3] = [650.0, 550.0, 450.0];

const REFERENCE_DIAMETER_UM: f32 = 0.6;

/// Grain structure family; scales crystal size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilmType {
    /// T-grain and other fine-grain stocks.
    FineGrain,
    /// Ordinary cubic grain.
    #[default]
    Standard,
    /// Push-oriented high-speed stocks.
    HighSpeed,
    /// Motion picture negative.
    Cine,
}

impl FilmType {
    /// Multiplier on crystal diameter and grain intensity.
    pub fn size_multiplier(self) -> f32 {
        match self {
            Self::FineGrain => 0.8,
            Self::Standard => 1.0,
            Self::HighSpeed => 1.2,
            Self::Cine => 1.1,
        }
    }

    /// Parses a film type, falling back to [`FilmType::Standard`].
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            debug!(film_type = s, "unknown film type, using standard");
            Self::Standard
        })
    }
}

impl FromStr for FilmType {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "fine_grain" => Ok(Self::FineGrain),
            "standard" => Ok(Self::Standard),
            "high_speed" => Ok(Self::HighSpeed),
            "cine" => Ok(Self::Cine),
            _ => Err(ProfileError::invalid(
                s,
                "film_type must be fine_grain, standard, high_speed or cine",
            )),
        }
    }
}

impl fmt::Display for FilmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FineGrain => "fine_grain",
            Self::Standard => "standard",
            Self::HighSpeed => "high_speed",
            Self::Cine => "cine",
        })
    }
}

/// Grain and scattering parameters for one (ISO, film type) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsoDerivedParams {
    /// Film speed.
    pub iso: f32,
    /// Film type after fallback.
    pub film_type: FilmType,
    /// Mean crystal diameter in µm.
    pub grain_mean_diameter_um: f32,
    /// Grain amplitude.
    pub grain_intensity: f32,
    /// Fraction of highlight energy scattered by bloom.
    pub scattering_ratio: f32,
    /// Mie size parameter at 650, 550 and 450 nm.
    pub mie_size_parameters: [f32; 3],
    /// Bloom Gaussian sigma in pixels.
    pub bloom_sigma_px: f32,
    /// Poisson photon count at exposure 1.0.
    pub photons_per_unit: f32,
    /// Grain clump blur in pixels.
    pub grain_blur_px: f32,
}

/// Derives grain and scattering parameters from ISO.
///
/// `film_type` is matched leniently: unknown names use `standard`.
///
/// # Errors
///
/// [`ProfileError::IsoOutOfRange`] outside `[25, 6400]`.
///
/// ```rust
/// use film_profile::derive_physical_params_from_iso;
///
/// let slow = derive_physical_params_from_iso(100.0, "standard").unwrap();
/// let fast = derive_physical_params_from_iso(1600.0, "standard").unwrap();
/// assert!(fast.grain_mean_diameter_um > slow.grain_mean_diameter_um);
/// assert!(derive_physical_params_from_iso(12.0, "standard").is_err());
/// ```
pub fn derive_physical_params_from_iso(iso: f32, film_type: &str) -> ProfileResult<IsoDerivedParams> {
    if !(ISO_MIN..=ISO_MAX).contains(&iso) {
        return Err(ProfileError::IsoOutOfRange {
            iso,
            min: ISO_MIN,
            max: ISO_MAX,
        });
    }
    let film_type = FilmType::parse_lenient(film_type);
    let k = film_type.size_multiplier();
    let speed = iso / 100.0;

    let d = REFERENCE_DIAMETER_UM * speed.cbrt() * k;
    let grain_intensity = (0.06 * speed.sqrt() * k).clamp(0.03, 0.35);
    let relative = d / REFERENCE_DIAMETER_UM;
    let scattering_ratio = (0.05 * relative * relative).clamp(0.03, 0.15);

    let radius_nm = d / 2.0 * 1000.0;
    let mie_size_parameters = MIE_WAVELENGTHS_NM.map(|wl| 2.0 * PI * radius_nm / wl);

    Ok(IsoDerivedParams {
        iso,
        film_type,
        grain_mean_diameter_um: d,
        grain_intensity,
        scattering_ratio,
        mie_size_parameters,
        bloom_sigma_px: 10.0 * relative,
        photons_per_unit: 4000.0 / speed,
        grain_blur_px: 0.5 + d,
    })
}
