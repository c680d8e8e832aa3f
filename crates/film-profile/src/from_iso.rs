//! Building a complete profile from a film speed.

use serde::{Deserialize, Serialize};
use tracing::debug;

use film_emulsion::{GrainParams, GrainStrategy, HdCurveParams, ReciprocityParams, ToneMappingParams, ToneStyle};
use film_ops::{beer_lambert_transmittance, BloomParams, HalationParams, WavelengthBloomParams};

use crate::iso::{derive_physical_params_from_iso, IsoDerivedParams};
use crate::profile::{ColorType, EmulsionLayer, FilmProfile, LayerSpec, PhysicsMode, ProfileSpec};
use crate::{ProfileError, ProfileResult};

/// Anti-halation absorption coefficients (R, G, B) per unit thickness.
pub const AH_ABSORPTION: [f32; 3] = [1.2, 2.3, 3.0];

const COLOR_MATRIX: [[f32; 3]; 3] = [
    [0.80, 0.15, 0.05],
    [0.10, 0.80, 0.10],
    [0.05, 0.15, 0.80],
];
const PANCHROMATIC: [f32; 3] = [0.30, 0.59, 0.11];

/// Named replacements applied after derivation.
///
/// Every field left `None` keeps the derived value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileOverrides {
    /// Gain on layer exposure.
    pub sensitivity_factor: Option<f32>,
    /// Model selection.
    pub physics_mode: Option<PhysicsMode>,
    /// Spectral sensitivity curve set.
    pub sensitivity_curves: Option<String>,
    /// Tone curve.
    pub tone_mapping: Option<ToneMappingParams>,
    /// Bloom.
    pub bloom: Option<BloomParams>,
    /// Halation.
    pub halation: Option<HalationParams>,
    /// Wavelength-dependent bloom.
    pub wavelength_bloom: Option<WavelengthBloomParams>,
    /// Characteristic curve.
    pub hd_curve: Option<HdCurveParams>,
    /// Grain.
    pub grain: Option<GrainParams>,
    /// Reciprocity failure.
    pub reciprocity: Option<ReciprocityParams>,
}

/// Inputs to [`create_film_profile_from_iso`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FromIsoSpec {
    /// Profile name.
    pub name: String,
    /// Film speed, `[25, 6400]`.
    pub iso: f32,
    /// Colour or monochrome.
    pub color_type: ColorType,
    /// Grain family, matched leniently.
    pub film_type: String,
    /// Tone curve family.
    pub tone_mapping_style: ToneStyle,
    /// Artistic or physical models.
    pub physics_mode: PhysicsMode,
    /// Explicit 3×3 layer matrix plus panchromatic weights.
    pub spectral_response: Option<Vec<f32>>,
    /// False for stocks without an anti-halation backing.
    pub has_ah_layer: bool,
    /// Replacements applied last.
    pub overrides: ProfileOverrides,
}

impl Default for FromIsoSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            iso: 400.0,
            color_type: ColorType::Color,
            film_type: "standard".into(),
            tone_mapping_style: ToneStyle::Filmic,
            physics_mode: PhysicsMode::Artistic,
            spectral_response: None,
            has_ah_layer: true,
            overrides: ProfileOverrides::default(),
        }
    }
}

impl FromIsoSpec {
    /// Spec with the given name and speed, defaults elsewhere.
    pub fn new(name: impl Into<String>, iso: f32) -> Self {
        Self {
            name: name.into(),
            iso,
            ..Self::default()
        }
    }
}

fn layer(absorption: [f32; 3], derived: &IsoDerivedParams) -> EmulsionLayer {
    EmulsionLayer {
        r_absorption: absorption[0],
        g_absorption: absorption[1],
        b_absorption: absorption[2],
        diffuse_weight: 0.7,
        direct_weight: 0.3,
        response_exponent: 1.0,
        grain_intensity: derived.grain_intensity,
    }
}

fn layers(spec: &FromIsoSpec, derived: &IsoDerivedParams) -> ProfileResult<LayerSpec> {
    let (matrix, pan) = match &spec.spectral_response {
        Some(values) => {
            if values.len() != 12 {
                return Err(ProfileError::SpectralResponseLength { got: values.len() });
            }
            let row = |i: usize| [values[i * 3], values[i * 3 + 1], values[i * 3 + 2]];
            ([row(0), row(1), row(2)], row(3))
        }
        None => (COLOR_MATRIX, PANCHROMATIC),
    };

    Ok(match spec.color_type {
        ColorType::Color => LayerSpec {
            red: Some(layer(matrix[0], derived)),
            green: Some(layer(matrix[1], derived)),
            blue: Some(layer(matrix[2], derived)),
            panchromatic: (pan.iter().sum::<f32>() > 0.0).then(|| layer(pan, derived)),
        },
        ColorType::Monochrome => LayerSpec {
            panchromatic: Some(layer(pan, derived)),
            ..LayerSpec::default()
        },
    })
}

/// Composes a full profile from ISO-derived values plus overrides.
///
/// # Errors
///
/// - [`ProfileError::IsoOutOfRange`] outside `[25, 6400]`
/// - [`ProfileError::SpectralResponseLength`] unless an explicit
///   `spectral_response` has exactly 12 values
/// - validation errors from [`FilmProfile::new`]
///
/// ```rust
/// use film_profile::{create_film_profile_from_iso, FromIsoSpec};
///
/// let p = create_film_profile_from_iso(&FromIsoSpec::new("Generic400", 400.0)).unwrap();
/// assert_eq!(p.layers().len(), 3);
/// ```
pub fn create_film_profile_from_iso(spec: &FromIsoSpec) -> ProfileResult<FilmProfile> {
    let derived = derive_physical_params_from_iso(spec.iso, &spec.film_type)?;
    let layers = layers(spec, &derived)?;
    let physical = spec.physics_mode == PhysicsMode::Physical;

    let ah_layer_transmittance = if spec.has_ah_layer {
        AH_ABSORPTION.map(|a| beer_lambert_transmittance(a, 1.0))
    } else {
        [1.0; 3]
    };

    let mut profile = ProfileSpec {
        name: spec.name.clone(),
        color_type: spec.color_type,
        iso: spec.iso,
        physics_mode: spec.physics_mode,
        sensitivity_factor: 1.0,
        sensitivity_curves: None,
        layers,
        tone_mapping: ToneMappingParams {
            style: spec.tone_mapping_style,
            ..Default::default()
        },
        bloom: BloomParams {
            sigma_px: derived.bloom_sigma_px,
            scattering_ratio: derived.scattering_ratio,
            ..Default::default()
        },
        halation: HalationParams {
            ah_layer_transmittance,
            ..Default::default()
        },
        wavelength_bloom: WavelengthBloomParams {
            enabled: physical,
            scattering_ratio: derived.scattering_ratio,
            use_mie_correction: physical,
            ..Default::default()
        },
        hd_curve: HdCurveParams {
            enabled: physical,
            ..Default::default()
        },
        grain: GrainParams {
            strategy: if physical {
                GrainStrategy::Poisson
            } else {
                GrainStrategy::Artistic
            },
            size_px: derived.grain_blur_px,
            exposure_level: derived.photons_per_unit,
            ..Default::default()
        },
        reciprocity: ReciprocityParams::default(),
    };

    let o = spec.overrides.clone();
    if let Some(v) = o.sensitivity_factor {
        profile.sensitivity_factor = v;
    }
    if let Some(v) = o.physics_mode {
        profile.physics_mode = v;
    }
    if o.sensitivity_curves.is_some() {
        profile.sensitivity_curves = o.sensitivity_curves;
    }
    if let Some(v) = o.tone_mapping {
        profile.tone_mapping = v;
    }
    if let Some(v) = o.bloom {
        profile.bloom = v;
    }
    if let Some(v) = o.halation {
        profile.halation = v;
    }
    if let Some(v) = o.wavelength_bloom {
        profile.wavelength_bloom = v;
    }
    if let Some(v) = o.hd_curve {
        profile.hd_curve = v;
    }
    if let Some(v) = o.grain {
        profile.grain = v;
    }
    if let Some(v) = o.reciprocity {
        profile.reciprocity = v;
    }

    debug!(
        name = %profile.name,
        iso = spec.iso,
        film_type = %derived.film_type,
        mode = %profile.physics_mode,
        "derived film profile"
    );
    FilmProfile::new(profile)
}
