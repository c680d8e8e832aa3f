//! Film profile records.
//!
//! A [`ProfileSpec`] is the plain-data form read from YAML or assembled in
//! code. [`FilmProfile::new`] validates it once; a `FilmProfile` is never
//! modified afterwards.
//!
//! Layer invariants:
//!
//! - colour films have red, green and blue layers; an optional panchromatic
//!   layer is kept for its weights but never used for colour rendering
//! - monochrome films have only a panchromatic layer

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use film_emulsion::{GrainParams, HdCurveParams, ReciprocityParams, ToneMapper, ToneMappingParams};
use film_ops::{BloomParams, HalationParams, WavelengthBloomParams};

use crate::{ProfileError, ProfileResult};

/// Colour or black-and-white stock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorType {
    /// Three chromatic layers.
    #[default]
    Color,
    /// One panchromatic layer.
    Monochrome,
}

impl FromStr for ColorType {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "color" | "colour" => Ok(Self::Color),
            "monochrome" | "mono" | "bw" => Ok(Self::Monochrome),
            other => Err(ProfileError::invalid(other, "color_type must be color or monochrome")),
        }
    }
}

/// Which optical and grain models a profile uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhysicsMode {
    /// Luminance-weighted bloom, perceptual grain, no characteristic curve.
    #[default]
    Artistic,
    /// Energy-conserving optics, Poisson grain, H&D curve.
    Physical,
}

impl fmt::Display for PhysicsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Artistic => "artistic",
            Self::Physical => "physical",
        })
    }
}

/// One light-sensitive layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmulsionLayer {
    /// Response to incoming red.
    pub r_absorption: f32,
    /// Response to incoming green.
    pub g_absorption: f32,
    /// Response to incoming blue.
    pub b_absorption: f32,
    /// Weight of the scattered (bloomed) exposure.
    pub diffuse_weight: f32,
    /// Weight of the direct exposure.
    pub direct_weight: f32,
    /// Exponent on the direct exposure.
    pub response_exponent: f32,
    /// Grain amplitude for this layer.
    pub grain_intensity: f32,
}

impl EmulsionLayer {
    /// Sum of the three absorption weights.
    pub fn total_absorption(&self) -> f32 {
        self.r_absorption + self.g_absorption + self.b_absorption
    }

    /// Absorption weights as an RGB row.
    pub fn absorption(&self) -> [f32; 3] {
        [self.r_absorption, self.g_absorption, self.b_absorption]
    }

    fn validate(&self, profile: &str, which: &str) -> ProfileResult<()> {
        let values = [
            ("r_absorption", self.r_absorption),
            ("g_absorption", self.g_absorption),
            ("b_absorption", self.b_absorption),
            ("diffuse_weight", self.diffuse_weight),
            ("direct_weight", self.direct_weight),
            ("grain_intensity", self.grain_intensity),
        ];
        for (field, v) in values {
            if !(v >= 0.0 && v.is_finite()) {
                return Err(ProfileError::invalid(
                    profile,
                    format!("{which}.{field} must be finite and non-negative, got {v}"),
                ));
            }
        }
        if !(self.total_absorption() > 0.0) {
            return Err(ProfileError::invalid(
                profile,
                format!("{which} layer absorbs nothing"),
            ));
        }
        if !(self.response_exponent > 0.0 && self.response_exponent.is_finite()) {
            return Err(ProfileError::invalid(
                profile,
                format!("{which}.response_exponent must be positive"),
            ));
        }
        if self.grain_intensity > 1.0 {
            return Err(ProfileError::invalid(
                profile,
                format!("{which}.grain_intensity must be at most 1"),
            ));
        }
        Ok(())
    }
}

/// Layers of a profile as written in YAML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayerSpec {
    /// Red-sensitive layer.
    pub red: Option<EmulsionLayer>,
    /// Green-sensitive layer.
    pub green: Option<EmulsionLayer>,
    /// Blue-sensitive layer.
    pub blue: Option<EmulsionLayer>,
    /// Panchromatic layer.
    pub panchromatic: Option<EmulsionLayer>,
}

/// Unvalidated profile record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileSpec {
    /// Registry name.
    pub name: String,
    /// Colour or monochrome.
    pub color_type: ColorType,
    /// Box speed.
    pub iso: f32,
    /// Model selection.
    pub physics_mode: PhysicsMode,
    /// Gain on layer exposure.
    pub sensitivity_factor: f32,
    /// Name of a spectral sensitivity curve set; enables the spectral path.
    pub sensitivity_curves: Option<String>,
    /// Emulsion layers.
    pub layers: LayerSpec,
    /// Tone curve.
    pub tone_mapping: ToneMappingParams,
    /// Bloom.
    pub bloom: BloomParams,
    /// Halation.
    pub halation: HalationParams,
    /// Wavelength-dependent bloom.
    pub wavelength_bloom: WavelengthBloomParams,
    /// Characteristic curve.
    pub hd_curve: HdCurveParams,
    /// Grain.
    pub grain: GrainParams,
    /// Reciprocity failure.
    pub reciprocity: ReciprocityParams,
}

impl Default for ProfileSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            color_type: ColorType::Color,
            iso: 100.0,
            physics_mode: PhysicsMode::Artistic,
            sensitivity_factor: 1.0,
            sensitivity_curves: None,
            layers: LayerSpec::default(),
            tone_mapping: ToneMappingParams::default(),
            bloom: BloomParams::default(),
            halation: HalationParams::default(),
            wavelength_bloom: WavelengthBloomParams::default(),
            hd_curve: HdCurveParams::default(),
            grain: GrainParams::default(),
            reciprocity: ReciprocityParams::default(),
        }
    }
}

/// A validated, immutable film profile.
#[derive(Debug, Clone, PartialEq)]
pub struct FilmProfile {
    spec: ProfileSpec,
    active: Vec<EmulsionLayer>,
}

impl FilmProfile {
    /// Validates `spec`.
    ///
    /// # Errors
    ///
    /// [`ProfileError::InvalidProfile`] when a layer invariant or value range
    /// is violated; parameter bundle errors from the optics and emulsion
    /// crates pass through.
    pub fn new(spec: ProfileSpec) -> ProfileResult<Self> {
        let name = spec.name.as_str();
        if name.trim().is_empty() {
            return Err(ProfileError::invalid(name, "name must not be empty"));
        }
        if !(spec.iso > 0.0 && spec.iso.is_finite()) {
            return Err(ProfileError::invalid(name, format!("iso must be positive, got {}", spec.iso)));
        }
        if !(spec.sensitivity_factor > 0.0 && spec.sensitivity_factor.is_finite()) {
            return Err(ProfileError::invalid(
                name,
                format!("sensitivity_factor must be positive, got {}", spec.sensitivity_factor),
            ));
        }

        let l = &spec.layers;
        let active = match spec.color_type {
            ColorType::Color => match (&l.red, &l.green, &l.blue) {
                (Some(r), Some(g), Some(b)) => {
                    r.validate(name, "red")?;
                    g.validate(name, "green")?;
                    b.validate(name, "blue")?;
                    vec![r.clone(), g.clone(), b.clone()]
                }
                _ => {
                    return Err(ProfileError::invalid(
                        name,
                        "colour films need red, green and blue layers",
                    ));
                }
            },
            ColorType::Monochrome => {
                if l.red.is_some() || l.green.is_some() || l.blue.is_some() {
                    return Err(ProfileError::invalid(
                        name,
                        "monochrome films take only a panchromatic layer",
                    ));
                }
                match &l.panchromatic {
                    Some(p) => {
                        p.validate(name, "panchromatic")?;
                        vec![p.clone()]
                    }
                    None => {
                        return Err(ProfileError::invalid(
                            name,
                            "monochrome films need a panchromatic layer",
                        ));
                    }
                }
            }
        };
        if spec.color_type == ColorType::Color {
            if let Some(p) = &l.panchromatic {
                p.validate(name, "panchromatic")?;
            }
        }

        spec.halation.validate()?;
        if spec.wavelength_bloom.enabled {
            spec.wavelength_bloom.validate()?;
        }
        if spec.hd_curve.enabled {
            spec.hd_curve.validate()?;
        }
        ToneMapper::new(&spec.tone_mapping)?;

        Ok(Self { spec, active })
    }

    /// Registry name.
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Colour or monochrome.
    pub fn color_type(&self) -> ColorType {
        self.spec.color_type
    }

    /// Box speed.
    pub fn iso(&self) -> f32 {
        self.spec.iso
    }

    /// Model selection.
    pub fn physics_mode(&self) -> PhysicsMode {
        self.spec.physics_mode
    }

    /// Gain on layer exposure.
    pub fn sensitivity_factor(&self) -> f32 {
        self.spec.sensitivity_factor
    }

    /// Spectral sensitivity curve set, if the profile uses the spectral path.
    pub fn sensitivity_curves(&self) -> Option<&str> {
        self.spec.sensitivity_curves.as_deref()
    }

    /// Layers used for rendering: R, G, B for colour, one for monochrome.
    pub fn layers(&self) -> &[EmulsionLayer] {
        &self.active
    }

    /// The panchromatic layer, if any.
    pub fn panchromatic(&self) -> Option<&EmulsionLayer> {
        self.spec.layers.panchromatic.as_ref()
    }

    /// Tone curve parameters.
    pub fn tone_mapping(&self) -> &ToneMappingParams {
        &self.spec.tone_mapping
    }

    /// Bloom parameters.
    pub fn bloom(&self) -> &BloomParams {
        &self.spec.bloom
    }

    /// Halation parameters.
    pub fn halation(&self) -> &HalationParams {
        &self.spec.halation
    }

    /// Wavelength-dependent bloom parameters.
    pub fn wavelength_bloom(&self) -> &WavelengthBloomParams {
        &self.spec.wavelength_bloom
    }

    /// Characteristic curve parameters.
    pub fn hd_curve(&self) -> &HdCurveParams {
        &self.spec.hd_curve
    }

    /// Grain parameters.
    pub fn grain(&self) -> &GrainParams {
        &self.spec.grain
    }

    /// Reciprocity parameters.
    pub fn reciprocity(&self) -> &ReciprocityParams {
        &self.spec.reciprocity
    }

    /// 12 coefficients: the 3×3 layer absorption matrix row-major, then the
    /// panchromatic weights. Missing layers contribute zeros.
    pub fn spectral_response(&self) -> [f32; 12] {
        let l = &self.spec.layers;
        let mut out = [0.0; 12];
        for (i, layer) in [&l.red, &l.green, &l.blue, &l.panchromatic].into_iter().enumerate() {
            if let Some(layer) = layer {
                out[i * 3..i * 3 + 3].copy_from_slice(&layer.absorption());
            }
        }
        out
    }

    /// The record this profile was built from.
    pub fn spec(&self) -> &ProfileSpec {
        &self.spec
    }

    /// Returns the record for modification; rebuild with [`FilmProfile::new`].
    pub fn into_spec(self) -> ProfileSpec {
        self.spec
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn layer(r: f32, g: f32, b: f32) -> EmulsionLayer {
        EmulsionLayer {
            r_absorption: r,
            g_absorption: g,
            b_absorption: b,
            diffuse_weight: 0.7,
            direct_weight: 0.3,
            response_exponent: 1.0,
            grain_intensity: 0.1,
        }
    }

    pub(crate) fn color_spec() -> ProfileSpec {
        ProfileSpec {
            name: "Test".into(),
            layers: LayerSpec {
                red: Some(layer(0.9, 0.1, 0.0)),
                green: Some(layer(0.05, 0.9, 0.05)),
                blue: Some(layer(0.0, 0.1, 0.9)),
                panchromatic: None,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_color_profile_layers() {
        let p = FilmProfile::new(color_spec()).unwrap();
        assert_eq!(p.layers().len(), 3);
        let sr = p.spectral_response();
        assert_eq!(&sr[0..3], &[0.9, 0.1, 0.0]);
        assert_eq!(&sr[9..12], &[0.0, 0.0, 0.0]);
        assert!((p.layers()[1].total_absorption() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_color_profile_needs_all_layers() {
        let mut spec = color_spec();
        spec.layers.green = None;
        assert!(matches!(
            FilmProfile::new(spec),
            Err(ProfileError::InvalidProfile { .. })
        ));
    }

    #[test]
    fn test_monochrome_rejects_chromatic_layers() {
        let mut spec = color_spec();
        spec.color_type = ColorType::Monochrome;
        spec.layers.panchromatic = Some(layer(0.3, 0.6, 0.1));
        assert!(FilmProfile::new(spec.clone()).is_err());

        spec.layers.red = None;
        spec.layers.green = None;
        spec.layers.blue = None;
        let p = FilmProfile::new(spec).unwrap();
        assert_eq!(p.layers().len(), 1);
        assert_eq!(&p.spectral_response()[9..12], &[0.3, 0.6, 0.1]);
        assert_eq!(&p.spectral_response()[0..9], &[0.0; 9]);
    }

    #[test]
    fn test_value_ranges_checked() {
        let mut spec = color_spec();
        spec.iso = 0.0;
        assert!(FilmProfile::new(spec).is_err());

        let mut spec = color_spec();
        if let Some(red) = spec.layers.red.as_mut() {
            red.response_exponent = -1.0;
        }
        assert!(FilmProfile::new(spec).is_err());

        let mut spec = color_spec();
        spec.halation.backplate_reflectance = 3.0;
        assert!(matches!(FilmProfile::new(spec), Err(ProfileError::Ops(_))));

        let mut spec = color_spec();
        spec.wavelength_bloom.enabled = true;
        spec.wavelength_bloom.width_exponent = spec.wavelength_bloom.energy_exponent;
        assert!(FilmProfile::new(spec).is_err());
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("Mono".parse::<ColorType>().unwrap(), ColorType::Monochrome);
        assert!("sepia".parse::<ColorType>().is_err());
        assert_eq!(PhysicsMode::Physical.to_string(), "physical");
    }
}
