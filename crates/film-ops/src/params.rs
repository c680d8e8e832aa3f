//! Parameter bundles for the optical stages.
//!
//! All bundles are plain data: `Default`, `Clone`, deserializable from YAML
//! with missing fields taking their defaults.

use serde::{Deserialize, Serialize};

use crate::{OpsError, OpsResult};

/// Bloom (in-emulsion scattering of bright regions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomParams {
    /// Master switch.
    pub enabled: bool,
    /// Artistic mode gain on the highlight weight.
    pub strength: f32,
    /// Gaussian sigma in pixels.
    pub sigma_px: f32,
    /// Physical mode: values above this scatter.
    pub threshold: f32,
    /// Physical mode: fraction of highlight energy scattered.
    pub scattering_ratio: f32,
    /// Physical mode: rescale the scattered layer to its input energy.
    pub energy_conservation: bool,
}

impl Default for BloomParams {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: 0.15,
            sigma_px: 12.0,
            threshold: 0.8,
            scattering_ratio: 0.08,
            energy_conservation: true,
        }
    }
}

/// Halation (light reflected back from the film base).
///
/// Transmittances are per channel in R, G, B order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HalationParams {
    /// Master switch.
    pub enabled: bool,
    /// Emulsion stack transmittance.
    pub emulsion_transmittance: [f32; 3],
    /// Film base transmittance.
    pub base_transmittance: [f32; 3],
    /// Anti-halation layer transmittance; `[1, 1, 1]` when the stock has none.
    pub ah_layer_transmittance: [f32; 3],
    /// Reflectance of the pressure plate behind the film.
    pub backplate_reflectance: f32,
    /// Values above this contribute to the halo.
    pub threshold: f32,
    /// PSF core sigma in pixels.
    pub psf_sigma_px: f32,
    /// PSF tail decay per pixel.
    pub psf_kappa: f32,
    /// Share of PSF energy in the Gaussian core.
    pub psf_core_fraction: f32,
    /// PSF radius in pixels.
    pub psf_radius_px: usize,
}

impl Default for HalationParams {
    fn default() -> Self {
        Self {
            enabled: true,
            emulsion_transmittance: [0.95, 0.92, 0.88],
            base_transmittance: [0.98, 0.98, 0.98],
            ah_layer_transmittance: [0.30, 0.10, 0.05],
            backplate_reflectance: 0.25,
            threshold: 0.7,
            psf_sigma_px: 6.0,
            psf_kappa: 0.04,
            psf_core_fraction: 0.3,
            psf_radius_px: 60,
        }
    }
}

impl HalationParams {
    /// The same stack with the anti-halation layer removed.
    pub fn without_ah_layer(mut self) -> Self {
        self.ah_layer_transmittance = [1.0; 3];
        self
    }

    /// `(T_e · T_b · T_ah)² · R_bp` per channel.
    pub fn effective_fraction(&self) -> [f32; 3] {
        std::array::from_fn(|c| {
            let t = self.emulsion_transmittance[c]
                * self.base_transmittance[c]
                * self.ah_layer_transmittance[c];
            t * t * self.backplate_reflectance
        })
    }

    /// Checks every transmittance and the reflectance lie in [0, 1].
    pub fn validate(&self) -> OpsResult<()> {
        let fields = [
            ("emulsion_transmittance", &self.emulsion_transmittance),
            ("base_transmittance", &self.base_transmittance),
            ("ah_layer_transmittance", &self.ah_layer_transmittance),
        ];
        for (name, values) in fields {
            if values.iter().any(|v| !(0.0..=1.0).contains(v)) {
                return Err(OpsError::InvalidParameter(format!(
                    "{name} must be in [0, 1], got {values:?}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.backplate_reflectance) {
            return Err(OpsError::InvalidParameter(format!(
                "backplate_reflectance must be in [0, 1], got {}",
                self.backplate_reflectance
            )));
        }
        Ok(())
    }
}

/// Wavelength-dependent bloom.
///
/// Per channel, relative to `reference_wavelength_nm`:
///
/// ```text
/// energy  η(λ) = scattering_ratio · (λ_ref / λ)^energy_exponent
/// width   σ(λ) = base_sigma_px    · (λ_ref / λ)^width_exponent
/// ```
///
/// The two exponents must differ; with equal exponents wavelength would
/// drive strength and spread together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WavelengthBloomParams {
    /// Master switch.
    pub enabled: bool,
    /// Reference wavelength in nm.
    pub reference_wavelength_nm: f32,
    /// Effective wavelength of the R, G, B layers in nm.
    pub channel_wavelengths_nm: [f32; 3],
    /// Energy exponent `p`.
    pub energy_exponent: f32,
    /// Width exponent `q`.
    pub width_exponent: f32,
    /// Core sigma at the reference wavelength, pixels.
    pub base_sigma_px: f32,
    /// Tail decay at the reference wavelength, per pixel.
    pub base_kappa: f32,
    /// Share of PSF energy in the Gaussian core.
    pub core_fraction: f32,
    /// PSF radius in pixels.
    pub radius_px: usize,
    /// Scattered fraction at the reference wavelength.
    pub scattering_ratio: f32,
    /// Values above this scatter.
    pub threshold: f32,
    /// Multiply η by the Mie efficiency table.
    pub use_mie_correction: bool,
}

impl Default for WavelengthBloomParams {
    fn default() -> Self {
        Self {
            enabled: false,
            reference_wavelength_nm: 550.0,
            channel_wavelengths_nm: [650.0, 550.0, 450.0],
            energy_exponent: 3.5,
            width_exponent: 0.8,
            base_sigma_px: 2.0,
            base_kappa: 0.05,
            core_fraction: 0.8,
            radius_px: 80,
            scattering_ratio: 0.08,
            threshold: 0.8,
            use_mie_correction: false,
        }
    }
}

impl WavelengthBloomParams {
    /// Rejects coupled exponents and non-physical values.
    pub fn validate(&self) -> OpsResult<()> {
        if (self.energy_exponent - self.width_exponent).abs() < 1e-6 {
            return Err(OpsError::InvalidParameter(format!(
                "energy_exponent and width_exponent must differ, both are {}",
                self.energy_exponent
            )));
        }
        if self.reference_wavelength_nm <= 0.0
            || self.channel_wavelengths_nm.iter().any(|&w| w <= 0.0)
        {
            return Err(OpsError::InvalidParameter(
                "wavelengths must be positive".into(),
            ));
        }
        if !(self.base_sigma_px > 0.0 && self.base_kappa > 0.0) {
            return Err(OpsError::InvalidParameter(format!(
                "base_sigma_px and base_kappa must be positive, got {} and {}",
                self.base_sigma_px, self.base_kappa
            )));
        }
        if !(0.0..=1.0).contains(&self.scattering_ratio) {
            return Err(OpsError::InvalidParameter(format!(
                "scattering_ratio must be in [0, 1], got {}",
                self.scattering_ratio
            )));
        }
        Ok(())
    }
}
