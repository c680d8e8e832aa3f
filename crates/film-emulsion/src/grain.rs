//! Grain synthesis.
//!
//! Two interchangeable [`GrainModel`]s share one contract: given a plane of
//! exposure values in [0, 1] they return a noise plane in [-1, 1], never NaN,
//! reproducible for a given seed.
//!
//! - [`ArtisticGrain`] - Gaussian noise weighted toward the mid-tones
//! - [`PoissonGrain`] - photon shot noise; relative noise falls as exposure rises
//!
//! Random numbers are drawn per row from a generator seeded with
//! `(seed, row)`, so rows can be filled in parallel and the result does not
//! depend on thread scheduling.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Poisson, StandardNormal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

use film_core::Plane;
use film_math::saturate;
use film_ops::ConvolutionEngine;

use crate::{EmulsionError, EmulsionResult};

/// Mean photon count below which counts are drawn from a true Poisson
/// distribution instead of its Normal approximation.
pub const POISSON_NORMAL_CROSSOVER: f32 = 20.0;

/// Exposure at which the Poisson noise scale is referenced (18% grey).
const REFERENCE_EXPOSURE: f32 = 0.18;

/// Grain strategy selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrainStrategy {
    /// Perceptual mid-tone noise.
    #[default]
    Artistic,
    /// Photon statistics.
    Poisson,
}

impl FromStr for GrainStrategy {
    type Err = EmulsionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "artistic" => Ok(Self::Artistic),
            "poisson" | "physical" => Ok(Self::Poisson),
            _ => Err(EmulsionError::UnknownVariant {
                kind: "grain strategy",
                name: s.to_string(),
                expected: "artistic, poisson",
            }),
        }
    }
}

/// Grain parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrainParams {
    /// Master switch.
    pub enabled: bool,
    /// Which model generates the noise.
    pub strategy: GrainStrategy,
    /// Global gain on the per-layer grain intensity.
    pub intensity: f32,
    /// Grain clump size: blur sigma in pixels.
    pub size_px: f32,
    /// Poisson: photons collected at exposure 1.0.
    pub exposure_level: f32,
}

impl Default for GrainParams {
    fn default() -> Self {
        Self {
            enabled: true,
            strategy: GrainStrategy::Artistic,
            intensity: 1.0,
            size_px: 1.0,
            exposure_level: 1000.0,
        }
    }
}

/// A grain noise generator.
pub trait GrainModel: Send + Sync + fmt::Debug {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str;

    /// Noise in [-1, 1] for exposures `lux`.
    ///
    /// `sensitivity` scales the noise when [`GrainModel::scene_sensitive`]
    /// is true and is ignored otherwise.
    fn noise(
        &self,
        engine: &ConvolutionEngine,
        lux: &Plane,
        sensitivity: f32,
        seed: u64,
    ) -> EmulsionResult<Plane>;

    /// True if the amplitude follows the scene-derived sensitivity.
    ///
    /// Photon noise is set by the exposure alone, so models driven by
    /// counts return false.
    fn scene_sensitive(&self) -> bool {
        false
    }
}

/// Builds the model selected by `params.strategy`.
pub fn grain_model(params: &GrainParams) -> EmulsionResult<Box<dyn GrainModel>> {
    Ok(match params.strategy {
        GrainStrategy::Artistic => Box::new(ArtisticGrain::new(params)),
        GrainStrategy::Poisson => Box::new(PoissonGrain::new(params)?),
    })
}

/// Artistic sensitivity from the mean scene luminance: darker scenes get
/// more visible grain.
///
/// ```rust
/// use film_emulsion::scene_sensitivity;
///
/// assert!(scene_sensitivity(0.1) > scene_sensitivity(0.8));
/// assert_eq!(scene_sensitivity(2.0), 0.10);
/// ```
pub fn scene_sensitivity(mean_luminance: f32) -> f32 {
    let mean = if mean_luminance.is_finite() { mean_luminance } else { 0.0 };
    ((1.0 - mean) * 0.75 + 0.10).clamp(0.10, 0.70)
}

fn row_rng(seed: u64, row: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (row as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Blurs `plane` and returns it with the standard deviation factor the blur
/// applies to white noise, `sqrt(Σk²)`.
fn blur_with_factor(
    engine: &ConvolutionEngine,
    plane: Plane,
    sigma: f32,
) -> EmulsionResult<(Plane, f32)> {
    if !(sigma > 0.0 && sigma.is_finite()) {
        return Ok((plane, 1.0));
    }
    let kernel = engine.gaussian_kernel(sigma, 0);
    let factor = kernel.data().iter().map(|k| k * k).sum::<f32>().sqrt();
    Ok((engine.convolve(&plane, &kernel)?, factor))
}

#[inline]
fn finish(v: f32) -> f32 {
    if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 }
}

/// Mid-tone weighted Gaussian noise.
///
/// Weight is `2·(0.5 − |L − 0.5|)` clipped to [0.1, 1]: strongest at mid
/// grey, faint in deep shadows and highlights.
#[derive(Debug, Clone)]
pub struct ArtisticGrain {
    blur_sigma: f32,
}

impl ArtisticGrain {
    /// Uses half of `params.size_px` as the cohesion blur.
    pub fn new(params: &GrainParams) -> Self {
        Self {
            blur_sigma: params.size_px * 0.5,
        }
    }

    /// Mid-tone weight for exposure `l`.
    #[inline]
    pub fn weight(l: f32) -> f32 {
        let l = saturate(l);
        (2.0 * (0.5 - (l - 0.5).abs())).clamp(0.1, 1.0)
    }
}

impl GrainModel for ArtisticGrain {
    fn name(&self) -> &'static str {
        "artistic"
    }

    fn scene_sensitive(&self) -> bool {
        true
    }

    fn noise(
        &self,
        engine: &ConvolutionEngine,
        lux: &Plane,
        sensitivity: f32,
        seed: u64,
    ) -> EmulsionResult<Plane> {
        let (w, h) = lux.dimensions();
        let mut white = Plane::new(w, h);
        white
            .data_mut()
            .par_chunks_mut(w.max(1))
            .enumerate()
            .for_each(|(y, row)| {
                let mut rng = row_rng(seed, y);
                for v in row {
                    *v = StandardNormal.sample(&mut rng);
                }
            });

        let (mut noise, factor) = blur_with_factor(engine, white, self.blur_sigma)?;
        let gain = saturate(sensitivity) / (3.0 * factor);
        for (n, &l) in noise.data_mut().iter_mut().zip(lux.data()) {
            *n = finish(*n * gain * Self::weight(l));
        }
        Ok(noise)
    }
}

/// Photon shot noise.
///
/// Each pixel collects `L · exposure_level` photons on average. Counts are
/// drawn from a Poisson distribution (Normal approximation above
/// [`POISSON_NORMAL_CROSSOVER`]), turned into relative deviation
/// `(count − mean) / mean`, blurred by the grain size and scaled so three
/// standard deviations at 18% grey span [-1, 1].
#[derive(Debug, Clone)]
pub struct PoissonGrain {
    exposure_level: f32,
    blur_sigma: f32,
}

impl PoissonGrain {
    /// Validates `exposure_level`.
    pub fn new(params: &GrainParams) -> EmulsionResult<Self> {
        if !(params.exposure_level > 0.0 && params.exposure_level.is_finite()) {
            return Err(EmulsionError::InvalidParameter(format!(
                "exposure_level must be positive, got {}",
                params.exposure_level
            )));
        }
        Ok(Self {
            exposure_level: params.exposure_level,
            blur_sigma: params.size_px,
        })
    }

    fn relative_deviation(&self, l: f32, rng: &mut StdRng) -> EmulsionResult<f32> {
        let mean = saturate(l) * self.exposure_level;
        if mean < 1e-6 {
            return Ok(0.0);
        }
        let count = if mean <= POISSON_NORMAL_CROSSOVER {
            let dist = Poisson::new(mean as f64)
                .map_err(|e| EmulsionError::InvalidParameter(format!("poisson mean {mean}: {e}")))?;
            dist.sample(rng) as f32
        } else {
            let z: f32 = StandardNormal.sample(rng);
            mean + mean.sqrt() * z
        };
        Ok((count - mean) / mean)
    }
}

impl GrainModel for PoissonGrain {
    fn name(&self) -> &'static str {
        "poisson"
    }

    fn noise(
        &self,
        engine: &ConvolutionEngine,
        lux: &Plane,
        _sensitivity: f32,
        seed: u64,
    ) -> EmulsionResult<Plane> {
        let (w, h) = lux.dimensions();
        let mut rel = Plane::new(w, h);
        rel.data_mut()
            .par_chunks_mut(w.max(1))
            .zip(lux.data().par_chunks(w.max(1)))
            .enumerate()
            .try_for_each(|(y, (row, src))| -> EmulsionResult<()> {
                let mut rng = row_rng(seed, y);
                for (v, &l) in row.iter_mut().zip(src) {
                    *v = self.relative_deviation(l, &mut rng)?;
                }
                Ok(())
            })?;

        let (mut noise, factor) = blur_with_factor(engine, rel, self.blur_sigma)?;
        let sigma_ref = 1.0 / (self.exposure_level * REFERENCE_EXPOSURE).sqrt();
        let scale = 1.0 / (3.0 * sigma_ref * factor);
        trace!(sigma_ref, factor, "poisson grain");
        noise.map_in_place(|v| finish(v * scale));
        Ok(noise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn std_dev(p: &Plane) -> f64 {
        let mean = p.mean();
        let var = p
            .data()
            .iter()
            .map(|&v| (v as f64 - mean).powi(2))
            .sum::<f64>()
            / p.len() as f64;
        var.sqrt()
    }

    fn models() -> Vec<Box<dyn GrainModel>> {
        vec![
            grain_model(&GrainParams::default()).unwrap(),
            grain_model(&GrainParams {
                strategy: GrainStrategy::Poisson,
                ..Default::default()
            })
            .unwrap(),
        ]
    }

    #[test]
    fn test_output_bounded_over_exposures() {
        let engine = ConvolutionEngine::new();
        for model in models() {
            for &l in &[0.001, 0.05, 0.25, 0.5, 0.75, 0.95, 0.999] {
                let lux = Plane::filled(48, 32, l);
                let n = model.noise(&engine, &lux, 0.7, 9).unwrap();
                assert!(
                    n.data().iter().all(|v| v.is_finite() && (-1.0..=1.0).contains(v)),
                    "{} at {l}",
                    model.name()
                );
            }
        }
    }

    #[test]
    fn test_degenerate_fields() {
        let engine = ConvolutionEngine::new();
        for model in models() {
            for lux in [
                Plane::new(16, 16),
                Plane::filled(16, 16, 1.0),
                Plane::filled(16, 16, f32::NAN),
            ] {
                let n = model.noise(&engine, &lux, 0.5, 1).unwrap();
                assert!(n.is_finite(), "{}", model.name());
            }
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let engine = ConvolutionEngine::new();
        let lux = Plane::filled(32, 32, 0.3);
        for model in models() {
            let a = model.noise(&engine, &lux, 0.5, 42).unwrap();
            let b = model.noise(&engine, &lux, 0.5, 42).unwrap();
            let c = model.noise(&engine, &lux, 0.5, 43).unwrap();
            assert_eq!(a, b);
            assert_ne!(a, c);
        }
    }

    #[test]
    fn test_poisson_snr_rises_with_exposure() {
        let engine = ConvolutionEngine::new();
        let model = PoissonGrain::new(&GrainParams::default()).unwrap();
        let snr = |l: f32| {
            let lux = Plane::filled(128, 128, l);
            let n = model.noise(&engine, &lux, 1.0, 5).unwrap();
            // noise is relative deviation in units of 3 sigma at 18% grey
            let sigma_rel = std_dev(&n) * 3.0 / (1000.0f64 * 0.18).sqrt();
            1.0 / sigma_rel
        };
        let (dark, bright) = (snr(0.05), snr(0.95));
        assert!(bright > dark * 2.0, "snr {dark} vs {bright}");
    }

    #[test]
    fn test_poisson_noise_matches_shot_statistics() {
        let engine = ConvolutionEngine::new();
        let params = GrainParams {
            strategy: GrainStrategy::Poisson,
            size_px: 0.0,
            ..Default::default()
        };
        let model = PoissonGrain::new(&params).unwrap();
        // at 18% grey three sigma maps to 1, so the output std is 1/3
        let n = model.noise(&engine, &Plane::filled(128, 128, 0.18), 1.0, 11).unwrap();
        assert!((std_dev(&n) - 1.0 / 3.0).abs() < 0.02, "std {}", std_dev(&n));
        assert!(n.mean().abs() < 0.01);
        // four times the exposure halves the relative deviation
        let n = model.noise(&engine, &Plane::filled(128, 128, 0.72), 1.0, 11).unwrap();
        assert!((std_dev(&n) - 1.0 / 6.0).abs() < 0.01, "std {}", std_dev(&n));
    }

    #[test]
    fn test_only_artistic_follows_scene_sensitivity() {
        let engine = ConvolutionEngine::new();
        let lux = Plane::filled(32, 32, 0.4);
        let poisson = PoissonGrain::new(&GrainParams::default()).unwrap();
        assert!(!poisson.scene_sensitive());
        assert_eq!(
            poisson.noise(&engine, &lux, 0.1, 4).unwrap(),
            poisson.noise(&engine, &lux, 0.7, 4).unwrap()
        );

        let artistic = ArtisticGrain::new(&GrainParams::default());
        assert!(artistic.scene_sensitive());
        let low = artistic.noise(&engine, &lux, 0.1, 4).unwrap();
        let high = artistic.noise(&engine, &lux, 0.7, 4).unwrap();
        assert!(std_dev(&high) > std_dev(&low) * 5.0);
    }

    #[test]
    fn test_params_yaml() {
        let params: GrainParams =
            serde_yaml::from_str("strategy: poisson\nexposure_level: 400\n").unwrap();
        assert_eq!(params.strategy, GrainStrategy::Poisson);
        assert_eq!(params.exposure_level, 400.0);
        assert!(params.enabled);
        assert!(serde_yaml::from_str::<GrainParams>("strategy: film\n").is_err());
    }

    #[test]
    fn test_artistic_peaks_at_midtones() {
        let engine = ConvolutionEngine::new();
        let model = ArtisticGrain::new(&GrainParams::default());
        let amp = |l: f32| {
            let n = model.noise(&engine, &Plane::filled(96, 96, l), 0.7, 3).unwrap();
            std_dev(&n)
        };
        assert!(amp(0.5) > amp(0.05));
        assert!(amp(0.5) > amp(0.95));
        assert_eq!(ArtisticGrain::weight(0.5), 1.0);
        assert_eq!(ArtisticGrain::weight(0.0), 0.1);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("Poisson".parse::<GrainStrategy>().unwrap(), GrainStrategy::Poisson);
        assert_eq!("artistic".parse::<GrainStrategy>().unwrap(), GrainStrategy::Artistic);
        assert!("film".parse::<GrainStrategy>().is_err());
    }

    #[test]
    fn test_scene_sensitivity_clamped() {
        assert_eq!(scene_sensitivity(0.0), 0.70);
        assert!((scene_sensitivity(0.5) - 0.475).abs() < 1e-6);
        assert_eq!(scene_sensitivity(f32::NAN), 0.70);
    }
}
