//! Bloom: scattering of bright regions inside the emulsion.
//!
//! A [`BloomModel`] is chosen once per film profile and applied to the
//! per-layer planes in place:
//!
//! | model | energy | PSF |
//! |-------|--------|-----|
//! | [`NoBloom`] | untouched | - |
//! | [`ArtisticBloom`] | adds light | Gaussian |
//! | [`PhysicalBloom`] | conserved | Gaussian |
//! | [`WavelengthBloom`] | conserved per channel | dual core/tail, per wavelength |
//!
//! The conserving models move a fraction of the energy above a threshold
//! into a scattered layer, convolve it, and rescale the result to the energy
//! that went in, so `sum(output) == sum(input)` up to float rounding.

use std::fmt;

use rayon::prelude::*;
use tracing::{debug, trace};

use film_core::{Plane, REC709_LUMA};
use film_spectral::MieTable;

use crate::params::{BloomParams, WavelengthBloomParams};
use crate::{ConvolutionEngine, Kernel, OpsError, OpsResult};

/// A bloom strategy.
pub trait BloomModel: Send + Sync + fmt::Debug {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str;

    /// Applies bloom to one plane per emulsion layer (1 or 3 planes).
    fn apply(&self, engine: &ConvolutionEngine, planes: &mut [Plane]) -> OpsResult<()>;

    /// True if the model preserves each plane's total energy.
    fn conserves_energy(&self) -> bool {
        true
    }

    /// Applies the model to a spatially uniform field, one value per layer.
    ///
    /// A normalized PSF leaves a uniform field unchanged, so the default is
    /// the identity.
    fn uniform_response(&self, _values: &mut [f32]) {}
}

/// Moves `fraction` of the energy above `threshold` through `kernel`.
///
/// With `conserve` the blurred layer is rescaled to the energy removed, so the
/// plane total is unchanged. Planes with nothing above the threshold are left
/// as they are. The result is clamped at zero, since FFT round-off can leave
/// tiny negatives where the scattered light was subtracted.
pub(crate) fn scatter_highlights(
    engine: &ConvolutionEngine,
    plane: &mut Plane,
    threshold: f32,
    fraction: f32,
    kernel: &Kernel,
    conserve: bool,
) -> OpsResult<f64> {
    if !(fraction > 0.0) {
        return Ok(0.0);
    }
    let scattered = plane.map(|v| (v - threshold).max(0.0) * fraction);
    let energy_in = scattered.sum();
    if !(energy_in > 0.0) {
        return Ok(0.0);
    }

    let mut layer = engine.convolve(&scattered, kernel)?;
    if conserve {
        let energy_out = layer.sum();
        if energy_out > 1e-12 {
            layer.scale((energy_in / energy_out) as f32);
        } else {
            // nothing survived the convolution; keep the light where it was
            layer = scattered.clone();
        }
    }

    for ((p, &s), &l) in plane
        .data_mut()
        .iter_mut()
        .zip(scattered.data())
        .zip(layer.data())
    {
        *p = (*p - s + l).max(0.0);
    }
    Ok(energy_in)
}

fn check_planes(planes: &[Plane]) -> OpsResult<()> {
    if planes.len() != 1 && planes.len() != 3 {
        return Err(OpsError::SizeMismatch(format!(
            "expected 1 or 3 layer planes, got {}",
            planes.len()
        )));
    }
    for p in &planes[1..] {
        planes[0].ensure_same_size(p)?;
    }
    Ok(())
}

/// Leaves the planes untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBloom;

impl BloomModel for NoBloom {
    fn name(&self) -> &'static str {
        "none"
    }

    fn apply(&self, _engine: &ConvolutionEngine, planes: &mut [Plane]) -> OpsResult<()> {
        check_planes(planes)
    }
}

/// Luminance-weighted glow.
///
/// The highlight weight is `clamp(L, 0, 1)² · strength` with no hard
/// threshold; each channel gets `blur(c · weight)` added on top. This is a
/// look, not a physical model, and it adds light.
#[derive(Debug, Clone)]
pub struct ArtisticBloom {
    strength: f32,
    sigma_px: f32,
}

impl ArtisticBloom {
    /// Builds from the `strength` and `sigma_px` fields of `params`.
    pub fn new(params: &BloomParams) -> Self {
        Self {
            strength: params.strength.max(0.0),
            sigma_px: params.sigma_px,
        }
    }
}

impl BloomModel for ArtisticBloom {
    fn name(&self) -> &'static str {
        "artistic"
    }

    fn conserves_energy(&self) -> bool {
        false
    }

    fn uniform_response(&self, values: &mut [f32]) {
        let l = if values.len() == 3 {
            values.iter().zip(REC709_LUMA).map(|(v, w)| v * w).sum::<f32>()
        } else {
            values.first().copied().unwrap_or(0.0)
        };
        let l = l.clamp(0.0, 1.0);
        let w = l * l * self.strength;
        for v in values.iter_mut() {
            *v += v.max(0.0) * w;
        }
    }

    fn apply(&self, engine: &ConvolutionEngine, planes: &mut [Plane]) -> OpsResult<()> {
        check_planes(planes)?;
        if self.strength == 0.0 {
            return Ok(());
        }
        let luminance = if planes.len() == 3 {
            let mut l = planes[0].map(|v| v * REC709_LUMA[0]);
            for (c, p) in planes.iter().enumerate().skip(1) {
                for (a, &b) in l.data_mut().iter_mut().zip(p.data()) {
                    *a += b * REC709_LUMA[c];
                }
            }
            l
        } else {
            planes[0].clone()
        };
        let strength = self.strength;
        let weight = luminance.map(|l| {
            let l = l.clamp(0.0, 1.0);
            l * l * strength
        });

        planes.par_iter_mut().try_for_each(|plane| -> OpsResult<()> {
            let highlight = plane.zip_map(&weight, |v, w| v.max(0.0) * w)?;
            let glow = engine.blur(&highlight, self.sigma_px)?;
            for (p, &g) in plane.data_mut().iter_mut().zip(glow.data()) {
                *p = (*p + g).max(0.0);
            }
            Ok(())
        })
    }
}

/// Threshold-and-scatter bloom with a Gaussian PSF.
#[derive(Debug, Clone)]
pub struct PhysicalBloom {
    threshold: f32,
    scattering_ratio: f32,
    sigma_px: f32,
    energy_conservation: bool,
}

impl PhysicalBloom {
    /// Builds from `params`.
    pub fn new(params: &BloomParams) -> OpsResult<Self> {
        if !(0.0..=1.0).contains(&params.scattering_ratio) {
            return Err(OpsError::InvalidParameter(format!(
                "scattering_ratio must be in [0, 1], got {}",
                params.scattering_ratio
            )));
        }
        Ok(Self {
            threshold: params.threshold,
            scattering_ratio: params.scattering_ratio,
            sigma_px: params.sigma_px,
            energy_conservation: params.energy_conservation,
        })
    }
}

impl BloomModel for PhysicalBloom {
    fn name(&self) -> &'static str {
        "physical"
    }

    fn conserves_energy(&self) -> bool {
        self.energy_conservation
    }

    fn apply(&self, engine: &ConvolutionEngine, planes: &mut [Plane]) -> OpsResult<()> {
        check_planes(planes)?;
        let kernel = engine.gaussian_kernel(self.sigma_px, 0);
        planes.par_iter_mut().try_for_each(|plane| {
            scatter_highlights(
                engine,
                plane,
                self.threshold,
                self.scattering_ratio,
                &kernel,
                self.energy_conservation,
            )
            .map(|_| ())
        })
    }
}

/// Scattering parameters for one wavelength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelScatter {
    /// Effective wavelength in nm.
    pub wavelength_nm: f32,
    /// Scattered energy fraction η, at most 1.
    pub fraction: f32,
    /// PSF core sigma in pixels.
    pub sigma_px: f32,
    /// PSF tail decay per pixel.
    pub kappa: f32,
}

/// Bloom whose strength and spread depend on wavelength.
///
/// Shorter wavelengths scatter more and wider. Strength and width follow
/// separate power laws, and strength may be further weighted by the Mie
/// efficiency of the grain population at the film's ISO.
#[derive(Debug, Clone)]
pub struct WavelengthBloom {
    channels: [ChannelScatter; 3],
    mono: ChannelScatter,
    core_fraction: f32,
    radius_px: usize,
    threshold: f32,
}

impl WavelengthBloom {
    /// Builds per-channel PSFs, using the embedded Mie table when
    /// `params.use_mie_correction` is set.
    pub fn new(params: &WavelengthBloomParams, iso: f32) -> OpsResult<Self> {
        let table = if params.use_mie_correction {
            Some(MieTable::builtin()?)
        } else {
            None
        };
        Self::build(params, table.map(|t| (t, iso)))
    }

    /// Builds with an explicit Mie table.
    pub fn with_table(params: &WavelengthBloomParams, table: &MieTable, iso: f32) -> OpsResult<Self> {
        Self::build(params, Some((table, iso)))
    }

    fn build(params: &WavelengthBloomParams, mie: Option<(&MieTable, f32)>) -> OpsResult<Self> {
        params.validate()?;
        let reference = params.reference_wavelength_nm;
        let scatter = |wavelength_nm: f32| {
            let ratio = reference / wavelength_nm;
            let mut fraction = params.scattering_ratio * ratio.powf(params.energy_exponent);
            if let Some((table, iso)) = mie {
                fraction *= table.lookup(wavelength_nm, iso).eta;
            }
            let width = ratio.powf(params.width_exponent);
            ChannelScatter {
                wavelength_nm,
                fraction: fraction.clamp(0.0, 1.0),
                sigma_px: params.base_sigma_px * width,
                kappa: params.base_kappa / width,
            }
        };
        let channels = params.channel_wavelengths_nm.map(scatter);
        debug!(
            fractions = ?channels.map(|c| c.fraction),
            sigmas = ?channels.map(|c| c.sigma_px),
            mie = mie.is_some(),
            "wavelength bloom"
        );
        Ok(Self {
            channels,
            mono: scatter(reference),
            core_fraction: params.core_fraction,
            radius_px: params.radius_px,
            threshold: params.threshold,
        })
    }

    /// Parameters for the R, G, B channels.
    pub fn channels(&self) -> &[ChannelScatter; 3] {
        &self.channels
    }

    /// Parameters used for a single panchromatic plane.
    pub fn mono(&self) -> &ChannelScatter {
        &self.mono
    }
}

impl BloomModel for WavelengthBloom {
    fn name(&self) -> &'static str {
        "wavelength"
    }

    fn apply(&self, engine: &ConvolutionEngine, planes: &mut [Plane]) -> OpsResult<()> {
        check_planes(planes)?;
        let params: &[ChannelScatter] = if planes.len() == 3 {
            &self.channels
        } else {
            std::slice::from_ref(&self.mono)
        };
        planes
            .par_iter_mut()
            .zip(params.par_iter())
            .try_for_each(|(plane, p)| -> OpsResult<()> {
                let kernel =
                    engine.dual_kernel(p.sigma_px, p.kappa, self.core_fraction, self.radius_px)?;
                let moved =
                    scatter_highlights(engine, plane, self.threshold, p.fraction, &kernel, true)?;
                trace!(wavelength = p.wavelength_nm, moved, "wavelength bloom channel");
                Ok(())
            })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn point_source(size: usize, value: f32) -> Plane {
        let mut p = Plane::new(size, size);
        p.set(size / 2, size / 2, value);
        p
    }

    pub(crate) fn window_sum(p: &Plane, cx: usize, cy: usize, half: usize) -> f64 {
        let mut s = 0.0;
        for y in cy - half..cy + half {
            for x in cx - half..cx + half {
                s += p.get(x, y) as f64;
            }
        }
        s
    }

    /// Share of the kernel's weight landing inside a `2·half` window
    /// around the source.
    pub(crate) fn kernel_share_within(kernel: &Kernel, half: usize) -> f64 {
        let r = kernel.radius() as isize;
        let half = half as isize;
        let inside = |k: usize| (-half..half).contains(&(k as isize - r));
        let mut s = 0.0;
        for y in (0..kernel.size()).filter(|&y| inside(y)) {
            for x in (0..kernel.size()).filter(|&x| inside(x)) {
                s += kernel.at(x, y) as f64;
            }
        }
        s / kernel.sum()
    }

    fn physical() -> PhysicalBloom {
        PhysicalBloom::new(&BloomParams {
            sigma_px: 3.0,
            threshold: 0.5,
            scattering_ratio: 0.2,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_physical_conserves_energy_point_source() {
        let engine = ConvolutionEngine::new();
        let input = point_source(256, 20.0);
        let mut planes = vec![input.clone()];
        physical().apply(&engine, &mut planes).unwrap();

        let before = input.sum();
        let after = planes[0].sum();
        assert!(((after - before) / before).abs() < 1e-4);
        let w = window_sum(&planes[0], 128, 128, 32);
        assert!(((w - before) / before).abs() < 1e-4);
        // light actually moved
        assert!(planes[0].get(128, 128) < 20.0);
        assert!(planes[0].get(131, 128) > 0.0);
    }

    #[test]
    fn test_physical_conserves_energy_textured() {
        let engine = ConvolutionEngine::new();
        let data = (0..64 * 64)
            .map(|i| ((i % 17) as f32 / 8.0) * ((i / 64) as f32 / 40.0))
            .collect();
        let input = Plane::from_vec(64, 64, data).unwrap();
        let mut planes = vec![input.clone(), input.clone(), input.clone()];
        physical().apply(&engine, &mut planes).unwrap();
        for p in &planes {
            assert!(((p.sum() - input.sum()) / input.sum()).abs() < 1e-4);
        }
    }

    #[test]
    fn test_zero_input_stays_zero() {
        let engine = ConvolutionEngine::new();
        let models: Vec<Box<dyn BloomModel>> = vec![
            Box::new(NoBloom),
            Box::new(ArtisticBloom::new(&BloomParams::default())),
            Box::new(physical()),
            Box::new(WavelengthBloom::new(&WavelengthBloomParams::default(), 400.0).unwrap()),
        ];
        for model in models {
            let mut planes = vec![Plane::new(32, 32), Plane::new(32, 32), Plane::new(32, 32)];
            model.apply(&engine, &mut planes).unwrap();
            for p in &planes {
                assert!(p.data().iter().all(|&v| v == 0.0), "{}", model.name());
            }
        }
    }

    #[test]
    fn test_artistic_adds_light() {
        let engine = ConvolutionEngine::new();
        let model = ArtisticBloom::new(&BloomParams {
            strength: 0.5,
            sigma_px: 2.0,
            ..Default::default()
        });
        let mut planes = vec![Plane::filled(16, 16, 0.8)];
        model.apply(&engine, &mut planes).unwrap();
        assert!(planes[0].sum() > 0.8 * 256.0);
        assert!(!model.conserves_energy());
    }

    #[test]
    fn test_wavelength_bloom_blue_scatters_more_and_wider() {
        let model = WavelengthBloom::new(&WavelengthBloomParams::default(), 400.0).unwrap();
        let [r, g, b] = *model.channels();
        assert!(b.fraction > g.fraction && g.fraction > r.fraction);
        assert!(b.sigma_px > g.sigma_px && g.sigma_px > r.sigma_px);
        assert!((g.fraction - 0.08).abs() < 1e-6);
        assert_eq!(model.mono().wavelength_nm, 550.0);
    }

    #[test]
    fn test_wavelength_bloom_conserves_per_channel() {
        let engine = ConvolutionEngine::new();
        let params = WavelengthBloomParams {
            enabled: true,
            use_mie_correction: true,
            ..Default::default()
        };
        let model = WavelengthBloom::new(&params, 800.0).unwrap();
        let input = point_source(256, 30.0);
        let mut planes = vec![input.clone(), input.clone(), input.clone()];
        model.apply(&engine, &mut planes).unwrap();
        let before = input.sum();
        for (p, c) in planes.iter().zip(model.channels()) {
            assert!(((p.sum() - before) / before).abs() < 1e-4);
            assert!(p.data().iter().all(|&v| v >= 0.0));

            // the window keeps everything except the tail scattered past it
            let kernel = engine
                .dual_kernel(c.sigma_px, c.kappa, params.core_fraction, params.radius_px)
                .unwrap();
            let moved = (30.0 - params.threshold as f64) * c.fraction as f64;
            let expected = before - moved * (1.0 - kernel_share_within(&kernel, 32));
            let w = window_sum(p, 128, 128, 32);
            assert!(((w - expected) / before).abs() < 1e-4, "{w} vs {expected}");
            assert!(w < before);
        }
        // blue keeps less of its energy at the source
        assert!(planes[2].get(128, 128) < planes[0].get(128, 128));
    }

    #[test]
    fn test_wavelength_bloom_window_conserves_with_compact_psf() {
        let engine = ConvolutionEngine::new();
        let params = WavelengthBloomParams {
            enabled: true,
            use_mie_correction: true,
            radius_px: 24,
            ..Default::default()
        };
        let model = WavelengthBloom::new(&params, 800.0).unwrap();
        let input = point_source(256, 30.0);
        let mut planes = vec![input.clone(), input.clone(), input.clone()];
        model.apply(&engine, &mut planes).unwrap();
        let before = input.sum();
        for p in &planes {
            assert!(((p.sum() - before) / before).abs() < 1e-4);
            let w = window_sum(p, 128, 128, 32);
            assert!(((w - before) / before).abs() < 1e-4, "window {w}");
        }
    }

    #[test]
    fn test_scattered_output_never_negative() {
        let engine = ConvolutionEngine::new();
        let mut plane = point_source(128, 40.0);
        plane.set(20, 100, 5.0);
        let kernel = engine.dual_kernel(4.0, 0.05, 0.5, 50).unwrap();
        scatter_highlights(&engine, &mut plane, 0.0, 0.5, &kernel, true).unwrap();
        assert!(plane.data().iter().all(|&v| v >= 0.0));
        assert!(((plane.sum() - 45.0) / 45.0).abs() < 1e-4);
    }

    #[test]
    fn test_wavelength_bloom_requires_decoupled_exponents() {
        let params = WavelengthBloomParams {
            energy_exponent: 2.0,
            width_exponent: 2.0,
            ..Default::default()
        };
        assert!(matches!(
            WavelengthBloom::new(&params, 100.0),
            Err(OpsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_plane_count_checked() {
        let engine = ConvolutionEngine::new();
        let mut planes = vec![Plane::new(4, 4), Plane::new(4, 4)];
        assert!(NoBloom.apply(&engine, &mut planes).is_err());
        let mut planes = vec![Plane::new(4, 4), Plane::new(4, 5), Plane::new(4, 4)];
        assert!(physical().apply(&engine, &mut planes).is_err());
    }

    #[test]
    fn test_uniform_response_matches_apply() {
        let engine = ConvolutionEngine::new();
        let artistic = ArtisticBloom::new(&BloomParams {
            strength: 0.3,
            sigma_px: 2.0,
            ..Default::default()
        });
        let values = [0.6f32, 0.4, 0.2];
        let mut planes: Vec<Plane> = values.iter().map(|&v| Plane::filled(16, 16, v)).collect();
        artistic.apply(&engine, &mut planes).unwrap();
        let mut uniform = values;
        artistic.uniform_response(&mut uniform);
        for (p, u) in planes.iter().zip(uniform) {
            assert!((p.get(8, 8) - u).abs() < 1e-5, "{} vs {u}", p.get(8, 8));
        }

        let mut same = values;
        physical().uniform_response(&mut same);
        assert_eq!(same, values);
    }
}
