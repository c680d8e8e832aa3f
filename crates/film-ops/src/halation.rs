//! Halation: light that crosses the emulsion and base, reflects off the
//! pressure plate, and re-exposes the emulsion from behind.
//!
//! The returning fraction per channel is
//!
//! ```text
//! f = (T_emulsion · T_base · T_antihalation)² · R_backplate
//! ```
//!
//! squared because the light crosses the stack twice. The halo is
//! `f · max(c − threshold, 0)` spread by a wide dual PSF and renormalised to
//! its input energy; the source loses the same amount, so the stage conserves
//! energy. The anti-halation layer absorbs blue far more than red, which is
//! where the red fringe of stocks without it comes from.

use rayon::prelude::*;
use tracing::debug;

use film_core::Plane;

use crate::bloom::scatter_highlights;
use crate::params::HalationParams;
use crate::{ConvolutionEngine, OpsError, OpsResult};

/// Beer-Lambert transmittance `exp(-α·d)` through a layer of thickness `d`.
///
/// ```rust
/// use film_ops::beer_lambert_transmittance;
///
/// assert_eq!(beer_lambert_transmittance(0.0, 5.0), 1.0);
/// assert!((beer_lambert_transmittance(0.1, 10.0) - (-1.0f32).exp()).abs() < 1e-6);
/// ```
#[inline]
pub fn beer_lambert_transmittance(alpha: f32, thickness: f32) -> f32 {
    (-(alpha.max(0.0)) * thickness.max(0.0)).exp()
}

/// Configured halation stage.
#[derive(Debug, Clone)]
pub struct Halation {
    fractions: [f32; 3],
    threshold: f32,
    sigma_px: f32,
    kappa: f32,
    core_fraction: f32,
    radius_px: usize,
}

impl Halation {
    /// Validates `params` and precomputes the per-channel fractions.
    pub fn new(params: &HalationParams) -> OpsResult<Self> {
        params.validate()?;
        if params.psf_radius_px == 0 {
            return Err(OpsError::InvalidParameter(
                "halation psf_radius_px must be at least 1".into(),
            ));
        }
        let fractions = params.effective_fraction();
        debug!(?fractions, "halation");
        Ok(Self {
            fractions,
            threshold: params.threshold,
            sigma_px: params.psf_sigma_px,
            kappa: params.psf_kappa,
            core_fraction: params.psf_core_fraction,
            radius_px: params.psf_radius_px,
        })
    }

    /// Returning fraction for R, G, B.
    pub fn fractions(&self) -> [f32; 3] {
        self.fractions
    }

    /// Returning fraction for a panchromatic plane: the channel mean.
    pub fn mono_fraction(&self) -> f32 {
        self.fractions.iter().sum::<f32>() / 3.0
    }

    /// Adds the halo to one plane per layer (1 or 3 planes), in place.
    pub fn apply(&self, engine: &ConvolutionEngine, planes: &mut [Plane]) -> OpsResult<()> {
        let mono = [self.mono_fraction()];
        let fractions: &[f32] = match planes.len() {
            3 => &self.fractions,
            1 => &mono,
            n => {
                return Err(OpsError::SizeMismatch(format!(
                    "expected 1 or 3 layer planes, got {n}"
                )));
            }
        };
        let kernel =
            engine.dual_kernel(self.sigma_px, self.kappa, self.core_fraction, self.radius_px)?;
        planes
            .par_iter_mut()
            .zip(fractions.par_iter())
            .try_for_each(|(plane, &f)| {
                scatter_highlights(engine, plane, self.threshold, f, &kernel, true).map(|_| ())
            })
    }
}
