//! Hurter-Driffield characteristic curve.
//!
//! Exposure is measured in units of `threshold_exposure` (E₀), the exposure
//! at which the straight-line section meets base-plus-fog density:
//!
//! ```text
//! D_lin = D_min + γ · log10(E / E₀)
//! toe       D = D_min + w_t · softplus((D_lin − D_min) / w_t)   → D_min as E → 0
//! shoulder  D = D_max − w_s · softplus((D_max − D) / w_s)       → D_max as E → ∞
//! T = 10^(−D), clipped to [0, 1]
//! ```
//!
//! A disabled toe or shoulder becomes a hard clamp. A disabled curve is the
//! identity on its input.
//!
//! Zero, negative, NaN and infinite exposures all map to finite densities.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use film_core::Plane;
use film_math::softplus;

use crate::{EmulsionError, EmulsionResult};

/// Characteristic curve parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HdCurveParams {
    /// When false the curve is the identity.
    pub enabled: bool,
    /// Slope of the straight-line section.
    pub gamma: f32,
    /// Base-plus-fog density.
    pub d_min: f32,
    /// Maximum density.
    pub d_max: f32,
    /// Exposure E₀ where the straight line reaches `d_min`.
    pub threshold_exposure: f32,
    /// Soft toe toward `d_min`.
    pub toe_enabled: bool,
    /// Toe softness in density units.
    pub toe_width: f32,
    /// Soft shoulder toward `d_max`.
    pub shoulder_enabled: bool,
    /// Shoulder softness in density units.
    pub shoulder_width: f32,
}

impl Default for HdCurveParams {
    fn default() -> Self {
        Self {
            enabled: true,
            gamma: 0.65,
            d_min: 0.12,
            d_max: 3.0,
            threshold_exposure: 1e-3,
            toe_enabled: true,
            toe_width: 0.25,
            shoulder_enabled: true,
            shoulder_width: 0.2,
        }
    }
}

impl HdCurveParams {
    /// Identity curve.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Checks the curve is well formed.
    pub fn validate(&self) -> EmulsionResult<()> {
        if !(self.gamma > 0.0) {
            return Err(EmulsionError::InvalidParameter(format!(
                "H&D gamma must be positive, got {}",
                self.gamma
            )));
        }
        if !(self.d_min >= 0.0 && self.d_max > self.d_min) {
            return Err(EmulsionError::InvalidParameter(format!(
                "H&D densities need 0 <= d_min < d_max, got {} and {}",
                self.d_min, self.d_max
            )));
        }
        if !(self.threshold_exposure > 0.0) {
            return Err(EmulsionError::InvalidParameter(format!(
                "threshold_exposure must be positive, got {}",
                self.threshold_exposure
            )));
        }
        if !(self.toe_width > 0.0 && self.shoulder_width > 0.0) {
            return Err(EmulsionError::InvalidParameter(
                "toe_width and shoulder_width must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[inline]
fn sanitize_exposure(e: f32) -> f32 {
    if e.is_nan() || e <= 0.0 {
        f32::MIN_POSITIVE
    } else if e.is_infinite() {
        f32::MAX
    } else {
        e
    }
}

/// Optical density for `exposure`, ignoring `enabled`.
pub fn density(exposure: f32, params: &HdCurveParams) -> f32 {
    let e = sanitize_exposure(exposure) as f64 / params.threshold_exposure as f64;
    let mut d = params.d_min + params.gamma * e.log10() as f32;

    if params.toe_enabled {
        let w = params.toe_width;
        d = params.d_min + w * softplus((d - params.d_min) / w);
    } else {
        d = d.max(params.d_min);
    }

    if params.shoulder_enabled {
        let w = params.shoulder_width;
        d = params.d_max - w * softplus((params.d_max - d) / w);
    } else {
        d = d.min(params.d_max);
    }
    d
}

/// Maps exposure to negative transmittance in [0, 1].
///
/// ```rust
/// use film_emulsion::{apply_hd_curve, HdCurveParams};
///
/// let p = HdCurveParams::default();
/// assert!(apply_hd_curve(0.1, &p) > apply_hd_curve(1.0, &p));
/// assert_eq!(apply_hd_curve(0.42, &HdCurveParams::disabled()), 0.42);
/// ```
#[inline]
pub fn apply_hd_curve(exposure: f32, params: &HdCurveParams) -> f32 {
    if !params.enabled {
        return exposure;
    }
    10f32.powf(-density(exposure, params)).clamp(0.0, 1.0)
}

/// [`apply_hd_curve`] over a plane.
pub fn apply_hd_curve_plane(plane: &Plane, params: &HdCurveParams) -> Plane {
    let mut out = plane.clone();
    if params.enabled {
        out.data_mut()
            .par_iter_mut()
            .for_each(|v| *v = apply_hd_curve(*v, params));
    }
    out
}

/// Recovers the print-side linear value from a negative transmittance.
///
/// Inverts the straight-line section only, so exposures on the straight
/// line come back unchanged while the toe and shoulder keep their
/// compression.
#[inline]
pub fn negative_to_positive(transmittance: f32, params: &HdCurveParams) -> f32 {
    if !params.enabled {
        return transmittance;
    }
    let t = if transmittance.is_nan() {
        1.0
    } else {
        transmittance.clamp(1e-30, 1.0)
    };
    let d = -t.log10();
    params.threshold_exposure * 10f32.powf((d - params.d_min) / params.gamma)
}
