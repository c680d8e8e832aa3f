//! Reciprocity failure (Schwarzschild law).
//!
//! Inside the reciprocity window exposure is simply intensity × time. Past
//! either edge the film loses speed: effective exposure scales by
//! `(t / t_edge)^(p − 1)` for long exposures and `(t_edge / t)^(p − 1)` for
//! short ones, with `p < 1` the Schwarzschild exponent.

use serde::{Deserialize, Serialize};

/// Schwarzschild reciprocity parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReciprocityParams {
    /// Master switch.
    pub enabled: bool,
    /// Shutter time in seconds.
    pub exposure_time_s: f32,
    /// Schwarzschild exponent `p`, usually in (0, 1].
    pub schwarzschild_exponent: f32,
    /// Shortest time without failure.
    pub min_time_s: f32,
    /// Longest time without failure.
    pub max_time_s: f32,
}

impl Default for ReciprocityParams {
    fn default() -> Self {
        Self {
            enabled: false,
            exposure_time_s: 1.0 / 125.0,
            schwarzschild_exponent: 0.9,
            min_time_s: 1e-4,
            max_time_s: 1.0,
        }
    }
}

impl ReciprocityParams {
    /// Multiplier applied to exposure before the characteristic curve.
    ///
    /// ```rust
    /// use film_emulsion::ReciprocityParams;
    ///
    /// let long = ReciprocityParams {
    ///     enabled: true,
    ///     exposure_time_s: 30.0,
    ///     ..Default::default()
    /// };
    /// assert!(long.exposure_factor() < 1.0);
    /// assert_eq!(ReciprocityParams::default().exposure_factor(), 1.0);
    /// ```
    pub fn exposure_factor(&self) -> f32 {
        let t = self.exposure_time_s;
        if !self.enabled || !(t > 0.0) || !t.is_finite() {
            return 1.0;
        }
        let exponent = self.schwarzschild_exponent - 1.0;
        let factor = if t > self.max_time_s && self.max_time_s > 0.0 {
            (t / self.max_time_s).powf(exponent)
        } else if t < self.min_time_s {
            (self.min_time_s / t).powf(exponent)
        } else {
            1.0
        };
        if factor.is_finite() { factor } else { 1.0 }
    }
}
