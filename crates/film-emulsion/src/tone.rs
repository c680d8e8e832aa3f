//! Tone mapping from the HDR layer composite to display values in [0, 1].
//!
//! - Reinhard: `m = x·exposure; m = m²/(1 + m); m^(1/γ)`
//! - Filmic: Hable's rational curve normalised by its white point, then
//!   `^(1/γ)`. Keeps more shadow gradation than Reinhard and rolls the
//!   highlights off instead of clipping them.
//!
//! Both are monotone, bounded to [0, 1] and map NaN and negatives to 0.

use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use film_core::Plane;

use crate::{EmulsionError, EmulsionResult};

/// Tone curve family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneStyle {
    /// Extended Reinhard.
    Reinhard,
    /// Hable filmic.
    #[default]
    Filmic,
}

impl FromStr for ToneStyle {
    type Err = EmulsionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reinhard" => Ok(Self::Reinhard),
            "filmic" => Ok(Self::Filmic),
            _ => Err(EmulsionError::UnknownVariant {
                kind: "tone mapping style",
                name: s.to_string(),
                expected: "reinhard, filmic",
            }),
        }
    }
}

/// Tone mapping parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneMappingParams {
    /// Curve family.
    pub style: ToneStyle,
    /// Exposure multiplier applied first.
    pub exposure: f32,
    /// Display gamma.
    pub gamma: f32,
    /// Filmic A: shoulder strength.
    pub shoulder_strength: f32,
    /// Filmic B: linear strength.
    pub linear_strength: f32,
    /// Filmic C: linear angle.
    pub linear_angle: f32,
    /// Filmic D: toe strength.
    pub toe_strength: f32,
    /// Filmic E: toe numerator.
    pub toe_numerator: f32,
    /// Filmic F: toe denominator.
    pub toe_denominator: f32,
    /// Filmic linear white point.
    pub white_point: f32,
}

impl Default for ToneMappingParams {
    fn default() -> Self {
        Self {
            style: ToneStyle::Filmic,
            exposure: 1.0,
            gamma: 2.2,
            shoulder_strength: 0.22,
            linear_strength: 0.30,
            linear_angle: 0.10,
            toe_strength: 0.20,
            toe_numerator: 0.01,
            toe_denominator: 0.30,
            white_point: 11.2,
        }
    }
}

/// A configured tone curve.
#[derive(Debug, Clone)]
pub struct ToneMapper {
    params: ToneMappingParams,
    inv_gamma: f32,
    white_scale: f32,
}

impl ToneMapper {
    /// Validates `params` and precomputes the white-point normalisation.
    pub fn new(params: &ToneMappingParams) -> EmulsionResult<Self> {
        if !(params.gamma > 0.0 && params.exposure > 0.0) {
            return Err(EmulsionError::InvalidParameter(format!(
                "tone gamma and exposure must be positive, got {} and {}",
                params.gamma, params.exposure
            )));
        }
        let mut mapper = Self {
            params: params.clone(),
            inv_gamma: 1.0 / params.gamma,
            white_scale: 1.0,
        };
        if params.style == ToneStyle::Filmic {
            if !(params.toe_denominator > 0.0 && params.white_point > 0.0) {
                return Err(EmulsionError::InvalidParameter(
                    "filmic toe_denominator and white_point must be positive".into(),
                ));
            }
            let white = mapper.hable(params.white_point);
            if !(white > 0.0) {
                return Err(EmulsionError::InvalidParameter(format!(
                    "filmic curve is not positive at white point {}",
                    params.white_point
                )));
            }
            mapper.white_scale = 1.0 / white;
        }
        Ok(mapper)
    }

    /// Parameters in use.
    pub fn params(&self) -> &ToneMappingParams {
        &self.params
    }

    fn hable(&self, x: f32) -> f32 {
        let p = &self.params;
        let (a, b, c) = (p.shoulder_strength, p.linear_strength, p.linear_angle);
        let (d, e, f) = (p.toe_strength, p.toe_numerator, p.toe_denominator);
        (x * (a * x + c * b) + d * e) / (x * (a * x + b) + d * f) - e / f
    }

    /// Maps one linear value to display.
    #[inline]
    pub fn map(&self, x: f32) -> f32 {
        let x = x * self.params.exposure;
        if !(x > 0.0) {
            return 0.0;
        }
        let m = match self.params.style {
            ToneStyle::Reinhard => {
                if x.is_infinite() {
                    1.0
                } else {
                    x * x / (1.0 + x)
                }
            }
            ToneStyle::Filmic => {
                if x >= self.params.white_point {
                    1.0
                } else {
                    self.hable(x) * self.white_scale
                }
            }
        };
        m.clamp(0.0, 1.0).powf(self.inv_gamma)
    }

    /// Maps a plane in place.
    pub fn map_plane(&self, plane: &mut Plane) {
        plane
            .data_mut()
            .par_iter_mut()
            .for_each(|v| *v = self.map(*v));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mappers() -> Vec<ToneMapper> {
        [ToneStyle::Reinhard, ToneStyle::Filmic]
            .into_iter()
            .map(|style| {
                ToneMapper::new(&ToneMappingParams {
                    style,
                    ..Default::default()
                })
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_monotone_and_bounded() {
        for m in mappers() {
            let mut prev = m.map(0.0);
            assert_eq!(prev, 0.0);
            for i in 1..=400 {
                let x = i as f32 * 0.05;
                let y = m.map(x);
                assert!((0.0..=1.0).contains(&y));
                assert!(y >= prev, "{:?} not monotone at {x}", m.params().style);
                prev = y;
            }
        }
    }

    #[test]
    fn test_degenerate_inputs() {
        for m in mappers() {
            assert_eq!(m.map(f32::NAN), 0.0);
            assert_eq!(m.map(-5.0), 0.0);
            assert_eq!(m.map(f32::INFINITY), 1.0);
        }
    }

    #[test]
    fn test_reinhard_formula() {
        let m = ToneMapper::new(&ToneMappingParams {
            style: ToneStyle::Reinhard,
            exposure: 2.0,
            gamma: 1.0,
            ..Default::default()
        })
        .unwrap();
        // m = 0.5 * 2 = 1, 1 / 2
        assert!((m.map(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_filmic_white_point_is_one() {
        let all = mappers();
        let m = &all[1];
        assert_eq!(m.map(11.2), 1.0);
        assert!(m.map(11.0) < 1.0);
        assert!(m.map(0.18) < 0.5);
    }

    #[test]
    fn test_style_from_str() {
        assert_eq!("Reinhard".parse::<ToneStyle>().unwrap(), ToneStyle::Reinhard);
        assert_eq!("filmic".parse::<ToneStyle>().unwrap(), ToneStyle::Filmic);
        assert!("aces".parse::<ToneStyle>().is_err());
    }

    #[test]
    fn test_rejects_bad_gamma() {
        let p = ToneMappingParams {
            gamma: 0.0,
            ..Default::default()
        };
        assert!(ToneMapper::new(&p).is_err());
    }
}
