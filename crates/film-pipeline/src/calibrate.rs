//! Exposure calibration.
//!
//! Solves one gain per emulsion layer so a uniform display mid-grey input
//! renders as display mid-grey. Each gain is found by bisection in log space
//! with the others held fixed; a few Gauss-Seidel rounds settle the coupling
//! introduced by luminance-weighted bloom.

use tracing::debug;

/// Display value that must map to itself.
pub const CALIBRATION_GREY: f32 = 0.5;

const GAIN_MIN: f32 = 1e-4;
const GAIN_MAX: f32 = 1e4;
const ROUNDS: usize = 4;
const STEPS: usize = 48;

/// Solves per-layer gains for `eval`, which maps gains to per-layer display
/// values of the calibration grey.
///
/// `eval` must be non-decreasing in each layer's own gain. A target out of
/// reach pins the gain to the range edge.
pub fn solve_gains<F>(layers: usize, eval: F) -> Vec<f32>
where
    F: Fn(&[f32]) -> Vec<f32>,
{
    let mut gains = vec![1.0f32; layers];
    let rounds = if layers > 1 { ROUNDS } else { 1 };
    let (ln_min, ln_max) = (GAIN_MIN.ln(), GAIN_MAX.ln());

    for _ in 0..rounds {
        for c in 0..layers {
            let output = |ln_g: f32| {
                let mut trial = gains.clone();
                trial[c] = ln_g.exp();
                eval(&trial).get(c).copied().unwrap_or(0.0)
            };

            if output(ln_max) < CALIBRATION_GREY {
                debug!(layer = c, "calibration grey out of reach, gain pinned high");
                gains[c] = GAIN_MAX;
                continue;
            }
            if output(ln_min) > CALIBRATION_GREY {
                debug!(layer = c, "calibration grey out of reach, gain pinned low");
                gains[c] = GAIN_MIN;
                continue;
            }

            let (mut lo, mut hi) = (ln_min, ln_max);
            for _ in 0..STEPS {
                let mid = 0.5 * (lo + hi);
                if output(mid) < CALIBRATION_GREY {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            gains[c] = (0.5 * (lo + hi)).exp();
        }
    }
    gains
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_independent_layers() {
        // out_c = min(k_c · g_c, 1)
        let k = [0.25f32, 1.0, 4.0];
        let gains = solve_gains(3, |g| g.iter().zip(k).map(|(g, k)| (g * k).min(1.0)).collect());
        assert_relative_eq!(gains[0], 2.0, max_relative = 1e-4);
        assert_relative_eq!(gains[1], 0.5, max_relative = 1e-4);
        assert_relative_eq!(gains[2], 0.125, max_relative = 1e-4);
    }

    #[test]
    fn test_coupled_layers_converge() {
        // each output gets a small share of the others
        let eval = |g: &[f32]| -> Vec<f32> {
            let total: f32 = g.iter().sum();
            g.iter().map(|&v| (0.9 * v + 0.05 * total).min(1.0)).collect()
        };
        let gains = solve_gains(3, eval);
        for v in eval(&gains) {
            assert!((v - CALIBRATION_GREY).abs() < 1e-3, "{v}");
        }
    }

    #[test]
    fn test_unreachable_target_pins() {
        let gains = solve_gains(1, |_| vec![0.1]);
        assert_eq!(gains, vec![GAIN_MAX]);
        let gains = solve_gains(1, |_| vec![0.9]);
        assert_eq!(gains, vec![GAIN_MIN]);
    }
}
