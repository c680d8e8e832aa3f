//! Scalar interpolation and smooth clamping.
//!
//! # Usage
//!
//! ```rust
//! use film_math::{lerp, softplus, smoothstep};
//!
//! assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
//! assert!(softplus(-30.0) > 0.0);
//! assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
//! ```

/// Linear interpolation between two values.
///
/// `a + (b - a) * t`; extrapolates for `t` outside [0, 1].
///
/// ```rust
/// use film_math::lerp;
///
/// assert_eq!(lerp(0.0, 10.0, 1.0), 10.0);
/// ```
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Inverse linear interpolation; returns 0 for a degenerate range.
#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() < 1e-10 {
        0.0
    } else {
        (value - a) / (b - a)
    }
}

/// Clamps a value to [0, 1]. NaN maps to 0.
#[inline]
pub fn saturate(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Hermite smoothstep between `edge0` and `edge1`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = saturate(inverse_lerp(edge0, edge1, x));
    t * t * (3.0 - 2.0 * t)
}

/// Numerically stable `ln(1 + e^x)`.
///
/// Behaves like `max(x, 0)` far from the origin and is smooth near it, which
/// makes it the blending function for the toe and shoulder of the
/// characteristic curve.
///
/// ```rust
/// use film_math::softplus;
///
/// assert!((softplus(0.0) - std::f32::consts::LN_2).abs() < 1e-6);
/// assert_eq!(softplus(50.0), 50.0);
/// ```
#[inline]
pub fn softplus(x: f32) -> f32 {
    if x > 20.0 {
        x
    } else if x < -20.0 {
        x.exp()
    } else {
        x.exp().ln_1p()
    }
}

/// Linear interpolation in a sorted sample table, clamped at both ends.
///
/// `xs` must be strictly increasing and the same length as `ys`; an empty
/// table yields 0.
pub fn interp_clamped(xs: &[f32], ys: &[f32], x: f32) -> f32 {
    let n = xs.len().min(ys.len());
    if n == 0 {
        return 0.0;
    }
    if n == 1 || x <= xs[0] || x.is_nan() {
        return ys[0];
    }
    if x >= xs[n - 1] {
        return ys[n - 1];
    }
    let i = xs[..n].partition_point(|&v| v <= x).saturating_sub(1).min(n - 2);
    let t = inverse_lerp(xs[i], xs[i + 1], x);
    lerp(ys[i], ys[i + 1], t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_inverse() {
        assert_eq!(inverse_lerp(0.0, 10.0, 5.0), 0.5);
        assert_eq!(inverse_lerp(1.0, 1.0, 5.0), 0.0);
        assert_eq!(lerp(2.0, 4.0, 0.25), 2.5);
    }

    #[test]
    fn test_saturate_nan() {
        assert_eq!(saturate(f32::NAN), 0.0);
        assert_eq!(saturate(1.5), 1.0);
        assert_eq!(saturate(-0.5), 0.0);
    }

    #[test]
    fn test_softplus_limits() {
        assert!(softplus(-100.0) >= 0.0);
        assert!(softplus(-100.0) < 1e-30);
        assert_eq!(softplus(100.0), 100.0);
        // Monotone across the switch points
        assert!(softplus(20.0) <= softplus(20.001));
        assert!(softplus(-20.001) <= softplus(-20.0));
        for i in -50..50 {
            let x = i as f32;
            assert!(softplus(x) >= x.max(0.0));
        }
    }

    #[test]
    fn test_interp_clamped() {
        let xs = [0.0, 1.0, 3.0];
        let ys = [0.0, 10.0, 30.0];
        assert_eq!(interp_clamped(&xs, &ys, -1.0), 0.0);
        assert_eq!(interp_clamped(&xs, &ys, 5.0), 30.0);
        assert!((interp_clamped(&xs, &ys, 2.0) - 20.0).abs() < 1e-6);
        assert!((interp_clamped(&xs, &ys, 0.5) - 5.0).abs() < 1e-6);
        assert_eq!(interp_clamped(&[], &[], 0.5), 0.0);
    }
}
