//! sRGB transfer function (IEC 61966-2-1).
//!
//! Pipeline input is display-encoded; every physical stage runs on the linear
//! values produced by [`eotf`], and [`oetf`] is applied only at the very end.

/// Decodes an sRGB value to linear light.
///
/// ```text
/// V <= 0.04045 : L = V / 12.92
/// otherwise    : L = ((V + 0.055) / 1.055)^2.4
/// ```
///
/// ```rust
/// use film_spectral::srgb::eotf;
///
/// assert!((eotf(0.5) - 0.214).abs() < 0.001);
/// ```
#[inline]
pub fn eotf(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Encodes linear light to sRGB, clamping to [0, 1] first.
///
/// NaN encodes to 0.
#[inline]
pub fn oetf(l: f32) -> f32 {
    let l = if l.is_nan() { 0.0 } else { l.clamp(0.0, 1.0) };
    if l <= 0.0031308 {
        l * 12.92
    } else {
        1.055 * l.powf(1.0 / 2.4) - 0.055
    }
}

/// Applies [`eotf`] to a triplet.
#[inline]
pub fn eotf_rgb(rgb: [f32; 3]) -> [f32; 3] {
    rgb.map(eotf)
}

/// Applies [`oetf`] to a triplet.
#[inline]
pub fn oetf_rgb(rgb: [f32; 3]) -> [f32; 3] {
    rgb.map(oetf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for i in 0..=100 {
            let v = i as f32 / 100.0;
            assert!((oetf(eotf(v)) - v).abs() < 1e-5, "v = {v}");
        }
    }

    #[test]
    fn test_segment_continuity() {
        let a = eotf(0.04045);
        let b = eotf(0.04046);
        assert!((a - b).abs() < 1e-5);
    }

    #[test]
    fn test_oetf_clamps() {
        assert_eq!(oetf(-1.0), 0.0);
        assert!((oetf(4.0) - 1.0).abs() < 1e-6);
        assert_eq!(oetf(f32::NAN), 0.0);
    }
}
