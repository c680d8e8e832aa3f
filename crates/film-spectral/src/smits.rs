//! Smits RGB-to-spectrum construction.
//!
//! A linear RGB triplet is expressed as a non-negative combination of at most
//! three of seven basis spectra (white, the three secondaries and the three
//! primaries): white carries the smallest component, one secondary carries
//! the next, and one primary carries the rest.
//!
//! The basis shipped here is calibrated against the band-sampled CIE 1931
//! observer and D65 in [`crate::cie`], so every basis spectrum integrates to
//! exactly its nominal linear sRGB colour. The classical basis is only within
//! a few percent of that; the remaining error of the method is per-hue
//! metamerism, not integration mismatch.
//!
//! # Example
//!
//! ```rust
//! use film_spectral::rgb_to_spectrum;
//!
//! let black = rgb_to_spectrum([0.0, 0.0, 0.0]);
//! assert!(black.samples().iter().all(|&v| v == 0.0));
//! ```

use crate::spectrum::Spectrum;

const WHITE: Spectrum = Spectrum([
    1.000006, 1.000040, 1.000248, 1.001055, 1.002499, 1.003700, 1.003945, 1.002931,
    1.001831, 1.001467, 1.001826, 1.001906, 1.001500, 1.000704, 0.999581, 0.998201,
    0.997267, 0.996793, 0.997130, 0.998083, 0.998881, 0.999455, 0.999753, 0.999908,
    0.999966, 0.999986, 0.999995, 0.999998, 0.999999, 1.000000, 1.000000,
]);

const CYAN: Spectrum = Spectrum([
    0.971016, 0.971116, 0.963638, 0.954782, 0.953387, 0.978739, 1.000793, 1.005989,
    1.003442, 1.003011, 1.005007, 1.008936, 1.013283, 1.017773, 1.021460, 0.702149,
    0.370940, 0.153444, 0.087486, 0.019442, 0.006679, 0.003204, 0.001446, 0.000539,
    0.000197, 0.000082, 0.000031, 0.000013, 0.000004, 0.000002, 0.000001,
]);

const MAGENTA: Spectrum = Spectrum([
    1.000065, 1.000463, 1.002863, 1.012100, 1.025547, 1.024096, 1.009435, 0.806049,
    0.496739, 0.206225, 0.104625, 0.005241, 0.000000, 0.000000, 0.009105, 0.318417,
    0.637749, 0.849808, 0.919306, 0.987221, 0.997559, 0.998904, 0.998994, 0.997692,
    0.996198, 0.995873, 0.995890, 0.995896, 0.995899, 0.995899, 0.995900,
]);

const YELLOW: Spectrum = Spectrum([
    0.000019, 0.000000, 0.000000, 0.000000, 0.000000, 0.002670, 0.049087, 0.221350,
    0.459278, 0.685301, 0.829228, 0.967900, 1.029128, 1.021537, 1.009630, 0.996198,
    0.985386, 0.972423, 0.957224, 0.947279, 0.954112, 0.962008, 0.968714, 0.975894,
    0.982391, 0.983900, 0.983962, 0.983985, 0.983995, 0.983998, 0.983999,
]);

const RED: Spectrum = Spectrum([
    0.101202, 0.101215, 0.087137, 0.067643, 0.045383, 0.016330, 0.000000, 0.000000,
    0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.207729,
    0.597669, 0.857117, 0.948639, 1.020508, 1.025066, 1.020301, 1.017416, 1.015857,
    1.015253, 1.015047, 1.014956, 1.014923, 1.014907, 1.014903, 1.014901,
]);

const GREEN: Spectrum = Spectrum([
    0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.136636,
    0.483901, 0.797374, 0.899530, 0.995518, 1.027601, 1.003643, 0.974425, 0.671467,
    0.359800, 0.150912, 0.079083, 0.009653, 0.000402, 0.000112, 0.000358, 0.001310,
    0.002283, 0.002502, 0.002501, 0.002500, 0.002500, 0.002500, 0.002500,
]);

const BLUE: Spectrum = Spectrum([
    1.000081, 1.000579, 1.003573, 1.015056, 1.026659, 0.996536, 0.949234, 0.774729,
    0.533305, 0.302194, 0.152271, 0.007899, 0.000000, 0.000000, 0.000000, 0.000000,
    0.000000, 0.015871, 0.033169, 0.044428, 0.046591, 0.048189, 0.049798, 0.049477,
    0.049669, 0.049676, 0.049629, 0.049612, 0.049604, 0.049601, 0.049601,
]);

/// One of the seven basis spectra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Basis {
    /// Flat reflector.
    White,
    /// Green + blue.
    Cyan,
    /// Red + blue.
    Magenta,
    /// Red + green.
    Yellow,
    /// Long-wave primary.
    Red,
    /// Mid-wave primary.
    Green,
    /// Short-wave primary.
    Blue,
}

impl Basis {
    /// All basis spectra in declaration order.
    pub const ALL: [Basis; 7] = [
        Basis::White,
        Basis::Cyan,
        Basis::Magenta,
        Basis::Yellow,
        Basis::Red,
        Basis::Green,
        Basis::Blue,
    ];

    /// Position in [`Basis::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The basis spectrum.
    pub fn spectrum(self) -> &'static Spectrum {
        match self {
            Basis::White => &WHITE,
            Basis::Cyan => &CYAN,
            Basis::Magenta => &MAGENTA,
            Basis::Yellow => &YELLOW,
            Basis::Red => &RED,
            Basis::Green => &GREEN,
            Basis::Blue => &BLUE,
        }
    }
}

/// Splits linear RGB into three `(basis, weight)` terms.
///
/// Weights are non-negative for non-negative input.
pub fn decompose(rgb: [f32; 3]) -> [(Basis, f32); 3] {
    let [r, g, b] = rgb;
    if r <= g && r <= b {
        if g <= b {
            [(Basis::White, r), (Basis::Cyan, g - r), (Basis::Blue, b - g)]
        } else {
            [(Basis::White, r), (Basis::Cyan, b - r), (Basis::Green, g - b)]
        }
    } else if g <= r && g <= b {
        if r <= b {
            [(Basis::White, g), (Basis::Magenta, r - g), (Basis::Blue, b - r)]
        } else {
            [(Basis::White, g), (Basis::Magenta, b - g), (Basis::Red, r - b)]
        }
    } else if r <= g {
        [(Basis::White, b), (Basis::Yellow, r - b), (Basis::Green, g - r)]
    } else {
        [(Basis::White, b), (Basis::Yellow, g - b), (Basis::Red, r - g)]
    }
}

/// Converts a linear RGB triplet to a non-negative spectrum.
///
/// NaN components are treated as zero.
pub fn rgb_to_spectrum(rgb: [f32; 3]) -> Spectrum {
    let rgb = rgb.map(|v| if v.is_nan() { 0.0 } else { v });
    let mut s = Spectrum::ZERO;
    for (basis, w) in decompose(rgb) {
        if w != 0.0 {
            s.add_scaled(basis.spectrum(), w);
        }
    }
    s.clamp_non_negative()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_is_basis_white() {
        assert_eq!(rgb_to_spectrum([1.0, 1.0, 1.0]), WHITE);
    }

    #[test]
    fn test_non_negative() {
        for rgb in [[0.2, -0.5, 0.9], [1.0, 0.0, 0.3], [5.0, 0.1, 0.0], [f32::NAN, 0.5, 0.5]] {
            let s = rgb_to_spectrum(rgb);
            assert!(s.samples().iter().all(|&v| v >= 0.0 && v.is_finite()));
        }
    }

    #[test]
    fn test_decompose_reconstructs_weights() {
        let terms = decompose([0.7, 0.2, 0.5]);
        assert_eq!(terms[0], (Basis::White, 0.2));
        assert_eq!(terms[1].0, Basis::Magenta);
        assert!((terms[1].1 - 0.3).abs() < 1e-6);
        assert_eq!(terms[2].0, Basis::Red);
        assert!((terms[2].1 - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_linear_in_scale() {
        let a = rgb_to_spectrum([0.3, 0.6, 0.1]);
        let b = rgb_to_spectrum([0.6, 1.2, 0.2]);
        for i in 0..a.0.len() {
            assert!((2.0 * a[i] - b[i]).abs() < 1e-5);
        }
    }
}
