//! CIE 1931 colour matching functions and standard illuminants.
//!
//! The 2-degree observer and D65 are stored at their published 10 nm spacing
//! and resampled onto the band grid once, on first use.

use std::sync::OnceLock;

use crate::spectrum::{resample, NUM_BANDS};

/// CIE 1931 2-degree observer: wavelength, x-bar, y-bar, z-bar.
const CIE_1931_10NM: [[f32; 4]; 41] = [
    [380.0, 0.001368, 0.000039, 0.006450],
    [390.0, 0.004243, 0.000120, 0.020050],
    [400.0, 0.014310, 0.000396, 0.067850],
    [410.0, 0.043510, 0.001210, 0.207400],
    [420.0, 0.134380, 0.004000, 0.645600],
    [430.0, 0.283900, 0.011600, 1.385600],
    [440.0, 0.348280, 0.023000, 1.747060],
    [450.0, 0.336200, 0.038000, 1.772110],
    [460.0, 0.290800, 0.060000, 1.669200],
    [470.0, 0.195360, 0.090980, 1.287640],
    [480.0, 0.095640, 0.139020, 0.812950],
    [490.0, 0.032010, 0.208020, 0.465180],
    [500.0, 0.004900, 0.323000, 0.272000],
    [510.0, 0.009300, 0.503000, 0.158200],
    [520.0, 0.063270, 0.710000, 0.078250],
    [530.0, 0.165500, 0.862000, 0.042160],
    [540.0, 0.290400, 0.954000, 0.020300],
    [550.0, 0.433450, 0.994950, 0.008750],
    [560.0, 0.594500, 0.995000, 0.003900],
    [570.0, 0.762100, 0.952000, 0.002100],
    [580.0, 0.916300, 0.870000, 0.001650],
    [590.0, 1.026300, 0.757000, 0.001100],
    [600.0, 1.062200, 0.631000, 0.000800],
    [610.0, 1.002600, 0.503000, 0.000340],
    [620.0, 0.854450, 0.381000, 0.000190],
    [630.0, 0.642400, 0.265000, 0.000050],
    [640.0, 0.447900, 0.175000, 0.000020],
    [650.0, 0.283500, 0.107000, 0.000000],
    [660.0, 0.164900, 0.061000, 0.000000],
    [670.0, 0.087400, 0.032000, 0.000000],
    [680.0, 0.046770, 0.017000, 0.000000],
    [690.0, 0.022700, 0.008210, 0.000000],
    [700.0, 0.011359, 0.004102, 0.000000],
    [710.0, 0.005790, 0.002091, 0.000000],
    [720.0, 0.002899, 0.001047, 0.000000],
    [730.0, 0.001440, 0.000520, 0.000000],
    [740.0, 0.000690, 0.000249, 0.000000],
    [750.0, 0.000332, 0.000120, 0.000000],
    [760.0, 0.000166, 0.000060, 0.000000],
    [770.0, 0.000083, 0.000030, 0.000000],
    [780.0, 0.000042, 0.000015, 0.000000],
];

/// CIE standard illuminant D65, relative spectral power.
const D65_10NM: [f32; 41] = [
    49.9755, 54.6482, 82.7549, 91.486, 93.4318, 86.6823, 104.865, 117.008,
    117.812, 114.861, 115.923, 108.811, 109.354, 107.802, 104.79, 107.689,
    104.405, 104.046, 100.0, 96.3342, 95.788, 88.6856, 90.0062, 89.5991,
    87.6987, 83.2886, 83.6992, 80.0268, 80.2146, 82.2778, 78.2842, 69.7213,
    71.6091, 74.349, 61.604, 69.8856, 75.087, 63.5927, 46.4182, 66.8054,
    63.3828,
];

/// Colour matching functions on the band grid.
#[derive(Debug, Clone)]
pub struct Cie1931 {
    /// x-bar
    pub x: [f32; NUM_BANDS],
    /// y-bar
    pub y: [f32; NUM_BANDS],
    /// z-bar
    pub z: [f32; NUM_BANDS],
}

/// Band-sampled CIE 1931 observer.
pub fn cie_1931() -> &'static Cie1931 {
    static TABLE: OnceLock<Cie1931> = OnceLock::new();
    TABLE.get_or_init(|| {
        let wl: Vec<f32> = CIE_1931_10NM.iter().map(|r| r[0]).collect();
        let col = |c: usize| -> Vec<f32> { CIE_1931_10NM.iter().map(|r| r[c]).collect() };
        Cie1931 {
            x: resample(&wl, &col(1)),
            y: resample(&wl, &col(2)),
            z: resample(&wl, &col(3)),
        }
    })
}

/// A light source spectral power distribution on the band grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Illuminant {
    /// Short identifier.
    pub name: &'static str,
    /// Relative power per band.
    pub spd: [f32; NUM_BANDS],
}

impl Illuminant {
    /// CIE D65 daylight.
    pub fn d65() -> &'static Illuminant {
        static D65: OnceLock<Illuminant> = OnceLock::new();
        D65.get_or_init(|| {
            let wl: Vec<f32> = CIE_1931_10NM.iter().map(|r| r[0]).collect();
            Illuminant {
                name: "D65",
                spd: resample(&wl, &D65_10NM),
            }
        })
    }

    /// Equal-energy illuminant E.
    pub fn equal_energy() -> &'static Illuminant {
        static E: Illuminant = Illuminant {
            name: "E",
            spd: [1.0; NUM_BANDS],
        };
        &E
    }
}
