//! Mie scattering lookup table for silver-halide grains.
//!
//! The table stores, on a (wavelength, ISO) grid, the extinction efficiency
//! of the grain population relative to the reference wavelength (`eta`), the
//! absolute efficiency `q_ext` and the mean size parameter `x = 2πa/λ`.
//! Queries interpolate bilinearly and clamp to the grid edges; nothing is
//! extrapolated.
//!
//! The embedded table (`data/mie_table.yaml`) is loaded once. Tables with a
//! different resolution can be loaded from YAML or produced with
//! [`MieTable::resampled`]; changing resolution only changes precision.
//!
//! # Example
//!
//! ```rust
//! use film_spectral::lookup_mie_params;
//!
//! let p = lookup_mie_params(550.0, 400.0).unwrap();
//! assert!((p.eta - 1.0).abs() < 1e-4);
//! ```

use std::path::Path;
use std::sync::OnceLock;

use serde::Deserialize;
use tracing::trace;

use film_math::Grid2d;

use crate::{SpectralError, SpectralResult};

const BUILTIN_YAML: &str = include_str!("../data/mie_table.yaml");

#[derive(Debug, Deserialize)]
struct RawMieTable {
    version: u32,
    reference_wavelength_nm: f32,
    wavelengths_nm: Vec<f32>,
    isos: Vec<f32>,
    entries: Vec<RawMieEntry>,
}

#[derive(Debug, Deserialize)]
struct RawMieEntry {
    iso: f32,
    eta: Vec<f32>,
    q_ext: Vec<f32>,
    size_parameter: Vec<f32>,
}

/// Interpolated scattering parameters at one (wavelength, ISO).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MieParams {
    /// Extinction efficiency relative to the reference wavelength.
    pub eta: f32,
    /// Extinction efficiency.
    pub q_ext: f32,
    /// Size parameter `2πa/λ`.
    pub size_parameter: f32,
}

/// Bilinear (wavelength, ISO) scattering table.
#[derive(Debug, Clone)]
pub struct MieTable {
    reference_wavelength: f32,
    eta: Grid2d,
    q_ext: Grid2d,
    size_parameter: Grid2d,
}

impl MieTable {
    /// Parses a YAML table.
    pub fn from_yaml_str(yaml: &str) -> SpectralResult<Self> {
        let raw: RawMieTable = serde_yaml::from_str(yaml)?;
        Self::from_raw(raw)
    }

    /// Loads a YAML table from disk.
    pub fn from_file(path: impl AsRef<Path>) -> SpectralResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SpectralError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Self::from_yaml_str(&std::fs::read_to_string(path)?)
    }

    fn from_raw(raw: RawMieTable) -> SpectralResult<Self> {
        if raw.version != 1 {
            return Err(SpectralError::InvalidData(format!(
                "unsupported Mie table version {}",
                raw.version
            )));
        }
        if raw.entries.len() != raw.isos.len() {
            return Err(SpectralError::InvalidData(format!(
                "{} ISO values but {} entries",
                raw.isos.len(),
                raw.entries.len()
            )));
        }
        let n = raw.wavelengths_nm.len();
        let mut eta = Vec::with_capacity(n * raw.isos.len());
        let mut q_ext = Vec::with_capacity(eta.capacity());
        let mut size = Vec::with_capacity(eta.capacity());
        for (entry, &iso) in raw.entries.iter().zip(&raw.isos) {
            if (entry.iso - iso).abs() > 1e-3 {
                return Err(SpectralError::InvalidData(format!(
                    "entry for ISO {} listed where ISO {} expected",
                    entry.iso, iso
                )));
            }
            if entry.eta.len() != n || entry.q_ext.len() != n || entry.size_parameter.len() != n {
                return Err(SpectralError::InvalidData(format!(
                    "ISO {iso}: every row needs {n} samples"
                )));
            }
            eta.extend_from_slice(&entry.eta);
            q_ext.extend_from_slice(&entry.q_ext);
            size.extend_from_slice(&entry.size_parameter);
        }

        Ok(Self {
            reference_wavelength: raw.reference_wavelength_nm,
            eta: Grid2d::new(raw.wavelengths_nm.clone(), raw.isos.clone(), eta)?,
            q_ext: Grid2d::new(raw.wavelengths_nm.clone(), raw.isos.clone(), q_ext)?,
            size_parameter: Grid2d::new(raw.wavelengths_nm, raw.isos, size)?,
        })
    }

    /// The embedded table, parsed once.
    ///
    /// # Errors
    ///
    /// [`SpectralError::DataUnavailable`] if the embedded data is corrupt.
    pub fn builtin() -> SpectralResult<&'static MieTable> {
        static TABLE: OnceLock<Result<MieTable, String>> = OnceLock::new();
        TABLE
            .get_or_init(|| Self::from_yaml_str(BUILTIN_YAML).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|e| SpectralError::DataUnavailable(format!("Mie table: {e}")))
    }

    /// Reference wavelength for `eta`, in nm.
    pub fn reference_wavelength(&self) -> f32 {
        self.reference_wavelength
    }

    /// Wavelength axis in nm.
    pub fn wavelengths(&self) -> &[f32] {
        self.eta.xs()
    }

    /// ISO axis.
    pub fn isos(&self) -> &[f32] {
        self.eta.ys()
    }

    /// Interpolates all parameters at `(wavelength_nm, iso)`, clamped to the grid.
    pub fn lookup(&self, wavelength_nm: f32, iso: f32) -> MieParams {
        if !self.eta.contains(wavelength_nm, iso) {
            trace!(wavelength_nm, iso, "Mie lookup outside table, clamping");
        }
        MieParams {
            eta: self.eta.sample(wavelength_nm, iso),
            q_ext: self.q_ext.sample(wavelength_nm, iso),
            size_parameter: self.size_parameter.sample(wavelength_nm, iso),
        }
    }

    /// Builds a table on new axes by sampling this one.
    pub fn resampled(&self, wavelengths_nm: &[f32], isos: &[f32]) -> SpectralResult<Self> {
        let sample = |grid: &Grid2d| -> Vec<f32> {
            isos.iter()
                .flat_map(|&iso| wavelengths_nm.iter().map(move |&w| grid.sample(w, iso)))
                .collect()
        };
        Ok(Self {
            reference_wavelength: self.reference_wavelength,
            eta: Grid2d::new(wavelengths_nm.to_vec(), isos.to_vec(), sample(&self.eta))?,
            q_ext: Grid2d::new(wavelengths_nm.to_vec(), isos.to_vec(), sample(&self.q_ext))?,
            size_parameter: Grid2d::new(
                wavelengths_nm.to_vec(),
                isos.to_vec(),
                sample(&self.size_parameter),
            )?,
        })
    }
}

/// Looks up the embedded table at `(wavelength_nm, iso)`.
pub fn lookup_mie_params(wavelength_nm: f32, iso: f32) -> SpectralResult<MieParams> {
    Ok(MieTable::builtin()?.lookup(wavelength_nm, iso))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_wavelength_is_unity() {
        let table = MieTable::builtin().unwrap();
        for &iso in table.isos() {
            let p = table.lookup(table.reference_wavelength(), iso);
            assert!((p.eta - 1.0).abs() < 1e-4, "iso {iso}");
        }
    }

    #[test]
    fn test_clamps_outside_domain() {
        let table = MieTable::builtin().unwrap();
        assert_eq!(table.lookup(300.0, 100.0), table.lookup(400.0, 100.0));
        assert_eq!(table.lookup(900.0, 100.0), table.lookup(700.0, 100.0));
        assert_eq!(table.lookup(550.0, 10.0), table.lookup(550.0, 25.0));
        assert_eq!(table.lookup(550.0, 12800.0), table.lookup(550.0, 6400.0));
        let far = table.lookup(10_000.0, 1e9);
        assert!(far.eta.is_finite() && far.q_ext.is_finite());
    }

    #[test]
    fn test_fine_grain_scatters_blue_more() {
        let p_blue = lookup_mie_params(450.0, 25.0).unwrap();
        let p_red = lookup_mie_params(650.0, 25.0).unwrap();
        assert!(p_blue.eta > p_red.eta);
        assert!(p_blue.size_parameter > p_red.size_parameter);
    }

    #[test]
    fn test_size_parameter_grows_with_iso() {
        let table = MieTable::builtin().unwrap();
        let mut prev = 0.0;
        for &iso in table.isos() {
            let x = table.lookup(550.0, iso).size_parameter;
            assert!(x > prev);
            prev = x;
        }
    }

    #[test]
    fn test_coarse_table_tracks_dense() {
        let dense = MieTable::builtin().unwrap();
        let coarse_wl: Vec<f32> = dense.wavelengths().iter().copied().step_by(3).collect();
        let coarse = dense.resampled(&coarse_wl, dense.isos()).unwrap();
        for w in (400..=700).step_by(7) {
            for iso in [25.0, 60.0, 100.0, 150.0, 400.0, 700.0, 1600.0, 5000.0] {
                let a = dense.lookup(w as f32, iso);
                let b = coarse.lookup(w as f32, iso);
                assert!((a.eta - b.eta).abs() < 0.01, "w {w} iso {iso}");
            }
        }
    }

    #[test]
    fn test_rejects_wrong_row_length() {
        let yaml = "version: 1\nreference_wavelength_nm: 550.0\nwavelengths_nm: [500.0, 600.0]\nisos: [100.0]\nentries:\n  - iso: 100.0\n    eta: [1.0]\n    q_ext: [2.0, 2.0]\n    size_parameter: [3.0, 3.0]\n";
        assert!(matches!(
            MieTable::from_yaml_str(yaml),
            Err(SpectralError::InvalidData(_))
        ));
    }
}
