//! Error types for profile construction and lookup.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for film-profile.
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Errors from profile lookup, derivation and loading.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// No profile with this exact name.
    #[error("unknown film '{name}' (available: {})", available.join(", "))]
    UnknownFilm {
        /// Requested name.
        name: String,
        /// Registered names.
        available: Vec<String>,
    },

    /// ISO outside the supported range.
    #[error("ISO {iso} outside supported range [{min}, {max}]")]
    IsoOutOfRange {
        /// Requested ISO.
        iso: f32,
        /// Lowest supported ISO.
        min: f32,
        /// Highest supported ISO.
        max: f32,
    },

    /// Explicit spectral response with the wrong number of coefficients.
    #[error("spectral_response needs 12 values (3x3 layer matrix + 3 panchromatic), got {got}")]
    SpectralResponseLength {
        /// Number of values supplied.
        got: usize,
    },

    /// Profile violates an invariant.
    #[error("invalid profile '{name}': {reason}")]
    InvalidProfile {
        /// Profile name.
        name: String,
        /// What is wrong.
        reason: String,
    },

    /// Two registry entries share a name.
    #[error("duplicate film profile '{0}'")]
    DuplicateFilm(String),

    /// Preset document version this build cannot read.
    #[error("unsupported preset version {version} (supported: 1, 2)")]
    UnsupportedVersion {
        /// Version found in the document.
        version: u32,
    },

    /// Preset file not found.
    #[error("preset file not found: {path}")]
    FileNotFound {
        /// Path that was tried.
        path: PathBuf,
    },

    /// The embedded presets failed to load.
    #[error("built-in presets unavailable: {0}")]
    DataUnavailable(String),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Optical parameter bundle rejected.
    #[error(transparent)]
    Ops(#[from] film_ops::OpsError),

    /// Emulsion parameter bundle rejected.
    #[error(transparent)]
    Emulsion(#[from] film_emulsion::EmulsionError),
}

impl ProfileError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidProfile {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
