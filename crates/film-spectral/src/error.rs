//! Error types for spectral data loading and conversion.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for spectral operations.
pub type SpectralResult<T> = Result<T, SpectralError>;

/// Errors raised by spectral data and conversion.
#[derive(Debug, Error)]
pub enum SpectralError {
    /// No sensitivity curves are registered for the film.
    #[error("no spectral sensitivity data for film '{film}' (available: {available})")]
    SensitivityNotFound {
        /// Requested film name
        film: String,
        /// Comma-separated list of known films
        available: String,
    },

    /// A static table could not be loaded.
    #[error("spectral data unavailable: {0}")]
    DataUnavailable(String),

    /// A data file does not exist.
    #[error("data file not found: {path}")]
    FileNotFound {
        /// Path that was requested
        path: PathBuf,
    },

    /// A data table is structurally wrong.
    #[error("invalid spectral data: {0}")]
    InvalidData(String),

    /// YAML parse error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Lookup grid construction failed.
    #[error("lookup table error: {0}")]
    Table(#[from] film_math::TableError),

    /// Image shape error.
    #[error(transparent)]
    Image(#[from] film_core::Error),
}
