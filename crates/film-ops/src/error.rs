//! Error types for convolution and optical effects.

use thiserror::Error;

/// Error type for film-ops.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Planes have incompatible sizes or counts.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    /// Image buffer error.
    #[error(transparent)]
    Image(#[from] film_core::Error),

    /// Spectral table error (Mie lookup).
    #[error(transparent)]
    Spectral(#[from] film_spectral::SpectralError),
}

/// Result type for film-ops.
pub type OpsResult<T> = Result<T, OpsError>;
