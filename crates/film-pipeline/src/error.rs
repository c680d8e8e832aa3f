//! Pipeline errors.
//!
//! Lower-level errors pass through unchanged so callers can match on the
//! original variant.

use thiserror::Error;

/// Result type for film-pipeline.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors from building or running a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Image shape or buffer error.
    #[error(transparent)]
    Image(#[from] film_core::Error),

    /// Spectral data error, including a missing sensitivity curve set.
    #[error(transparent)]
    Spectral(#[from] film_spectral::SpectralError),

    /// Convolution or optical stage error.
    #[error(transparent)]
    Ops(#[from] film_ops::OpsError),

    /// Emulsion stage error.
    #[error(transparent)]
    Emulsion(#[from] film_emulsion::EmulsionError),

    /// Profile lookup or validation error.
    #[error(transparent)]
    Profile(#[from] film_profile::ProfileError),
}
