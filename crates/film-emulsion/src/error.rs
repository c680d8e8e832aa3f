//! Error types for the emulsion stages.

use thiserror::Error;

/// Error type for film-emulsion.
#[derive(Error, Debug)]
pub enum EmulsionError {
    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Unknown style or strategy name.
    #[error("unknown {kind} '{name}' (expected one of: {expected})")]
    UnknownVariant {
        /// What was being parsed.
        kind: &'static str,
        /// The rejected name.
        name: String,
        /// Accepted names.
        expected: &'static str,
    },

    /// Convolution failure.
    #[error(transparent)]
    Ops(#[from] film_ops::OpsError),

    /// Image buffer error.
    #[error(transparent)]
    Image(#[from] film_core::Error),
}

/// Result type for film-emulsion.
pub type EmulsionResult<T> = Result<T, EmulsionError>;
