//! Error types for film-core operations.
//!
//! Every failure here is a caller-fixable validation problem: a buffer whose
//! length does not match its dimensions, an unsupported channel count, or two
//! planes that cannot be combined.
//!
//! # Usage
//!
//! ```rust
//! use film_core::{Error, Result};
//!
//! fn check(width: usize, height: usize) -> Result<()> {
//!     if width == 0 || height == 0 {
//!         return Err(Error::invalid_dimensions(width, height, "empty image"));
//!     }
//!     Ok(())
//! }
//! assert!(check(0, 4).is_err());
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by image buffer construction and conversion.
#[derive(Debug, Error)]
pub enum Error {
    /// Width/height are zero, overflow, or disagree with the data length.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: usize,
        /// Requested height
        height: usize,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Channel count is not one the pipeline understands.
    #[error("unsupported channel count {got}: expected 1 (monochrome) or 3 (color)")]
    UnsupportedChannels {
        /// Actual channel count
        got: usize,
    },

    /// Channel count mismatch between two buffers.
    #[error("channel mismatch: expected {expected}, got {got}")]
    ChannelMismatch {
        /// Expected channel count
        expected: usize,
        /// Actual channel count
        got: usize,
    },

    /// Two planes or images have different sizes.
    #[error("dimension mismatch: {a_width}x{a_height} vs {b_width}x{b_height}")]
    DimensionMismatch {
        /// First width
        a_width: usize,
        /// First height
        a_height: usize,
        /// Second width
        b_width: usize,
        /// Second height
        b_height: usize,
    },

    /// A numeric parameter is outside its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl Error {
    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: usize, height: usize, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::DimensionMismatch`] error.
    #[inline]
    pub fn dimension_mismatch(a: (usize, usize), b: (usize, usize)) -> Self {
        Self::DimensionMismatch {
            a_width: a.0,
            a_height: a.1,
            b_width: b.0,
            b_height: b.1,
        }
    }

    /// Creates an [`Error::ChannelMismatch`] error.
    #[inline]
    pub fn channel_mismatch(expected: usize, got: usize) -> Self {
        Self::ChannelMismatch { expected, got }
    }

    /// Returns `true` for errors caused by buffer shape.
    #[inline]
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDimensions { .. }
                | Self::DimensionMismatch { .. }
                | Self::ChannelMismatch { .. }
                | Self::UnsupportedChannels { .. }
        )
    }
}
