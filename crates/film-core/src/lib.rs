//! # film-core
//!
//! Core buffer types for the film emulation pipeline.
//!
//! - [`Plane`] - single-channel `f32` grid used by every per-layer stage
//! - [`Image`] - interleaved 1- or 3-channel `f32` image, canonical RGB order
//! - [`ChannelOrder`] - RGB/BGR order of external 8-bit data
//! - [`standardize`] - resampling to a fixed minimum edge
//!
//! ## Channel order
//!
//! The pipeline works in RGB from end to end. BGR sources are reordered in
//! [`Image::from_u8`] and written back in the caller's order by
//! [`Image::to_u8`]; those two functions are the only place order is handled.
//!
//! ## Crate Structure
//!
//! ```text
//! film-core (this crate)
//!    ^
//!    +-- film-math, film-spectral
//!    +-- film-ops (PSF, convolution, bloom, halation)
//!    +-- film-emulsion (H&D curve, grain, tone mapping)
//!    +-- film-profile, film-pipeline
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod image;
pub mod resize;

pub use error::{Error, Result};
pub use image::{ChannelOrder, Image, Plane, REC709_LUMA};
pub use resize::{resize, resize_plane, standardize, standardized_size, Filter, DEFAULT_MIN_EDGE};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::image::{ChannelOrder, Image, Plane};
    pub use crate::resize::standardize;
}
