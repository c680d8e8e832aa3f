//! # film-math
//!
//! Numeric helpers shared by the film emulation crates.
//!
//! - [`lerp`], [`smoothstep`], [`softplus`] - scalar interpolation and smooth clamps
//! - [`interp_clamped`] - 1-D sampled curve lookup
//! - [`Grid2d`] - bilinear 2-D lookup table with edge clamping
//! - [`Mat3`] - row-major 3x3 matrix backed by [`glam`]
//!
//! # Usage
//!
//! ```rust
//! use film_math::{interp_clamped, Grid2d};
//!
//! let y = interp_clamped(&[400.0, 700.0], &[1.0, 0.0], 550.0);
//! assert!((y - 0.5).abs() < 1e-6);
//!
//! let grid = Grid2d::new(vec![400.0, 700.0], vec![100.0], vec![2.0, 1.0]).unwrap();
//! assert!((grid.sample(550.0, 100.0) - 1.5).abs() < 1e-6);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod interp;
mod mat3;
mod table;

pub use interp::*;
pub use mat3::*;
pub use table::*;

/// Re-export of glam's vector type for callers working with tristimulus values.
pub use glam::Vec3;
