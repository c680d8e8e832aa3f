//! # film-pipeline
//!
//! Renders images through a film profile.
//!
//! [`FilmPipeline::new`] binds a [`film_profile::FilmProfile`] to concrete
//! bloom, halation, grain and tone stages and calibrates exposure once.
//! [`FilmPipeline::render`] then processes any number of frames.
//!
//! Internally every frame is linear RGB in canonical R, G, B order; 8-bit
//! input and output convert at the boundary using
//! [`RenderOptions::channel_order`].
//!
//! # Example
//!
//! ```rust
//! use film_core::Image;
//! use film_pipeline::{render_film, RenderOptions};
//!
//! let frame = Image::filled(64, 48, &[0.5, 0.5, 0.5]).unwrap();
//! let options = RenderOptions {
//!     grain: false,
//!     ..RenderOptions::native_size()
//! };
//! let out = render_film("Portra400", &frame, options).unwrap();
//! assert_eq!(out.image.dimensions(), (64, 48));
//! assert!((out.image.channel_means()[1] - 0.5).abs() < 0.01);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod calibrate;
pub mod diagnostics;
pub mod error;
pub mod options;
pub mod pipeline;

pub use calibrate::{solve_gains, CALIBRATION_GREY};
pub use diagnostics::{Diagnostics, Rendered, RenderedBytes};
pub use error::{PipelineError, PipelineResult};
pub use options::RenderOptions;
pub use pipeline::{render_film, FilmPipeline};
