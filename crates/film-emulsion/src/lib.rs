//! # film-emulsion
//!
//! What happens to light once it is absorbed by the emulsion.
//!
//! - [`apply_hd_curve`] - Hurter-Driffield exposure to transmittance
//! - [`ReciprocityParams`] - Schwarzschild exposure correction
//! - [`GrainModel`] - [`ArtisticGrain`] and [`PoissonGrain`] noise
//! - [`ToneMapper`] - Reinhard and filmic display mapping
//!
//! # Example
//!
//! ```rust
//! use film_emulsion::{ToneMapper, ToneMappingParams, ToneStyle};
//!
//! let tone = ToneMapper::new(&ToneMappingParams {
//!     style: ToneStyle::Reinhard,
//!     ..Default::default()
//! })
//! .unwrap();
//! assert!(tone.map(0.2) < tone.map(0.4));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod grain;
pub mod hd_curve;
pub mod reciprocity;
pub mod tone;

pub use error::{EmulsionError, EmulsionResult};
pub use grain::{
    grain_model, scene_sensitivity, ArtisticGrain, GrainModel, GrainParams, GrainStrategy,
    PoissonGrain, POISSON_NORMAL_CROSSOVER,
};
pub use hd_curve::{apply_hd_curve, apply_hd_curve_plane, density, negative_to_positive, HdCurveParams};
pub use reciprocity::ReciprocityParams;
pub use tone::{ToneMapper, ToneMappingParams, ToneStyle};
