//! # film-profile
//!
//! Immutable film stock profiles.
//!
//! - [`FilmProfile`] - validated layers plus every stage's parameter bundle
//! - [`ProfileRegistry`] - named presets from YAML, built-in set on first use
//! - [`derive_physical_params_from_iso`] - grain and scattering from film speed
//! - [`create_film_profile_from_iso`] - a whole profile from one ISO value
//! - [`migrate_halation_config`] - version 1 halation fields to version 2
//!
//! # Example
//!
//! ```rust
//! use film_profile::{get_film_profile, ColorType};
//!
//! let hp5 = get_film_profile("HP5Plus400").unwrap();
//! assert_eq!(hp5.color_type(), ColorType::Monochrome);
//! assert_eq!(hp5.spectral_response().len(), 12);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod from_iso;
pub mod iso;
pub mod migrate;
pub mod profile;
pub mod registry;

pub use error::{ProfileError, ProfileResult};
pub use from_iso::{create_film_profile_from_iso, FromIsoSpec, ProfileOverrides, AH_ABSORPTION};
pub use iso::{derive_physical_params_from_iso, FilmType, IsoDerivedParams, ISO_MAX, ISO_MIN};
pub use migrate::{migrate_halation_config, CURRENT_CONFIG_VERSION};
pub use profile::{ColorType, EmulsionLayer, FilmProfile, LayerSpec, PhysicsMode, ProfileSpec};
pub use registry::{get_film_profile, ProfileRegistry};
