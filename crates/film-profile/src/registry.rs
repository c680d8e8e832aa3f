//! Named film presets.
//!
//! A preset document is YAML:
//!
//! ```yaml
//! version: 2
//! films:
//!   - name: Portra400          # full preset: every ProfileSpec field
//!     iso: 400
//!     layers: { red: ..., green: ..., blue: ... }
//!   - name: Standard400        # derived from film speed
//!     derive: { iso: 400, film_type: standard }
//! ```
//!
//! Loading parses to a raw tree, migrates version 1 documents, then
//! validates every entry. The built-in document is embedded and parsed on
//! first use.

use std::path::Path;
use std::sync::OnceLock;

use serde::Deserialize;
use serde_yaml::Value;
use tracing::{debug, info};

use crate::from_iso::{create_film_profile_from_iso, FromIsoSpec};
use crate::migrate::{migrate_films, CURRENT_CONFIG_VERSION};
use crate::profile::{FilmProfile, ProfileSpec};
use crate::{ProfileError, ProfileResult};

const BUILTIN_FILMS: &str = include_str!("../data/films.yaml");

static BUILTIN: OnceLock<Result<ProfileRegistry, String>> = OnceLock::new();

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    films: Vec<Value>,
}

fn default_version() -> u32 {
    CURRENT_CONFIG_VERSION
}

/// An ordered set of validated profiles with unique names.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: Vec<FilmProfile>,
}

impl ProfileRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The embedded presets, parsed once per process.
    ///
    /// # Errors
    ///
    /// [`ProfileError::DataUnavailable`] if the embedded document is invalid.
    pub fn builtin() -> ProfileResult<&'static ProfileRegistry> {
        BUILTIN
            .get_or_init(|| Self::from_yaml_str(BUILTIN_FILMS).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|e| ProfileError::DataUnavailable(e.clone()))
    }

    /// Loads a preset document from disk.
    pub fn from_file(path: impl AsRef<Path>) -> ProfileResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ProfileError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let registry = Self::from_yaml_str(&content)?;
        info!(path = %path.display(), films = registry.len(), "loaded film presets");
        Ok(registry)
    }

    /// Parses a preset document.
    pub fn from_yaml_str(yaml: &str) -> ProfileResult<Self> {
        let raw: RawDocument = serde_yaml::from_str(yaml)?;
        Self::from_raw(raw)
    }

    fn from_raw(mut raw: RawDocument) -> ProfileResult<Self> {
        match raw.version {
            1 => {
                let migrated = migrate_films(&mut raw.films);
                debug!(migrated, "migrated version 1 presets");
            }
            CURRENT_CONFIG_VERSION => {}
            version => return Err(ProfileError::UnsupportedVersion { version }),
        }

        let mut registry = Self::new();
        for entry in raw.films {
            registry.insert(Self::entry_to_profile(entry)?)?;
        }
        Ok(registry)
    }

    fn entry_to_profile(entry: Value) -> ProfileResult<FilmProfile> {
        let Value::Mapping(mut map) = entry else {
            return Err(ProfileError::invalid("?", "film entry must be a mapping"));
        };
        match map.remove("derive") {
            Some(Value::Mapping(mut derive)) => {
                let name = map.remove("name").unwrap_or(Value::Null);
                if let Some((key, _)) = map.iter().next() {
                    let name = name.as_str().unwrap_or("?");
                    return Err(ProfileError::invalid(
                        name,
                        format!("derived entries take only name and derive, found {key:?}"),
                    ));
                }
                derive.insert("name".into(), name);
                let spec: FromIsoSpec = serde_yaml::from_value(Value::Mapping(derive))?;
                create_film_profile_from_iso(&spec)
            }
            Some(_) => {
                let name = map.get("name").and_then(Value::as_str).unwrap_or("?");
                Err(ProfileError::invalid(name, "derive must be a mapping"))
            }
            None => {
                let spec: ProfileSpec = serde_yaml::from_value(Value::Mapping(map))?;
                FilmProfile::new(spec)
            }
        }
    }

    /// Adds a profile.
    ///
    /// # Errors
    ///
    /// [`ProfileError::DuplicateFilm`] if the name is taken.
    pub fn insert(&mut self, profile: FilmProfile) -> ProfileResult<()> {
        if self.profiles.iter().any(|p| p.name() == profile.name()) {
            return Err(ProfileError::DuplicateFilm(profile.name().to_string()));
        }
        self.profiles.push(profile);
        Ok(())
    }

    /// Looks a profile up by exact name.
    ///
    /// # Errors
    ///
    /// [`ProfileError::UnknownFilm`] listing the registered names.
    pub fn get(&self, name: &str) -> ProfileResult<&FilmProfile> {
        self.profiles
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| ProfileError::UnknownFilm {
                name: name.to_string(),
                available: self.names().map(str::to_string).collect(),
            })
    }

    /// Registered names in document order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(FilmProfile::name)
    }

    /// All profiles in document order.
    pub fn iter(&self) -> impl Iterator<Item = &FilmProfile> {
        self.profiles.iter()
    }

    /// Number of profiles.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// True if no profiles are registered.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Looks a built-in profile up by exact name.
///
/// ```rust
/// let p = film_profile::get_film_profile("Portra400").unwrap();
/// assert_eq!(p.iso(), 400.0);
/// assert!(film_profile::get_film_profile("portra400").is_err());
/// ```
pub fn get_film_profile(name: &str) -> ProfileResult<&'static FilmProfile> {
    ProfileRegistry::builtin()?.get(name)
}
