//! Versioned preset migration.
//!
//! Version 1 documents described halation with absorption fractions
//! (`emulsion_absorption`, `base_absorption`, `ah_absorption`). Version 2
//! uses transmittances. Migration runs on the parsed YAML tree before it is
//! deserialized, once per load.

use std::sync::Once;

use serde_yaml::{Mapping, Value};
use tracing::warn;

/// Preset document version written by this crate.
pub const CURRENT_CONFIG_VERSION: u32 = 2;

const LEGACY_FIELDS: [(&str, &str); 3] = [
    ("emulsion_absorption", "emulsion_transmittance"),
    ("base_absorption", "base_transmittance"),
    ("ah_absorption", "ah_layer_transmittance"),
];

static DEPRECATION: Once = Once::new();

fn transmittance(a: &Value) -> Option<Value> {
    let t = |v: &Value| v.as_f64().map(|a| (1.0 - a).clamp(0.0, 1.0));
    match a {
        Value::Sequence(seq) => {
            let values = seq.iter().map(t).collect::<Option<Vec<_>>>()?;
            match values.as_slice() {
                [r, g, b] => Some(Value::Sequence(vec![(*r).into(), (*g).into(), (*b).into()])),
                [v] => Some(Value::Sequence(vec![(*v).into(); 3])),
                _ => None,
            }
        }
        other => t(other).map(|v| Value::Sequence(vec![v.into(); 3])),
    }
}

/// Rewrites legacy absorption fields of one halation mapping in place.
///
/// Scalars apply to all three channels. A field already present in
/// transmittance form wins over its legacy twin. Returns whether anything
/// changed; the first change in a process logs a deprecation warning.
///
/// ```rust
/// use film_profile::migrate_halation_config;
///
/// let mut v: serde_yaml::Value = serde_yaml::from_str("ah_absorption: 0.9").unwrap();
/// assert!(migrate_halation_config(&mut v));
/// assert!(v.get("ah_layer_transmittance").is_some());
/// ```
pub fn migrate_halation_config(halation: &mut Value) -> bool {
    let Some(map) = halation.as_mapping_mut() else {
        return false;
    };
    let mut changed = false;
    for (old, new) in LEGACY_FIELDS {
        let Some(legacy) = map.remove(old) else {
            continue;
        };
        changed = true;
        if map.contains_key(new) {
            continue;
        }
        match transmittance(&legacy) {
            Some(t) => {
                map.insert(new.into(), t);
            }
            // Unparseable: put it back so deserialization reports the field.
            None => {
                map.insert(old.into(), legacy);
            }
        }
    }
    if changed {
        DEPRECATION.call_once(|| {
            warn!(
                "halation absorption fields are deprecated; converted to transmittance (T = 1 - a). \
                 Update presets to version {CURRENT_CONFIG_VERSION}"
            );
        });
    }
    changed
}

/// Migrates every film entry of a version 1 document.
pub(crate) fn migrate_films(films: &mut [Value]) -> usize {
    let key = Value::from("halation");
    films
        .iter_mut()
        .filter_map(|film| film.as_mapping_mut())
        .filter_map(|film: &mut Mapping| film.get_mut(&key))
        .map(migrate_halation_config)
        .filter(|&changed| changed)
        .count()
}
