//! Loading preset documents from disk, including version 1 migration.

use std::io::Write;

use approx::assert_relative_eq;
use film_profile::{ColorType, ProfileError, ProfileRegistry};

const LEGACY: &str = r#"
version: 1
films:
  - name: OldColor
    iso: 160
    layers:
      red:   { r_absorption: 0.8, g_absorption: 0.15, b_absorption: 0.05, diffuse_weight: 0.7, direct_weight: 0.3, response_exponent: 1.0, grain_intensity: 0.1 }
      green: { r_absorption: 0.1, g_absorption: 0.8, b_absorption: 0.1, diffuse_weight: 0.7, direct_weight: 0.3, response_exponent: 1.0, grain_intensity: 0.1 }
      blue:  { r_absorption: 0.05, g_absorption: 0.15, b_absorption: 0.8, diffuse_weight: 0.7, direct_weight: 0.3, response_exponent: 1.0, grain_intensity: 0.1 }
    halation:
      emulsion_absorption: [0.05, 0.08, 0.12]
      base_absorption: 0.02
      ah_absorption: [0.7, 0.9, 0.95]
  - name: OldMono
    color_type: monochrome
    derive: { iso: 100 }
"#;

fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn legacy_document_is_migrated() {
    let file = write_temp(LEGACY.replace("    color_type: monochrome\n", "").as_str());
    let reg = ProfileRegistry::from_file(file.path()).unwrap();
    assert_eq!(reg.names().collect::<Vec<_>>(), ["OldColor", "OldMono"]);

    let h = reg.get("OldColor").unwrap().halation();
    assert_relative_eq!(h.emulsion_transmittance[2], 0.88, epsilon = 1e-6);
    assert_relative_eq!(h.base_transmittance[1], 0.98, epsilon = 1e-6);
    assert_relative_eq!(h.ah_layer_transmittance[0], 0.3, epsilon = 1e-6);
}

#[test]
fn legacy_fields_rejected_in_current_version() {
    let doc = LEGACY.replace("version: 1", "version: 2");
    assert!(matches!(
        ProfileRegistry::from_yaml_str(&doc),
        Err(ProfileError::Yaml(_))
    ));
}

#[test]
fn derived_entry_takes_no_preset_fields() {
    // color_type belongs inside derive
    assert!(matches!(
        ProfileRegistry::from_yaml_str(LEGACY),
        Err(ProfileError::InvalidProfile { .. })
    ));
}

#[test]
fn missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ProfileRegistry::from_file(dir.path().join("films.yaml")).unwrap_err();
    assert!(matches!(err, ProfileError::FileNotFound { .. }));
}

#[test]
fn builtin_profiles_are_consistent() {
    let reg = ProfileRegistry::builtin().unwrap();
    for p in reg.iter() {
        let sr = p.spectral_response();
        match p.color_type() {
            ColorType::Color => {
                assert_eq!(p.layers().len(), 3, "{}", p.name());
                assert!(sr[..9].iter().any(|&v| v > 0.0));
            }
            ColorType::Monochrome => {
                assert_eq!(p.layers().len(), 1, "{}", p.name());
                assert!(sr[..9].iter().all(|&v| v == 0.0));
            }
        }
    }
    let names: Vec<_> = reg.names().collect();
    let mut dedup = names.clone();
    dedup.sort_unstable();
    dedup.dedup();
    assert_eq!(names.len(), dedup.len());
}
