//! Integration tests for Settings config loading with layered merge semantics.
//!
//! Merge Semantics:
//! - Defaults → Global → Local: REPLACE per specified key
//! - Any → Env vars: REPLACE (explicit user override)
//!
//! Note: These tests run without a global config (temp directories only),
//! so they effectively test local config merging with defaults.

use std::fs;

use tempfile::TempDir;

use arbor_sampler::application::ApplicationError;
use arbor_sampler::config::{local_config_path, Settings};

#[test]
fn given_local_config_when_load_then_replaces_specified_values() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let local_config = r#"
[sampler]
interval_length = 2000.0
create_interval_boundaries = true
"#;
    fs::write(local_config_path(dir.path()), local_config).unwrap();

    // Act
    let settings = Settings::load(Some(dir.path())).expect("load settings");

    // Assert
    assert_eq!(settings.sampler.interval_length, 2000.0);
    assert!(settings.sampler.create_interval_boundaries);
    assert_eq!(
        settings.sampler.interval_error, 250.0,
        "unspecified values keep their defaults"
    );
    assert!(settings.sampler.prefer_smaller_error);
}

#[test]
fn given_local_config_with_sections_when_load_then_lists_replace_defaults() {
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        "[interpolation]\nx = [12.5]\nenabled = false\n",
    )
    .unwrap();

    let settings = Settings::load(Some(dir.path())).unwrap();

    assert_eq!(settings.interpolation.x, vec![12.5]);
    assert!(!settings.interpolation.enabled);
    assert!(settings.interpolation.sections().is_empty());
}

#[test]
fn given_no_local_config_when_load_then_defaults() {
    let dir = TempDir::new().unwrap();

    let settings = Settings::load(Some(dir.path())).unwrap();

    assert_eq!(settings.sampler.interval_length, 5000.0);
    assert_eq!(settings.sampler.max_diff(), 500.0);
}

#[test]
fn given_negative_error_in_local_config_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        "[sampler]\ninterval_error = -1.0\n",
    )
    .unwrap();

    let result = Settings::load(Some(dir.path()));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_malformed_local_config_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "[sampler\ninterval_length = ").unwrap();

    let result = Settings::load(Some(dir.path()));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_env_override_when_load_then_env_wins_over_local_config() {
    // Arrange
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        "[interpolation]\ny = [1.0]\n",
    )
    .unwrap();
    std::env::set_var("ARBOR_SAMPLER__INTERPOLATION__Y", "40, 80");

    // Act
    let result = Settings::load(Some(dir.path()));
    std::env::remove_var("ARBOR_SAMPLER__INTERPOLATION__Y");

    // Assert
    assert_eq!(result.unwrap().interpolation.y, vec![40.0, 80.0]);
}

#[test]
fn given_settings_when_to_toml_then_round_trips() {
    let mut settings = Settings::default();
    settings.interpolation.z = vec![4520.0];

    let content = settings.to_toml().unwrap();
    let parsed: Settings = toml::from_str(&content).unwrap();

    assert_eq!(parsed, settings);
}
