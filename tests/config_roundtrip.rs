//! Configuration files on disk

use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use waypoint_rover::classification::FailurePolicyKind;
use waypoint_rover::config::AppConfig;
use waypoint_rover::core::types::{GridPosition, Heading};
use waypoint_rover::Error;

#[test]
fn saved_config_loads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rover.toml");

    let mut config = AppConfig::default();
    config.device.device_type = "mock".to_string();
    config.classification.on_error = FailurePolicyKind::Retry;
    config.route.waypoints = vec![GridPosition::new(0, 0), GridPosition::new(-1, 0)];
    config.to_file(&path).unwrap();

    let loaded = AppConfig::load(&path).unwrap();
    assert_eq!(loaded.device.device_type, "mock");
    assert_eq!(loaded.classification.on_error, FailurePolicyKind::Retry);
    assert_eq!(loaded.route.waypoints, config.route.waypoints);
    // The built-in U-turn belongs to the built-in route only
    assert!(loaded.route.wide_arcs().is_empty());
    assert_eq!(loaded.hardware.candidate_addresses, vec![0x5F, 0x40, 0x41, 0x60]);
}

#[test]
fn shipped_config_is_valid() {
    let config = AppConfig::load(concat!(env!("CARGO_MANIFEST_DIR"), "/rover.toml")).unwrap();
    assert_eq!(config.route.waypoints.len(), 6);
    assert_eq!(config.route.wide_arcs()[0].heading_after, Heading::West);
    assert_eq!(config.calibration.steer_right, 167.0);
    assert_eq!(config.classification.transcriber.command.len(), 1);
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    assert!(matches!(AppConfig::load(&path), Err(Error::Config(_))));
    let config = AppConfig::load_or_default(&path).unwrap();
    assert_eq!(config.device.device_type, "pca9685");
}

#[test]
fn invalid_values_are_rejected_on_load() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[calibration]\ndrive_speed = 140.0").unwrap();
    assert!(matches!(AppConfig::load(file.path()), Err(Error::Config(_))));

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[route]\nwaypoints = \"not a list\"").unwrap();
    assert!(matches!(AppConfig::load(file.path()), Err(Error::Config(_))));
}
