//! Tests for TOML config loading, creation, and path resolution.

use super::*;
use std::path::{Path, PathBuf};

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let result = load_from_path(Path::new("/tmp/nonexistent_classroom_config.toml"));
    assert!(matches!(
        result.unwrap_err(),
        classroom_common::ConfigError::FileNotFound(_)
    ));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r##"
[server]
backend_url = "https://school.example.com/vr"

[identity]
username = "ada"

[movement.bounds]
max_x = 20.0
"##,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.server.backend_url, "https://school.example.com/vr");
    assert_eq!(config.identity.username, "ada");
    assert_eq!(config.movement.bounds.max_x, 20.0);
    // Defaults preserved
    assert_eq!(config.movement.bounds.min_x, -10.0);
    assert_eq!(config.voice.block_size, 4096);
    assert_eq!(config.server.room_path, "vr");
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, classroom_common::ConfigError::ParseError(_)));
}

#[test]
fn loader_does_not_range_check() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[voice]
block_size = 1000
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.voice.block_size, 1000);
}

#[test]
fn create_and_load_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("classroom").join("config.toml");

    create_default_config(&path).unwrap();
    assert!(path.exists());

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.server.backend_url, "http://localhost:5000");
    assert_eq!(config.movement.tick_interval_ms, 33);
    assert!(crate::validation::validate(&config).is_ok());
}

#[test]
fn config_path_falls_back_to_platform_dir() {
    if let Ok(path) = paths::resolve_config_path(None) {
        assert!(path.ends_with("classroom/config.toml"));
    }
    if let Ok(path) = paths::resolve_config_path(Some(PathBuf::new())) {
        assert!(path.ends_with("classroom/config.toml"));
    }
}

#[test]
fn config_path_env_override_wins() {
    let path = paths::resolve_config_path(Some(PathBuf::from("/srv/room.toml"))).unwrap();
    assert_eq!(path, PathBuf::from("/srv/room.toml"));
}

#[test]
fn log_level_parses_lowercase() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.logging.level, crate::schema::LogLevel::Debug);
}
