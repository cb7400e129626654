//! Classroom configuration system.
//!
//! Provides TOML-based configuration with validation. All config sections
//! use sensible defaults so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use classroom_config::{load_config, config_to_json};
//!
//! let config = load_config().expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    ChatConfig, ClassroomConfig, IdentityConfig, LogLevel, LoggingConfig, MovementConfig,
    RoomBounds, ServerConfig, VoiceConfig, CONFIG_SCHEMA_VERSION,
};

use classroom_common::ConfigError;
use std::path::Path;

/// Load config from the platform default path, creating it if missing,
/// then validate.
pub fn load_config() -> Result<ClassroomConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Load config from an explicit path (e.g. a `--config` override), then validate.
pub fn load_config_from(path: &Path) -> Result<ClassroomConfig, ConfigError> {
    let config = toml_loader::load_from_path(path)?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &ClassroomConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
