//! Reading a config file into a [`ClassroomConfig`].
//!
//! This layer only parses. Range validation happens once, in
//! [`crate::load_config`] / [`crate::load_config_from`].

use std::path::Path;

use classroom_common::ConfigError;
use tracing::{debug, info};

use crate::schema::ClassroomConfig;

use super::paths::{create_default_config, default_config_path};

/// Parse the TOML file at `path`. Missing sections and fields take their
/// defaults; values are not range-checked here.
pub fn load_from_path(path: &Path) -> Result<ClassroomConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ConfigError::ParseError(format!(
                "failed to read {}: {e}",
                path.display()
            )))
        }
    };

    let config: ClassroomConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;

    debug!(path = %path.display(), "Parsed config file");
    Ok(config)
}

/// Parse the config at [`default_config_path`]. On first run the commented
/// template is written there and the defaults are returned.
pub fn load_default() -> Result<ClassroomConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            info!(path = %path.display(), "No config file yet, writing the default template");
            create_default_config(&path)?;
            Ok(ClassroomConfig::default())
        }
        other => other,
    }
}
