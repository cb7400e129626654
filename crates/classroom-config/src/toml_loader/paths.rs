//! Where the config file lives.

use std::path::{Path, PathBuf};

use classroom_common::ConfigError;
use tracing::info;

use super::template::default_config_toml;

/// Environment variable that points the client at a different config file.
pub const CONFIG_ENV: &str = "CLASSROOM_CONFIG";

/// `$CLASSROOM_CONFIG` if set and non-empty, otherwise
/// `<platform config dir>/classroom/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    resolve_config_path(std::env::var_os(CONFIG_ENV).map(PathBuf::from))
}

pub(crate) fn resolve_config_path(env_override: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = env_override.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path);
    }
    dirs::config_dir()
        .map(|dir| dir.join("classroom").join("config.toml"))
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))
}

/// Write the commented default template to `path`, creating parent
/// directories as needed.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let write_err = |what: &str, p: &Path, e: std::io::Error| {
        ConfigError::ParseError(format!("failed to {what} {}: {e}", p.display()))
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| write_err("create", parent, e))?;
    }
    std::fs::write(path, default_config_toml()).map_err(|e| write_err("write", path, e))?;

    info!(path = %path.display(), "Wrote default config");
    Ok(())
}
