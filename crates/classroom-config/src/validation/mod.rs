//! Full configuration validation.
//!
//! Each section has its own submodule; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod helpers;
mod movement;
mod misc;


use crate::schema::ClassroomConfig;
use classroom_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &ClassroomConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    misc::validate_server(&mut errors, config);
    misc::validate_identity(&mut errors, config);
    movement::validate_movement(&mut errors, config);
    misc::validate_voice(&mut errors, config);
    misc::validate_chat(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
