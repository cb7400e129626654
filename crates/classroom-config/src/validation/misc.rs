//! Validation for the smaller config sections: server, identity, voice, chat.

use crate::schema::ClassroomConfig;

use super::helpers::validate_range;

const SUPPORTED_SCHEMES: [&str; 4] = ["http://", "https://", "ws://", "wss://"];

/// Validate backend URL and reconnect policy.
pub(crate) fn validate_server(errors: &mut Vec<String>, config: &ClassroomConfig) {
    let server = &config.server;

    if !SUPPORTED_SCHEMES
        .iter()
        .any(|scheme| server.backend_url.starts_with(scheme))
    {
        errors.push(format!(
            "server.backend_url = {:?} must start with http://, https://, ws:// or wss://",
            server.backend_url
        ));
    }
    if server.room_path.trim_matches('/').is_empty() {
        errors.push("server.room_path must not be empty".to_string());
    }
    validate_range(
        errors,
        "server.connect_timeout_secs",
        server.connect_timeout_secs,
        1,
        120,
    );
    validate_range(
        errors,
        "server.reconnect_delay_ms",
        server.reconnect_delay_ms,
        10,
        60_000,
    );
    if server.max_reconnect_delay_ms < server.reconnect_delay_ms {
        errors.push(format!(
            "server.max_reconnect_delay_ms ({}) must be >= server.reconnect_delay_ms ({})",
            server.max_reconnect_delay_ms, server.reconnect_delay_ms
        ));
    }
}

/// Validate the display name.
pub(crate) fn validate_identity(errors: &mut Vec<String>, config: &ClassroomConfig) {
    let len = config.identity.username.chars().count();
    if len > 32 {
        errors.push(format!("identity.username is {len} characters, max is 32"));
    }
}

/// Validate voice constraints.
pub(crate) fn validate_voice(errors: &mut Vec<String>, config: &ClassroomConfig) {
    let voice = &config.voice;

    validate_range(errors, "voice.block_size", voice.block_size, 256, 16_384);
    if !voice.block_size.is_power_of_two() {
        errors.push(format!(
            "voice.block_size = {} must be a power of two",
            voice.block_size
        ));
    }
    validate_range(errors, "voice.sample_rate", voice.sample_rate, 8000, 96_000);
    validate_range(
        errors,
        "voice.activity_timeout_ms",
        voice.activity_timeout_ms,
        100,
        60_000,
    );
}

/// Validate chat constraints.
pub(crate) fn validate_chat(errors: &mut Vec<String>, config: &ClassroomConfig) {
    validate_range(errors, "chat.max_messages", config.chat.max_messages, 1, 100_000);
}
