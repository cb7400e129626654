//! Room endpoint derivation from the configured backend base URL.

use classroom_common::TransportError;

/// Derive the WebSocket URL of the room channel.
///
/// Trailing slashes and one trailing room segment are stripped from the
/// base before the room segment is re-appended, so both
/// `https://host/api` and `https://host/api/vr/` resolve to
/// `wss://host/api/vr`. HTTP schemes are mapped to their WebSocket
/// counterparts.
pub fn room_endpoint(backend_url: &str, room_path: &str) -> Result<String, TransportError> {
    let room = room_path.trim_matches('/');
    if room.is_empty() {
        return Err(TransportError::InvalidEndpoint("empty room path".into()));
    }

    let base = backend_url.trim().trim_end_matches('/');
    let room_suffix = format!("/{room}");
    let base = base.strip_suffix(room_suffix.as_str()).unwrap_or(base);

    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if base.starts_with("ws://") || base.starts_with("wss://") {
        base.to_string()
    } else {
        return Err(TransportError::InvalidEndpoint(backend_url.to_string()));
    };

    if ws_base.ends_with("://") {
        return Err(TransportError::InvalidEndpoint(backend_url.to_string()));
    }

    Ok(format!("{ws_base}/{room}"))
}
