//! Backend connection and identity configuration types.

use serde::{Deserialize, Serialize};

/// Where the room channel lives and how the transport retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Backend base URL. A trailing room segment is tolerated and stripped.
    pub backend_url: String,
    /// Path segment of the room channel on the backend.
    pub room_path: String,
    /// Seconds to wait for the WebSocket handshake.
    pub connect_timeout_secs: u32,
    /// Base reconnect delay in milliseconds.
    pub reconnect_delay_ms: u32,
    /// Upper bound for the exponential reconnect delay in milliseconds.
    pub max_reconnect_delay_ms: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:5000".into(),
            room_path: classroom_common::ROOM_PATH.into(),
            connect_timeout_secs: 15,
            reconnect_delay_ms: 500,
            max_reconnect_delay_ms: 30_000,
        }
    }
}

/// Local participant identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Display name announced on join. Empty means "ask at startup".
    pub username: String,
}
