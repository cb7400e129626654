//! Configuration and event/command enums for the room transport.

use std::time::Duration;

use classroom_common::{ClientEvent, ServerEvent, TransportError};
use classroom_config::ServerConfig;

use super::endpoint::room_endpoint;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for connecting to the room channel.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Fully-derived WebSocket URL of the room channel.
    pub endpoint: String,
    /// Handshake timeout.
    pub connect_timeout: Duration,
    /// Reconnect base delay.
    pub reconnect_delay: Duration,
    /// Maximum reconnect delay.
    pub max_reconnect_delay: Duration,
}

impl TransportConfig {
    /// Build the transport settings from the `[server]` config section.
    pub fn from_server(server: &ServerConfig) -> Result<Self, TransportError> {
        Ok(Self {
            endpoint: room_endpoint(&server.backend_url, &server.room_path)?,
            connect_timeout: Duration::from_secs(u64::from(server.connect_timeout_secs)),
            reconnect_delay: Duration::from_millis(u64::from(server.reconnect_delay_ms)),
            max_reconnect_delay: Duration::from_millis(u64::from(server.max_reconnect_delay_ms)),
        })
    }
}

// ---------------------------------------------------------------------------
// Events & Commands
// ---------------------------------------------------------------------------

/// Events emitted by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// WebSocket connection established (first connect or reconnect).
    Connected,
    /// WebSocket connection lost or closed.
    Disconnected,
    /// A room event received from the relay.
    Message(ServerEvent),
    /// Connect attempt failed; the transport keeps retrying.
    Error(String),
}

/// Commands sent to the background connection task.
#[derive(Debug)]
pub(crate) enum TransportCommand {
    Send(ClientEvent),
    Disconnect,
}
