//! Room transport over a single WebSocket.
//!
//! Owns the connect / reconnect / disconnect lifecycle. The connection
//! runs in a background task with exponential backoff; the Room Controller
//! only sees `Connected` / `Disconnected` transitions and decoded room
//! events.

mod connection;
mod endpoint;
mod session;
mod types;

pub use endpoint::room_endpoint;
pub use session::TransportSession;
pub use types::{TransportConfig, TransportEvent};

#[cfg(test)]
pub(crate) use types::TransportCommand;
