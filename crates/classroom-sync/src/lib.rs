//! Real-time synchronization for a shared 3D classroom.
//!
//! A [`RoomController`] keeps one participant consistent with everyone else
//! in the room: presence, positions, voice, the whiteboard and chat, all over
//! a single reconnecting WebSocket.

pub mod chat;
pub mod movement;
pub mod presence;
pub mod room;
pub mod transport;
pub mod voice;
pub mod whiteboard;

pub use chat::{ChatLog, ChatMessage};
pub use movement::{Direction, MovementSynchronizer};
pub use presence::{Participant, ParticipantState, PresenceRegistry};
pub use room::{RoomCommand, RoomController, RoomHandle, RoomState, RoomUpdate};
pub use transport::{room_endpoint, TransportConfig, TransportEvent, TransportSession};
pub use voice::{AudioBackend, NullBackend};
#[cfg(feature = "device-audio")]
pub use voice::CpalBackend;
pub use whiteboard::{load_image_file, WhiteboardState};
