pub mod errors;
pub mod id;
pub mod protocol;

pub use errors::{AudioError, ConfigError, RoomError, TransportError};
pub use id::{new_id, ParticipantId};
pub use protocol::{ClientEvent, Position, ServerEvent, UserEntry, ROOM_PATH};

pub type Result<T> = std::result::Result<T, RoomError>;
