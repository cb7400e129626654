//! Wire protocol for the classroom room channel.
//!
//! Every WebSocket text frame carries one JSON envelope
//! `{"event": "<name>", "data": { ... }}`. Field names inside `data` are
//! camelCase. `ClientEvent` flows from a participant to the relay,
//! `ServerEvent` flows from the relay to participants.

use serde::{Deserialize, Serialize};

use crate::id::ParticipantId;

/// Path segment the room channel is mounted under on the backend.
pub const ROOM_PATH: &str = "vr";

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A point in room space. Serialized as `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f32; 3]> for Position {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Position> for [f32; 3] {
    fn from(p: Position) -> Self {
        [p.x, p.y, p.z]
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// One entry of the `usersList` snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntry {
    pub username: String,
    pub socket_id: ParticipantId,
}

/// Events a participant sends to the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    Join { username: String },
    PlayerMove { position: Position },
    VoiceStart {},
    VoiceEnd {},
    Voice { audio_data: String },
    WhiteboardImage { image_url: String, username: String },
    ChatMessage { message: String, username: String },
}

/// Events the relay delivers to a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Join acknowledgement carrying the receiver's own transport id.
    Joined {
        socket_id: ParticipantId,
        username: String,
    },
    /// Full membership snapshot, sent once per (re)connection.
    UsersList { users: Vec<UserEntry> },
    UserJoined {
        username: String,
        socket_id: ParticipantId,
    },
    UserLeft { socket_id: ParticipantId },
    PlayerMoved {
        socket_id: ParticipantId,
        position: Position,
    },
    UserVoiceStart {
        username: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        socket_id: Option<ParticipantId>,
    },
    UserVoiceEnd {
        username: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        socket_id: Option<ParticipantId>,
    },
    Voice {
        audio_data: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        socket_id: Option<ParticipantId>,
    },
    WhiteboardUpdate { image_url: String, username: String },
    ChatMessage { message: String, username: String },
}

impl ClientEvent {
    /// Event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::PlayerMove { .. } => "playerMove",
            Self::VoiceStart {} => "voiceStart",
            Self::VoiceEnd {} => "voiceEnd",
            Self::Voice { .. } => "voice",
            Self::WhiteboardImage { .. } => "whiteboardImage",
            Self::ChatMessage { .. } => "chatMessage",
        }
    }
}

impl ServerEvent {
    /// Event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Joined { .. } => "joined",
            Self::UsersList { .. } => "usersList",
            Self::UserJoined { .. } => "userJoined",
            Self::UserLeft { .. } => "userLeft",
            Self::PlayerMoved { .. } => "playerMoved",
            Self::UserVoiceStart { .. } => "userVoiceStart",
            Self::UserVoiceEnd { .. } => "userVoiceEnd",
            Self::Voice { .. } => "voice",
            Self::WhiteboardUpdate { .. } => "whiteboardUpdate",
            Self::ChatMessage { .. } => "chatMessage",
        }
    }
}
