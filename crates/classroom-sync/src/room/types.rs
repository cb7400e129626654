//! Commands into and updates out of the Room Controller.

use std::fmt;

use tokio::sync::oneshot;

use classroom_common::{ParticipantId, Position};

use crate::chat::ChatMessage;
use crate::movement::Direction;
use crate::presence::{Participant, ParticipantState};

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    Disconnected,
    /// Transport connecting or connected, waiting for the join ack.
    Connecting,
    Joined,
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Joined => "joined",
        };
        f.write_str(s)
    }
}

/// Local intents, sent through a [`RoomHandle`](super::RoomHandle).
#[derive(Debug)]
pub enum RoomCommand {
    /// Connect (or reconnect after a leave).
    Connect,
    KeyDown(Direction),
    KeyUp(Direction),
    /// Suspend movement while a modal input has focus.
    SetSuspended(bool),
    StartVoice,
    StopVoice,
    SetMuted(bool),
    SendChat(String),
    /// Share an image (usually a `data:` URI) on the whiteboard.
    ShareWhiteboard(String),
    /// Current participant view for rendering.
    Snapshot(oneshot::Sender<Vec<ParticipantState>>),
    Leave,
}

/// What the UI needs to redraw.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomUpdate {
    StateChanged(RoomState),
    ParticipantJoined(Participant),
    ParticipantLeft(ParticipantId),
    /// The roster was replaced by a full snapshot.
    RosterReplaced(Vec<Participant>),
    SpeakingChanged {
        id: ParticipantId,
        speaking: bool,
    },
    WhiteboardChanged {
        writer: String,
    },
    ChatReceived(ChatMessage),
    /// Self moved and the new position was broadcast.
    LocalMoved(Position),
    /// Capture started or stopped.
    VoiceCaptureChanged {
        active: bool,
    },
    /// Recoverable problem worth showing the user.
    Notice(String),
}
