//! Participant types.

use classroom_common::{ParticipantId, Position, UserEntry};

/// A remote peer as the registry knows it.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
}

impl Participant {
    pub fn new(id: impl Into<ParticipantId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

impl From<UserEntry> for Participant {
    fn from(entry: UserEntry) -> Self {
        Self {
            id: entry.socket_id,
            display_name: entry.username,
        }
    }
}

/// Render-facing view of a participant, joined from the registry, the
/// movement synchronizer, and the voice-activity tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantState {
    pub id: ParticipantId,
    pub display_name: String,
    /// Latest received target position; `None` until the first sample.
    pub last_known_position: Option<Position>,
    /// Smoothed position to draw this frame.
    pub rendered_position: Position,
    pub speaking: bool,
}
