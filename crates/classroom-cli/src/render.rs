//! One-line text for each room update.

use classroom_common::Position;
use classroom_sync::{ParticipantState, RoomUpdate};

fn pos(p: &Position) -> String {
    format!("({:.2}, {:.2}, {:.2})", p.x, p.y, p.z)
}

pub fn describe(update: &RoomUpdate) -> String {
    match update {
        RoomUpdate::StateChanged(state) => format!("* {state}"),
        RoomUpdate::ParticipantJoined(p) => format!("+ {} joined", p.display_name),
        RoomUpdate::ParticipantLeft(id) => format!("- {id} left"),
        RoomUpdate::RosterReplaced(roster) => {
            let names: Vec<&str> = roster.iter().map(|p| p.display_name.as_str()).collect();
            if names.is_empty() {
                "* nobody else is here".to_string()
            } else {
                format!("* here: {}", names.join(", "))
            }
        }
        RoomUpdate::SpeakingChanged { id, speaking: true } => format!("~ {id} is speaking"),
        RoomUpdate::SpeakingChanged { id, speaking: false } => format!("~ {id} stopped"),
        RoomUpdate::WhiteboardChanged { writer } => format!("# whiteboard updated by {writer}"),
        RoomUpdate::ChatReceived(msg) => format!("<{}> {}", msg.author_name, msg.text),
        RoomUpdate::LocalMoved(p) => format!("> at {}", pos(p)),
        RoomUpdate::VoiceCaptureChanged { active: true } => "~ microphone on".to_string(),
        RoomUpdate::VoiceCaptureChanged { active: false } => "~ microphone off".to_string(),
        RoomUpdate::Notice(text) => format!("! {text}"),
    }
}

/// Roster line for `/who`.
pub fn describe_participant(p: &ParticipantState) -> String {
    let mut line = format!("  {} [{}] {}", p.display_name, p.id, pos(&p.rendered_position));
    if p.last_known_position.is_none() {
        line.push_str(" waiting");
    }
    if p.speaking {
        line.push_str(" speaking");
    }
    line
}
