//! Cloneable sender side of a running room.

use std::path::Path;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use classroom_common::RoomError;

use super::types::RoomCommand;
use crate::movement::Direction;
use crate::presence::ParticipantState;
use crate::whiteboard::load_image_file;

/// Sends local intents to the Room Controller. Dropping every handle stops
/// the controller's loop.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    tx: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub(crate) fn new(tx: mpsc::Sender<RoomCommand>) -> Self {
        Self { tx }
    }

    /// Queue a command without waiting. Returns `false` if it was dropped.
    pub fn send(&self, command: RoomCommand) -> bool {
        match self.tx.try_send(command) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "Room command dropped");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn connect(&self) -> bool {
        self.send(RoomCommand::Connect)
    }

    pub fn key_down(&self, direction: Direction) -> bool {
        self.send(RoomCommand::KeyDown(direction))
    }

    pub fn key_up(&self, direction: Direction) -> bool {
        self.send(RoomCommand::KeyUp(direction))
    }

    pub fn set_suspended(&self, suspended: bool) -> bool {
        self.send(RoomCommand::SetSuspended(suspended))
    }

    pub fn start_voice(&self) -> bool {
        self.send(RoomCommand::StartVoice)
    }

    pub fn stop_voice(&self) -> bool {
        self.send(RoomCommand::StopVoice)
    }

    pub fn set_muted(&self, muted: bool) -> bool {
        self.send(RoomCommand::SetMuted(muted))
    }

    pub fn send_chat(&self, text: impl Into<String>) -> bool {
        self.send(RoomCommand::SendChat(text.into()))
    }

    pub fn share_whiteboard(&self, image: impl Into<String>) -> bool {
        self.send(RoomCommand::ShareWhiteboard(image.into()))
    }

    /// Load an image file and share it. Movement is suspended while the file
    /// is read, the same as while a file picker is open.
    pub async fn share_whiteboard_file(&self, path: &Path) -> Result<(), RoomError> {
        self.set_suspended(true);
        let loaded = load_image_file(path).await;
        self.set_suspended(false);
        let image = loaded?;
        if !self.share_whiteboard(image) {
            return Err(RoomError::Other("room is not running".into()));
        }
        Ok(())
    }

    pub fn leave(&self) -> bool {
        self.send(RoomCommand::Leave)
    }

    /// Ask the running controller for its participant view.
    pub async fn snapshot(&self) -> Option<Vec<ParticipantState>> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(RoomCommand::Snapshot(tx)).await.ok()?;
        rx.await.ok()
    }
}
