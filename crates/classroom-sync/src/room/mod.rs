//! Room Controller.
//!
//! Composes transport, presence, movement, voice, whiteboard and chat into
//! one session with the lifecycle
//! `Disconnected -> Connecting -> Joined -> Disconnected`.
//! All room state is owned by a single task; local intents come in through
//! [`RoomHandle`] and render-facing changes go out as [`RoomUpdate`]s.

mod controller;
mod handle;
mod types;

#[cfg(test)]
mod tests;

pub use controller::RoomController;
pub use handle::RoomHandle;
pub use types::{RoomCommand, RoomState, RoomUpdate};
