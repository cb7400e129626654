//! Presence registry: the authoritative set of remote participants.
//!
//! Replaced wholesale by the `usersList` snapshot on every (re)join and
//! diffed by `userJoined` / `userLeft`. The local participant is never a
//! member.

mod registry;
mod types;

pub use registry::PresenceRegistry;
pub use types::{Participant, ParticipantState};
