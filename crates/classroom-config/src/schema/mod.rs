//! Configuration schema types for the classroom client.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the values the classroom has always
//! shipped with.

mod chat;
mod movement;
mod server;
mod system;
mod voice;

pub use chat::*;
pub use movement::*;
pub use server::*;
pub use system::*;
pub use voice::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassroomConfig {
    pub server: ServerConfig,
    pub identity: IdentityConfig,
    pub movement: MovementConfig,
    pub voice: VoiceConfig,
    pub chat: ChatConfig,
    pub logging: LoggingConfig,
}
