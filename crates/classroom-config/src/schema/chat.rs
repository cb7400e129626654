use serde::{Deserialize, Serialize};

/// Chat log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Messages retained locally; the oldest are evicted first.
    pub max_messages: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { max_messages: 500 }
    }
}
