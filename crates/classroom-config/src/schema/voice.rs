//! Voice capture and playback configuration types.

use serde::{Deserialize, Serialize};

/// Voice pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Samples per captured block; must be a power of two.
    pub block_size: u32,
    /// Sample rate of transmitted and played PCM.
    pub sample_rate: u32,
    /// Speaking indicators clear after this long without an explicit end.
    pub activity_timeout_ms: u32,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    /// Join with the microphone muted.
    pub start_muted: bool,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            block_size: 4096,
            sample_rate: 44_100,
            activity_timeout_ms: 2000,
            echo_cancellation: true,
            noise_suppression: true,
            start_muted: false,
        }
    }
}
