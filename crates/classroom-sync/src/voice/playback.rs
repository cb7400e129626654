//! Per-peer decode and playback.

use std::collections::HashMap;

use tracing::{debug, warn};

use classroom_common::ParticipantId;

use super::backend::{AudioBackend, AudioBuffer, OutputContext};
use super::codec;

/// One output context per remote participant, opened on that participant's
/// first frame and closed on leave or teardown.
pub struct VoicePlayback {
    sample_rate: u32,
    contexts: HashMap<ParticipantId, Box<dyn OutputContext>>,
}

impl VoicePlayback {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            contexts: HashMap::new(),
        }
    }

    /// Decode one frame and play it through `id`'s context. Failures are
    /// logged and confined to this frame. Returns whether audio was played.
    pub fn handle_frame(
        &mut self,
        backend: &dyn AudioBackend,
        id: &ParticipantId,
        payload: &str,
    ) -> bool {
        let samples = match codec::decode_frame(payload) {
            Ok(samples) => samples,
            Err(e) => {
                warn!(participant = %id, error = %e, "Dropping undecodable voice frame");
                return false;
            }
        };
        if samples.is_empty() {
            return false;
        }

        if !self.contexts.contains_key(id) {
            match backend.open_output(id, self.sample_rate) {
                Ok(ctx) => {
                    debug!(participant = %id, "Opened voice output");
                    self.contexts.insert(id.clone(), ctx);
                }
                Err(e) => {
                    warn!(participant = %id, error = %e, "Failed to open voice output");
                    return false;
                }
            }
        }
        let Some(ctx) = self.contexts.get_mut(id) else {
            return false;
        };

        let buffer = AudioBuffer {
            samples,
            sample_rate: self.sample_rate,
        };
        match ctx.play(buffer) {
            Ok(()) => true,
            Err(e) => {
                warn!(participant = %id, error = %e, "Voice playback failed");
                false
            }
        }
    }

    /// Close `id`'s context. Returns whether one existed.
    pub fn release(&mut self, id: &ParticipantId) -> bool {
        let released = self.contexts.remove(id).is_some();
        if released {
            debug!(participant = %id, "Closed voice output");
        }
        released
    }

    /// Close every context and return how many were open.
    pub fn release_all(&mut self) -> usize {
        let n = self.contexts.len();
        self.contexts.clear();
        n
    }

    pub fn has_context(&self, id: &ParticipantId) -> bool {
        self.contexts.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}
