//! Audio device seam.
//!
//! The voice pipeline never touches a sound card directly. It asks an
//! [`AudioBackend`] for a microphone stream and for one output context per
//! remote participant; dropping either releases the device.

use tokio::sync::mpsc;

use classroom_common::{AudioError, ParticipantId};
use classroom_config::VoiceConfig;

/// What the capture side asks the device for.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    /// Samples per delivered block.
    pub block_size: usize,
    pub sample_rate: u32,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
}

impl CaptureRequest {
    pub fn from_config(config: &VoiceConfig) -> Self {
        Self {
            block_size: config.block_size as usize,
            sample_rate: config.sample_rate,
            echo_cancellation: config.echo_cancellation,
            noise_suppression: config.noise_suppression,
        }
    }
}

/// A mono buffer ready to play.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn duration(&self) -> std::time::Duration {
        if self.sample_rate == 0 {
            return std::time::Duration::ZERO;
        }
        std::time::Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

/// An open microphone. Mono f32 blocks of the requested size arrive on
/// `blocks()`; the channel closes if the device stops on its own.
pub trait MicrophoneStream: Send {
    fn blocks(&mut self) -> &mut mpsc::Receiver<Vec<f32>>;

    /// Why the device stopped, once `blocks()` has closed. Backends that
    /// open asynchronously report setup failures here.
    fn take_failure(&mut self) -> Option<AudioError> {
        None
    }
}

/// One remote participant's playback path.
pub trait OutputContext: Send {
    /// Start playing immediately, overlapping anything still playing.
    fn play(&mut self, buffer: AudioBuffer) -> Result<(), AudioError>;
}

pub trait AudioBackend: Send {
    fn name(&self) -> &'static str;

    fn open_microphone(
        &self,
        request: &CaptureRequest,
    ) -> Result<Box<dyn MicrophoneStream>, AudioError>;

    fn open_output(
        &self,
        participant: &ParticipantId,
        sample_rate: u32,
    ) -> Result<Box<dyn OutputContext>, AudioError>;
}

// ---------------------------------------------------------------------------
// Null backend
// ---------------------------------------------------------------------------

/// Headless backend: there is no microphone, and received audio is decoded
/// and then discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

struct NullOutput;

impl OutputContext for NullOutput {
    fn play(&mut self, _buffer: AudioBuffer) -> Result<(), AudioError> {
        Ok(())
    }
}

impl AudioBackend for NullBackend {
    fn name(&self) -> &'static str {
        "null"
    }

    fn open_microphone(
        &self,
        _request: &CaptureRequest,
    ) -> Result<Box<dyn MicrophoneStream>, AudioError> {
        Err(AudioError::Unavailable(
            "no audio input in this build".into(),
        ))
    }

    fn open_output(
        &self,
        _participant: &ParticipantId,
        _sample_rate: u32,
    ) -> Result<Box<dyn OutputContext>, AudioError> {
        Ok(Box::new(NullOutput))
    }
}
