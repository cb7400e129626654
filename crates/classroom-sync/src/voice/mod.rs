//! Voice pipeline.
//!
//! Capture turns microphone blocks into `voice` payloads; playback keeps one
//! output context per remote participant and plays each received frame
//! immediately. Speaking indicators are tracked separately with a timeout
//! fallback. Device access goes through [`AudioBackend`] so the room logic
//! runs headless.

mod activity;
mod backend;
mod capture;
pub mod codec;
#[cfg(feature = "device-audio")]
mod device;
mod playback;

#[cfg(test)]
pub(crate) mod testing;

pub use activity::VoiceActivity;
pub use backend::{
    AudioBackend, AudioBuffer, CaptureRequest, MicrophoneStream, NullBackend, OutputContext,
};
pub use capture::VoiceCapture;
#[cfg(feature = "device-audio")]
pub use device::CpalBackend;
pub use playback::VoicePlayback;
