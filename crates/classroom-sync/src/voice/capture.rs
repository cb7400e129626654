//! Local microphone capture and the encode path.

use tracing::{debug, info};

use classroom_common::AudioError;

use super::backend::{AudioBackend, CaptureRequest, MicrophoneStream};
use super::codec;

/// Exclusive handle on the local microphone.
///
/// While active and unmuted every captured block becomes one `voice`
/// payload. Muting keeps the device open.
pub struct VoiceCapture {
    request: CaptureRequest,
    stream: Option<Box<dyn MicrophoneStream>>,
    muted: bool,
}

impl VoiceCapture {
    pub fn new(request: CaptureRequest, start_muted: bool) -> Self {
        Self {
            request,
            stream: None,
            muted: start_muted,
        }
    }

    /// Acquire the microphone. Returns `Ok(false)` if capture is already on.
    pub fn start(&mut self, backend: &dyn AudioBackend) -> Result<bool, AudioError> {
        if self.stream.is_some() {
            return Ok(false);
        }
        let stream = backend.open_microphone(&self.request)?;
        info!(
            backend = backend.name(),
            block_size = self.request.block_size,
            sample_rate = self.request.sample_rate,
            "Microphone capture started"
        );
        self.stream = Some(stream);
        Ok(true)
    }

    /// Release the microphone. Returns `false` if capture was already off.
    pub fn stop(&mut self) -> bool {
        match self.stream.take() {
            Some(_) => {
                info!("Microphone capture stopped");
                true
            }
            None => false,
        }
    }

    /// Reason the microphone stopped on its own, if the backend knows one.
    pub fn take_failure(&mut self) -> Option<AudioError> {
        self.stream.as_mut().and_then(|s| s.take_failure())
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    pub fn set_muted(&mut self, muted: bool) {
        if self.muted != muted {
            debug!(muted, "Microphone mute changed");
        }
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Next captured block. Pends forever while capture is off. `None` means
    /// the device ended on its own; the caller should `stop()`.
    pub async fn next_block(&mut self) -> Option<Vec<f32>> {
        match self.stream.as_mut() {
            Some(stream) => stream.blocks().recv().await,
            None => std::future::pending().await,
        }
    }

    /// Encode a block for transmission, or `None` while muted or stopped.
    pub fn encode(&self, block: &[f32]) -> Option<String> {
        if self.muted || !self.is_active() || block.is_empty() {
            return None;
        }
        Some(codec::encode_frame(block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::testing::RecordingBackend;
    use classroom_config::VoiceConfig;

    fn capture() -> VoiceCapture {
        VoiceCapture::new(CaptureRequest::from_config(&VoiceConfig::default()), false)
    }

    #[tokio::test]
    async fn start_requests_processing_and_delivers_blocks() {
        let backend = RecordingBackend::default();
        let mut cap = capture();
        assert!(cap.start(&backend).unwrap());
        assert!(!cap.start(&backend).unwrap());

        let request = backend.journal().capture_requests[0].clone();
        assert!(request.echo_cancellation && request.noise_suppression);
        assert_eq!(request.block_size, 4096);

        backend.feed().send(vec![0.5; 4096]).await.unwrap();
        let block = cap.next_block().await.unwrap();
        assert!(cap.encode(&block).is_some());
    }

    #[tokio::test]
    async fn muted_capture_stays_open_but_encodes_nothing() {
        let backend = RecordingBackend::default();
        let mut cap = capture();
        cap.start(&backend).unwrap();
        cap.set_muted(true);
        assert!(cap.is_muted());

        backend.feed().send(vec![0.5; 16]).await.unwrap();
        let block = cap.next_block().await.unwrap();
        assert!(cap.encode(&block).is_none());
        assert!(cap.is_active());

        cap.set_muted(false);
        assert!(cap.encode(&block).is_some());
    }

    #[test]
    fn stop_releases_device() {
        let backend = RecordingBackend::default();
        let mut cap = capture();
        cap.start(&backend).unwrap();
        assert!(cap.stop());
        assert!(!cap.stop());
        assert_eq!(backend.journal().microphones_released, 1);
        assert!(cap.encode(&[0.1]).is_none());
    }

    #[test]
    fn permission_denied_leaves_capture_off() {
        let backend = RecordingBackend {
            deny_microphone: true,
            ..Default::default()
        };
        let mut cap = capture();
        assert!(matches!(
            cap.start(&backend),
            Err(AudioError::PermissionDenied(_))
        ));
        assert!(!cap.is_active());
    }

    #[tokio::test]
    async fn idle_capture_pends() {
        let mut cap = capture();
        let res =
            tokio::time::timeout(std::time::Duration::from_millis(10), cap.next_block()).await;
        assert!(res.is_err());
    }
}
