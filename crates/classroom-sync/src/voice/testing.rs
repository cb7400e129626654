//! Recording backend for tests.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use classroom_common::{AudioError, ParticipantId};

use super::backend::{AudioBackend, AudioBuffer, CaptureRequest, MicrophoneStream, OutputContext};

/// What the recording backend has seen so far.
#[derive(Debug, Default)]
pub(crate) struct Journal {
    pub opened_outputs: Vec<ParticipantId>,
    pub closed_outputs: Vec<ParticipantId>,
    pub played: Vec<(ParticipantId, AudioBuffer)>,
    pub capture_requests: Vec<CaptureRequest>,
    pub microphones_released: usize,
}

#[derive(Clone, Default)]
pub(crate) struct RecordingBackend {
    pub journal: Arc<Mutex<Journal>>,
    /// Feeds the most recently opened microphone.
    pub mic_feed: Arc<Mutex<Option<mpsc::Sender<Vec<f32>>>>>,
    pub deny_microphone: bool,
    /// Reported by the microphone after its block channel closes, the way a
    /// backend that opens devices off-thread reports a late setup failure.
    pub mic_failure: Option<AudioError>,
    /// Output contexts for these ids fail to open.
    pub broken_outputs: Vec<ParticipantId>,
}

impl RecordingBackend {
    pub fn journal(&self) -> std::sync::MutexGuard<'_, Journal> {
        self.journal.lock().unwrap()
    }

    pub fn feed(&self) -> mpsc::Sender<Vec<f32>> {
        self.mic_feed.lock().unwrap().clone().expect("microphone not open")
    }

    pub fn open_outputs(&self) -> usize {
        let journal = self.journal();
        journal.opened_outputs.len() - journal.closed_outputs.len()
    }
}

struct RecordingMic {
    blocks: mpsc::Receiver<Vec<f32>>,
    failure: Option<AudioError>,
    journal: Arc<Mutex<Journal>>,
}

impl MicrophoneStream for RecordingMic {
    fn blocks(&mut self) -> &mut mpsc::Receiver<Vec<f32>> {
        &mut self.blocks
    }

    fn take_failure(&mut self) -> Option<AudioError> {
        self.failure.take()
    }
}

impl Drop for RecordingMic {
    fn drop(&mut self) {
        self.journal.lock().unwrap().microphones_released += 1;
    }
}

struct RecordingOutput {
    id: ParticipantId,
    journal: Arc<Mutex<Journal>>,
}

impl OutputContext for RecordingOutput {
    fn play(&mut self, buffer: AudioBuffer) -> Result<(), AudioError> {
        self.journal
            .lock()
            .unwrap()
            .played
            .push((self.id.clone(), buffer));
        Ok(())
    }
}

impl Drop for RecordingOutput {
    fn drop(&mut self) {
        self.journal
            .lock()
            .unwrap()
            .closed_outputs
            .push(self.id.clone());
    }
}

impl AudioBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn open_microphone(
        &self,
        request: &CaptureRequest,
    ) -> Result<Box<dyn MicrophoneStream>, AudioError> {
        if self.deny_microphone {
            return Err(AudioError::PermissionDenied("denied by test".into()));
        }
        self.journal().capture_requests.push(request.clone());
        let (tx, rx) = mpsc::channel(64);
        *self.mic_feed.lock().unwrap() = Some(tx);
        Ok(Box::new(RecordingMic {
            blocks: rx,
            failure: self.mic_failure.clone(),
            journal: self.journal.clone(),
        }))
    }

    fn open_output(
        &self,
        participant: &ParticipantId,
        _sample_rate: u32,
    ) -> Result<Box<dyn OutputContext>, AudioError> {
        if self.broken_outputs.contains(participant) {
            return Err(AudioError::Device("broken by test".into()));
        }
        self.journal().opened_outputs.push(participant.clone());
        Ok(Box::new(RecordingOutput {
            id: participant.clone(),
            journal: self.journal.clone(),
        }))
    }
}
