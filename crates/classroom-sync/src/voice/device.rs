//! Sound card backend built on cpal.
//!
//! cpal streams are not `Send` on every platform, so each stream lives on a
//! dedicated thread that owns it until the stop sender is dropped. Opening a
//! device never blocks the caller: the thread reports whether the stream
//! started on a oneshot that the owner polls later.

use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use classroom_common::{AudioError, ParticipantId};

use super::backend::{AudioBackend, AudioBuffer, CaptureRequest, MicrophoneStream, OutputContext};

/// Default input and output devices of the default cpal host.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }
}

fn stream_error(e: cpal::BuildStreamError) -> AudioError {
    match e {
        cpal::BuildStreamError::DeviceNotAvailable => {
            AudioError::Unavailable("audio device not available".into())
        }
        other => AudioError::Device(other.to_string()),
    }
}

/// Classify a platform message from the capture path. Hosts report a
/// refused microphone only as backend text.
fn input_error(description: String) -> AudioError {
    let lower = description.to_lowercase();
    let refused = ["permission", "denied", "not permitted", "unauthorized", "access"]
        .iter()
        .any(|needle| lower.contains(needle));
    if refused {
        AudioError::PermissionDenied(description)
    } else {
        AudioError::Device(description)
    }
}

fn input_stream_error(e: cpal::BuildStreamError) -> AudioError {
    match e {
        cpal::BuildStreamError::BackendSpecific { err } => input_error(err.description),
        other => stream_error(other),
    }
}

/// Owns a stream thread. Dropping it drops the stop sender, and the thread
/// releases the stream on its own.
struct StreamThread {
    _stop: std_mpsc::Sender<()>,
    ready: Option<oneshot::Receiver<Result<(), AudioError>>>,
    failure: Option<AudioError>,
}

impl StreamThread {
    /// Run `build` on a new thread and keep the playing stream it returns
    /// alive until dropped. `hold` is released only after the outcome is
    /// reported, so a channel it keeps open cannot close before `status`
    /// can see why.
    fn spawn<H, F>(name: &str, hold: H, build: F) -> Result<Self, AudioError>
    where
        H: Send + 'static,
        F: FnOnce() -> Result<cpal::Stream, AudioError> + Send + 'static,
    {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();

        std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let stream = build();
                let _ = ready_tx.send(stream.as_ref().map(|_| ()).map_err(Clone::clone));
                drop(hold);
                if let Ok(stream) = stream {
                    // Returns once the owner drops the sender.
                    let _ = stop_rx.recv();
                    drop(stream);
                }
            })
            .map_err(|e| AudioError::Device(format!("failed to spawn audio thread: {e}")))?;

        Ok(Self {
            _stop: stop_tx,
            ready: Some(ready_rx),
            failure: None,
        })
    }

    /// `Ok` while the stream is starting or running; the setup error once
    /// the thread has reported one.
    fn status(&mut self) -> Result<(), AudioError> {
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        let Some(ready) = self.ready.as_mut() else {
            return Ok(());
        };
        let failure = match ready.try_recv() {
            Err(oneshot::error::TryRecvError::Empty) => return Ok(()),
            Ok(Ok(())) => {
                self.ready = None;
                return Ok(());
            }
            Ok(Err(e)) => e,
            Err(oneshot::error::TryRecvError::Closed) => {
                AudioError::Device("audio thread exited during setup".into())
            }
        };
        warn!(error = %failure, "Audio stream failed to start");
        self.ready = None;
        self.failure = Some(failure.clone());
        Err(failure)
    }
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

struct CpalMicrophone {
    blocks: mpsc::Receiver<Vec<f32>>,
    thread: StreamThread,
}

impl MicrophoneStream for CpalMicrophone {
    fn blocks(&mut self) -> &mut mpsc::Receiver<Vec<f32>> {
        &mut self.blocks
    }

    fn take_failure(&mut self) -> Option<AudioError> {
        self.thread.status().err()
    }
}

/// Input callback state: downmix interleaved frames to mono and cut the
/// result into fixed-size blocks.
struct Reblocker {
    channels: usize,
    block_size: usize,
    pending: Vec<f32>,
    tx: mpsc::Sender<Vec<f32>>,
}

impl Reblocker {
    fn push<T>(&mut self, data: &[T])
    where
        T: Sample,
        f32: FromSample<T>,
    {
        for frame in data.chunks(self.channels) {
            let sum: f32 = frame.iter().map(|s| f32::from_sample(*s)).sum();
            self.pending.push(sum / frame.len() as f32);
            if self.pending.len() == self.block_size {
                let block = std::mem::replace(&mut self.pending, Vec::with_capacity(self.block_size));
                // Full queue means the room loop is behind; drop the block.
                let _ = self.tx.try_send(block);
            }
        }
    }
}

fn build_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut reblocker: Reblocker,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| reblocker.push(data),
            |err| warn!(error = %err, "Microphone stream error"),
            None,
        )
        .map_err(input_stream_error)
}

fn open_input_stream(
    request: CaptureRequest,
    tx: mpsc::Sender<Vec<f32>>,
) -> Result<cpal::Stream, AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| AudioError::Unavailable("no input device".into()))?;
    let supported = device.default_input_config().map_err(|e| match e {
        cpal::DefaultStreamConfigError::BackendSpecific { err } => input_error(err.description),
        other => AudioError::Unavailable(other.to_string()),
    })?;

    let config = cpal::StreamConfig {
        channels: supported.channels(),
        sample_rate: cpal::SampleRate(request.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };
    info!(
        device = %device.name().unwrap_or_default(),
        channels = config.channels,
        sample_rate = request.sample_rate,
        "Opening microphone"
    );
    if request.echo_cancellation || request.noise_suppression {
        debug!("Echo cancellation and noise suppression are left to the OS audio stack");
    }

    let reblocker = Reblocker {
        channels: config.channels.max(1) as usize,
        block_size: request.block_size,
        pending: Vec::with_capacity(request.block_size),
        tx,
    };
    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => build_input::<f32>(&device, &config, reblocker),
        cpal::SampleFormat::I16 => build_input::<i16>(&device, &config, reblocker),
        cpal::SampleFormat::U16 => build_input::<u16>(&device, &config, reblocker),
        other => Err(AudioError::Device(format!(
            "unsupported input sample format: {other:?}"
        ))),
    }?;
    stream.play().map_err(|e| input_error(e.to_string()))?;
    Ok(stream)
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

/// A buffer in flight on one output context.
struct Voice {
    samples: Vec<f32>,
    pos: usize,
}

type Mixer = Arc<Mutex<Vec<Voice>>>;

struct CpalOutput {
    mixer: Mixer,
    thread: StreamThread,
}

impl OutputContext for CpalOutput {
    fn play(&mut self, buffer: AudioBuffer) -> Result<(), AudioError> {
        self.thread.status()?;
        let mut voices = self
            .mixer
            .lock()
            .map_err(|_| AudioError::Device("output mixer poisoned".into()))?;
        voices.push(Voice {
            samples: buffer.samples,
            pos: 0,
        });
        Ok(())
    }
}

/// Sum every playing buffer into each output frame, copying mono to all
/// device channels.
fn mix_into<T>(data: &mut [T], channels: usize, mixer: &Mixer)
where
    T: Sample + FromSample<f32>,
{
    let Ok(mut voices) = mixer.lock() else {
        data.fill(T::EQUILIBRIUM);
        return;
    };
    for frame in data.chunks_mut(channels) {
        let mut acc = 0.0f32;
        for voice in voices.iter_mut() {
            if let Some(s) = voice.samples.get(voice.pos) {
                acc += *s;
                voice.pos += 1;
            }
        }
        let value = T::from_sample(acc.clamp(-1.0, 1.0));
        frame.fill(value);
    }
    voices.retain(|v| v.pos < v.samples.len());
}

fn build_output<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer: Mixer,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels.max(1) as usize;
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| mix_into(data, channels, &mixer),
            |err| warn!(error = %err, "Voice output stream error"),
            None,
        )
        .map_err(stream_error)
}

fn open_output_stream(sample_rate: u32, mixer: Mixer) -> Result<cpal::Stream, AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::Unavailable("no output device".into()))?;
    let supported = device
        .default_output_config()
        .map_err(|e| AudioError::Device(e.to_string()))?;

    let config = cpal::StreamConfig {
        channels: supported.channels(),
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };
    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => build_output::<f32>(&device, &config, mixer),
        cpal::SampleFormat::I16 => build_output::<i16>(&device, &config, mixer),
        cpal::SampleFormat::U16 => build_output::<u16>(&device, &config, mixer),
        other => Err(AudioError::Device(format!(
            "unsupported output sample format: {other:?}"
        ))),
    }?;
    stream
        .play()
        .map_err(|e| AudioError::Device(e.to_string()))?;
    Ok(stream)
}

impl AudioBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn open_microphone(
        &self,
        request: &CaptureRequest,
    ) -> Result<Box<dyn MicrophoneStream>, AudioError> {
        let (tx, rx) = mpsc::channel(16);
        let request = request.clone();
        let hold = tx.clone();
        let thread =
            StreamThread::spawn("classroom-mic", hold, move || open_input_stream(request, tx))?;
        Ok(Box::new(CpalMicrophone {
            blocks: rx,
            thread,
        }))
    }

    fn open_output(
        &self,
        participant: &ParticipantId,
        sample_rate: u32,
    ) -> Result<Box<dyn OutputContext>, AudioError> {
        let mixer: Mixer = Arc::new(Mutex::new(Vec::new()));
        let stream_mixer = mixer.clone();
        let thread = StreamThread::spawn(&format!("classroom-out-{participant}"), (), move || {
            open_output_stream(sample_rate, stream_mixer)
        })?;
        Ok(Box::new(CpalOutput {
            mixer,
            thread,
        }))
    }
}
