//! The Room Controller: one dispatch loop that owns every piece of room
//! state and applies transport events and local commands to it in order.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use classroom_common::{ClientEvent, ParticipantId, Position, RoomError, ServerEvent};
use classroom_config::ClassroomConfig;

use super::handle::RoomHandle;
use super::types::{RoomCommand, RoomState, RoomUpdate};
use crate::chat::ChatLog;
use crate::movement::MovementSynchronizer;
use crate::presence::{Participant, ParticipantState, PresenceRegistry};
use crate::transport::{TransportConfig, TransportEvent, TransportSession};
use crate::voice::{AudioBackend, CaptureRequest, VoiceActivity, VoiceCapture, VoicePlayback};
use crate::whiteboard::WhiteboardState;

const COMMAND_QUEUE: usize = 256;
const UPDATE_QUEUE: usize = 1024;

pub struct RoomController {
    username: String,
    state: RoomState,
    transport: TransportSession,
    backend: Box<dyn AudioBackend>,

    registry: PresenceRegistry,
    movement: MovementSynchronizer,
    activity: VoiceActivity,
    capture: VoiceCapture,
    playback: VoicePlayback,
    whiteboard: WhiteboardState,
    chat: ChatLog,

    /// Movement cadence; `Some` only while joined.
    tick: Option<Interval>,
    tick_period: Duration,
    last_tick: Option<Instant>,

    commands: mpsc::Receiver<RoomCommand>,
    updates: mpsc::Sender<RoomUpdate>,
}

impl RoomController {
    /// Build a controller for `username` from config. Returns the controller,
    /// a handle for local commands, and the UI update stream.
    pub fn new(
        config: &ClassroomConfig,
        username: impl Into<String>,
        backend: Box<dyn AudioBackend>,
    ) -> Result<(Self, RoomHandle, mpsc::Receiver<RoomUpdate>), RoomError> {
        let transport = TransportSession::new(TransportConfig::from_server(&config.server)?);
        Ok(Self::with_transport(config, username, backend, transport))
    }

    pub(crate) fn with_transport(
        config: &ClassroomConfig,
        username: impl Into<String>,
        backend: Box<dyn AudioBackend>,
        transport: TransportSession,
    ) -> (Self, RoomHandle, mpsc::Receiver<RoomUpdate>) {
        let (command_tx, commands) = mpsc::channel(COMMAND_QUEUE);
        let (updates, update_rx) = mpsc::channel(UPDATE_QUEUE);

        let controller = Self {
            username: username.into(),
            state: RoomState::Disconnected,
            transport,
            backend,
            registry: PresenceRegistry::new(),
            movement: MovementSynchronizer::new(&config.movement),
            activity: VoiceActivity::new(Duration::from_millis(
                config.voice.activity_timeout_ms as u64,
            )),
            capture: VoiceCapture::new(
                CaptureRequest::from_config(&config.voice),
                config.voice.start_muted,
            ),
            playback: VoicePlayback::new(config.voice.sample_rate),
            whiteboard: WhiteboardState::new(),
            chat: ChatLog::new(&config.chat),
            tick: None,
            tick_period: Duration::from_millis(config.movement.tick_interval_ms.max(1) as u64),
            last_tick: None,
            commands,
            updates,
        };
        (controller, RoomHandle::new(command_tx), update_rx)
    }

    // -- queries -------------------------------------------------------------

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn self_id(&self) -> Option<&ParticipantId> {
        self.registry.self_id()
    }

    pub fn local_position(&self) -> Position {
        self.movement.local_position()
    }

    pub fn whiteboard(&self) -> &WhiteboardState {
        &self.whiteboard
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_active()
    }

    pub fn open_outputs(&self) -> usize {
        self.playback.len()
    }

    /// Render view of every remote participant, sorted by name then id.
    pub fn snapshot(&self) -> Vec<ParticipantState> {
        let mut states: Vec<ParticipantState> = self
            .registry
            .list()
            .into_iter()
            .map(|p| ParticipantState {
                id: p.id.clone(),
                display_name: p.display_name.clone(),
                last_known_position: self.movement.target_position(&p.id),
                rendered_position: self
                    .movement
                    .rendered_position(&p.id)
                    .unwrap_or_else(|| self.movement.waiting_area()),
                speaking: self.activity.is_speaking(&p.id),
            })
            .collect();
        states.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then_with(|| a.id.cmp(&b.id))
        });
        states
    }

    // -- lifecycle -----------------------------------------------------------

    /// Start connecting. A no-op unless disconnected.
    pub fn connect(&mut self) -> bool {
        if self.state != RoomState::Disconnected {
            debug!(state = %self.state, "Connect ignored");
            return false;
        }
        self.transport.connect();
        self.set_state(RoomState::Connecting);
        true
    }

    /// Explicit leave: announce voice end, tear down, and close the transport.
    pub fn leave(&mut self) {
        if self.state == RoomState::Disconnected {
            return;
        }
        if self.capture.is_active() {
            self.transport.send(ClientEvent::VoiceEnd {});
        }
        self.teardown();
        self.transport.disconnect();
        self.set_state(RoomState::Disconnected);
        info!(username = %self.username, "Left the room");
    }

    /// Release everything tied to the current session: the movement tick,
    /// the microphone, every output context, and all per-peer state.
    pub fn teardown(&mut self) {
        self.tick = None;
        self.last_tick = None;
        if self.capture.stop() {
            self.emit(RoomUpdate::VoiceCaptureChanged { active: false });
        }
        let closed = self.playback.release_all();
        self.registry.clear();
        self.activity.clear();
        self.movement.clear_remote();
        self.movement.release_all_keys();
        self.whiteboard.clear();
        self.chat.clear();
        debug!(closed_outputs = closed, "Room session torn down");
    }

    fn set_state(&mut self, state: RoomState) {
        if self.state == state {
            return;
        }
        info!(from = %self.state, to = %state, "Room state changed");
        self.state = state;
        self.emit(RoomUpdate::StateChanged(state));
    }

    fn emit(&self, update: RoomUpdate) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.updates.try_send(update) {
            warn!("Room update dropped, receiver is behind");
        }
    }

    // -- transport -----------------------------------------------------------

    pub fn handle_transport_event(&mut self, event: TransportEvent, now: Instant) {
        match event {
            TransportEvent::Connected => {
                if self.state == RoomState::Disconnected {
                    // Reconnected by the transport after a loss.
                    self.set_state(RoomState::Connecting);
                }
                info!(username = %self.username, "Transport connected, joining");
                self.transport.send(ClientEvent::Join {
                    username: self.username.clone(),
                });
            }
            TransportEvent::Disconnected => {
                if self.state != RoomState::Disconnected {
                    warn!("Transport lost, tearing down room session");
                    self.teardown();
                    self.set_state(RoomState::Disconnected);
                }
            }
            TransportEvent::Error(message) => {
                warn!(error = %message, "Transport error");
                self.emit(RoomUpdate::Notice(message));
            }
            TransportEvent::Message(event) if self.state == RoomState::Disconnected => {
                trace!(event = event.name(), "Dropping room event after teardown");
            }
            TransportEvent::Message(event) => self.handle_server_event(event, now),
        }
    }

    fn handle_server_event(&mut self, event: ServerEvent, now: Instant) {
        trace!(event = event.name(), "Room event");
        match event {
            ServerEvent::Joined { socket_id, .. } => self.on_joined(socket_id, now),
            ServerEvent::UsersList { users } => {
                let departed = self
                    .registry
                    .apply_snapshot(users.into_iter().map(Participant::from));
                for id in &departed {
                    self.release_participant(id);
                }
                let roster = self.registry.list().into_iter().cloned().collect();
                self.emit(RoomUpdate::RosterReplaced(roster));
            }
            ServerEvent::UserJoined {
                username,
                socket_id,
            } => {
                let participant = Participant::new(socket_id, username);
                if self.registry.apply_join(participant.clone()) {
                    debug!(
                        participant = %participant.id,
                        name = %participant.display_name,
                        "Participant joined"
                    );
                    self.emit(RoomUpdate::ParticipantJoined(participant));
                }
            }
            ServerEvent::UserLeft { socket_id } => {
                if self.registry.apply_leave(&socket_id).is_some() {
                    debug!(participant = %socket_id, "Participant left");
                    self.release_participant(&socket_id);
                    self.emit(RoomUpdate::ParticipantLeft(socket_id));
                }
            }
            ServerEvent::PlayerMoved {
                socket_id,
                position,
            } => {
                if self.registry.contains(&socket_id) {
                    self.movement.apply_remote(&socket_id, position);
                } else {
                    trace!(participant = %socket_id, "Dropping position for unknown participant");
                }
            }
            ServerEvent::UserVoiceStart {
                username,
                socket_id,
            } => {
                if let Some(id) = self.resolve(socket_id, &username) {
                    if self.activity.start(&id, now) {
                        self.emit(RoomUpdate::SpeakingChanged { id, speaking: true });
                    }
                }
            }
            ServerEvent::UserVoiceEnd {
                username,
                socket_id,
            } => {
                if let Some(id) = self.resolve(socket_id, &username) {
                    if self.activity.end(&id) {
                        self.emit(RoomUpdate::SpeakingChanged {
                            id,
                            speaking: false,
                        });
                    }
                }
            }
            ServerEvent::Voice {
                audio_data,
                socket_id,
            } => match socket_id {
                Some(id) if self.registry.contains(&id) => {
                    self.playback
                        .handle_frame(self.backend.as_ref(), &id, &audio_data);
                }
                Some(id) => trace!(participant = %id, "Dropping voice for unknown participant"),
                None => trace!("Dropping unattributed voice frame"),
            },
            ServerEvent::WhiteboardUpdate {
                image_url,
                username,
            } => {
                if self.whiteboard.apply_remote(image_url, username.clone()) {
                    self.emit(RoomUpdate::WhiteboardChanged { writer: username });
                }
            }
            ServerEvent::ChatMessage { message, username } => {
                let msg = self.chat.on_message(username, message).clone();
                self.emit(RoomUpdate::ChatReceived(msg));
            }
        }
    }

    fn on_joined(&mut self, socket_id: ParticipantId, now: Instant) {
        info!(self_id = %socket_id, username = %self.username, "Joined the room");
        self.registry.set_self_id(Some(socket_id));
        self.movement.reset_local();

        let mut tick = tokio::time::interval(self.tick_period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.tick = Some(tick);
        self.last_tick = Some(now);

        self.set_state(RoomState::Joined);
    }

    /// Cascade a departure into every per-peer store.
    fn release_participant(&mut self, id: &ParticipantId) {
        self.movement.remove(id);
        if self.activity.remove(id) {
            self.emit(RoomUpdate::SpeakingChanged {
                id: id.clone(),
                speaking: false,
            });
        }
        self.playback.release(id);
    }

    /// Prefer the transport id when the relay sends one; fall back to the
    /// display name.
    fn resolve(&self, socket_id: Option<ParticipantId>, username: &str) -> Option<ParticipantId> {
        match socket_id {
            Some(id) if self.registry.contains(&id) => Some(id),
            Some(id) => {
                trace!(participant = %id, "Voice activity for unknown participant");
                None
            }
            None => self.registry.find_by_name(username).map(|p| p.id.clone()),
        }
    }

    // -- local ---------------------------------------------------------------

    pub fn handle_command(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Connect => {
                self.connect();
            }
            RoomCommand::KeyDown(direction) => self.movement.set_key(direction, true),
            RoomCommand::KeyUp(direction) => self.movement.set_key(direction, false),
            RoomCommand::SetSuspended(suspended) => self.movement.set_suspended(suspended),
            RoomCommand::StartVoice => self.start_voice(),
            RoomCommand::StopVoice => {
                if self.capture.stop() {
                    self.transport.send(ClientEvent::VoiceEnd {});
                    self.emit(RoomUpdate::VoiceCaptureChanged { active: false });
                }
            }
            RoomCommand::SetMuted(muted) => self.capture.set_muted(muted),
            RoomCommand::SendChat(text) => {
                if let Some(event) = ChatLog::compose(&text, &self.username) {
                    self.transport.send(event);
                }
            }
            RoomCommand::ShareWhiteboard(image) => {
                if let Some(event) = self.whiteboard.set_local(image, &self.username) {
                    self.transport.send(event);
                    self.emit(RoomUpdate::WhiteboardChanged {
                        writer: self.username.clone(),
                    });
                }
            }
            RoomCommand::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            RoomCommand::Leave => self.leave(),
        }
    }

    fn start_voice(&mut self) {
        if self.state != RoomState::Joined {
            self.emit(RoomUpdate::Notice("join the room before starting voice".into()));
            return;
        }
        match self.capture.start(self.backend.as_ref()) {
            Ok(true) => {
                self.transport.send(ClientEvent::VoiceStart {});
                self.emit(RoomUpdate::VoiceCaptureChanged { active: true });
            }
            Ok(false) => debug!("Voice capture already running"),
            Err(e) => {
                warn!(error = %e, "Could not start voice capture");
                self.emit(RoomUpdate::Notice(e.to_string()));
            }
        }
    }

    /// One captured block, or `None` if the microphone went away.
    pub fn handle_mic_block(&mut self, block: Option<Vec<f32>>) {
        match block {
            Some(block) => {
                if let Some(audio_data) = self.capture.encode(&block) {
                    self.transport.send(ClientEvent::Voice { audio_data });
                }
            }
            None => {
                let failure = self.capture.take_failure();
                if self.capture.stop() {
                    let notice = match failure {
                        Some(e) => {
                            warn!(error = %e, "Microphone failed");
                            e.to_string()
                        }
                        None => {
                            warn!("Microphone stream ended");
                            "microphone stopped".to_string()
                        }
                    };
                    self.transport.send(ClientEvent::VoiceEnd {});
                    self.emit(RoomUpdate::VoiceCaptureChanged { active: false });
                    self.emit(RoomUpdate::Notice(notice));
                }
            }
        }
    }

    // -- timers --------------------------------------------------------------

    /// Movement step for self plus one smoothing step for everyone else.
    pub fn on_tick(&mut self, now: Instant) {
        let elapsed = self
            .last_tick
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(self.tick_period);
        self.last_tick = Some(now);

        if let Some(position) = self.movement.tick(elapsed) {
            self.transport.send(ClientEvent::PlayerMove { position });
            self.emit(RoomUpdate::LocalMoved(position));
        }
        self.movement.interpolate();
    }

    /// Clear speaking flags whose timeout passed.
    pub fn sweep_activity(&mut self, now: Instant) {
        for id in self.activity.expire(now) {
            debug!(participant = %id, "Voice activity timed out");
            self.emit(RoomUpdate::SpeakingChanged {
                id,
                speaking: false,
            });
        }
    }

    // -- loop ----------------------------------------------------------------

    /// Connect and run until every [`RoomHandle`] is dropped, then leave.
    pub async fn run(mut self) {
        self.connect();

        loop {
            let deadline = self.activity.next_deadline();
            tokio::select! {
                Some(event) = self.transport.recv() => {
                    self.handle_transport_event(event, Instant::now());
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                block = self.capture.next_block() => self.handle_mic_block(block),
                now = next_tick(&mut self.tick) => self.on_tick(now),
                _ = sleep_until(deadline) => self.sweep_activity(Instant::now()),
            }
        }

        self.leave();
        info!("Room controller stopped");
    }
}

async fn next_tick(tick: &mut Option<Interval>) -> Instant {
    match tick {
        Some(interval) => interval.tick().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
