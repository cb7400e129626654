use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use classroom_common::{AudioError, ClientEvent, ParticipantId, Position, ServerEvent, UserEntry};
use classroom_config::ClassroomConfig;

use super::*;
use crate::movement::Direction;
use crate::presence::Participant;
use crate::transport::{TransportCommand, TransportConfig, TransportEvent, TransportSession};
use crate::voice::codec;
use crate::voice::testing::RecordingBackend;

struct Harness {
    room: RoomController,
    _handle: RoomHandle,
    updates: mpsc::Receiver<RoomUpdate>,
    outbound: mpsc::Receiver<TransportCommand>,
    _inbound: mpsc::Sender<TransportEvent>,
    backend: RecordingBackend,
    t0: Instant,
}

fn harness_with(backend: RecordingBackend) -> Harness {
    let config = ClassroomConfig::default();
    let transport_config = TransportConfig::from_server(&config.server).unwrap();
    let (transport, outbound, inbound) = TransportSession::loopback(transport_config);
    let (room, handle, updates) =
        RoomController::with_transport(&config, "me", Box::new(backend.clone()), transport);
    Harness {
        room,
        _handle: handle,
        updates,
        outbound,
        _inbound: inbound,
        backend,
        t0: Instant::now(),
    }
}

fn harness() -> Harness {
    harness_with(RecordingBackend::default())
}

fn user(id: &str, name: &str) -> UserEntry {
    UserEntry {
        username: name.into(),
        socket_id: id.into(),
    }
}

fn frame() -> String {
    codec::encode_frame(&[0.25; 64])
}

impl Harness {
    fn server(&mut self, event: ServerEvent) {
        self.server_at(event, Duration::ZERO);
    }

    fn server_at(&mut self, event: ServerEvent, offset: Duration) {
        self.room
            .handle_transport_event(TransportEvent::Message(event), self.t0 + offset);
    }

    fn transport(&mut self, event: TransportEvent) {
        self.room.handle_transport_event(event, self.t0);
    }

    /// Connect, join as "me", and take the initial snapshot.
    fn join(&mut self, others: &[(&str, &str)]) {
        self.join_as("me", others);
    }

    fn join_as(&mut self, self_id: &str, others: &[(&str, &str)]) {
        self.room.connect();
        self.transport(TransportEvent::Connected);
        self.server(ServerEvent::Joined {
            socket_id: self_id.into(),
            username: "me".into(),
        });
        let mut users = vec![user(self_id, "me")];
        users.extend(others.iter().map(|(id, name)| user(id, name)));
        self.server(ServerEvent::UsersList { users });
        self.sent();
        self.drain();
    }

    fn sent(&mut self) -> Vec<ClientEvent> {
        let mut out = Vec::new();
        while let Ok(cmd) = self.outbound.try_recv() {
            if let TransportCommand::Send(event) = cmd {
                out.push(event);
            }
        }
        out
    }

    fn drain(&mut self) -> Vec<RoomUpdate> {
        let mut out = Vec::new();
        while let Ok(update) = self.updates.try_recv() {
            out.push(update);
        }
        out
    }

    fn ids(&self) -> Vec<String> {
        self.room
            .snapshot()
            .into_iter()
            .map(|p| p.id.to_string())
            .collect()
    }
}

#[tokio::test]
async fn join_handshake_filters_self() {
    let mut h = harness();
    assert!(h.room.connect());
    assert_eq!(h.room.state(), RoomState::Connecting);
    assert!(!h.room.connect());

    h.transport(TransportEvent::Connected);
    assert_eq!(
        h.sent(),
        vec![ClientEvent::Join {
            username: "me".into()
        }]
    );
    assert_eq!(h.room.state(), RoomState::Connecting);

    h.server(ServerEvent::Joined {
        socket_id: "me".into(),
        username: "me".into(),
    });
    assert_eq!(h.room.state(), RoomState::Joined);
    assert_eq!(h.room.self_id(), Some(&ParticipantId::from("me")));

    h.server(ServerEvent::UsersList {
        users: vec![user("me", "me"), user("a", "Ada")],
    });
    let snapshot = h.room.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].display_name, "Ada");
    assert_eq!(snapshot[0].last_known_position, None);
    assert_eq!(snapshot[0].rendered_position, Position::new(-5.0, 0.75, 8.0));

    let updates = h.drain();
    assert!(updates.contains(&RoomUpdate::StateChanged(RoomState::Joined)));
    assert!(updates.contains(&RoomUpdate::RosterReplaced(vec![Participant::new("a", "Ada")])));
}

#[tokio::test]
async fn duplicate_join_is_ignored() {
    let mut h = harness();
    h.join(&[("a", "Ada")]);
    h.server(ServerEvent::UserJoined {
        username: "Ada".into(),
        socket_id: "a".into(),
    });
    assert_eq!(h.ids(), vec!["a"]);
    assert!(h.drain().is_empty());
}

#[tokio::test]
async fn stale_position_after_leave_is_dropped() {
    let mut h = harness();
    h.join(&[]);

    h.server(ServerEvent::UserJoined {
        username: "Ada".into(),
        socket_id: "a".into(),
    });
    h.server(ServerEvent::UserLeft {
        socket_id: "a".into(),
    });
    h.server(ServerEvent::PlayerMoved {
        socket_id: "a".into(),
        position: Position::new(1.0, 0.75, 1.0),
    });
    assert!(h.room.snapshot().is_empty());

    // Rejoining with the same id starts from the waiting area again: the
    // stale sample was never stored.
    h.server(ServerEvent::UserJoined {
        username: "Ada".into(),
        socket_id: "a".into(),
    });
    assert_eq!(h.room.snapshot()[0].last_known_position, None);
}

#[tokio::test]
async fn remote_positions_are_smoothed_on_tick() {
    let mut h = harness();
    h.join(&[("a", "Ada")]);
    h.server(ServerEvent::PlayerMoved {
        socket_id: "a".into(),
        position: Position::new(5.0, 0.75, 8.0),
    });

    h.room.on_tick(h.t0 + Duration::from_millis(33));
    let state = &h.room.snapshot()[0];
    assert_eq!(state.last_known_position, Some(Position::new(5.0, 0.75, 8.0)));
    assert!((state.rendered_position.x - -4.0).abs() < 1e-4);
}

#[tokio::test]
async fn held_key_broadcasts_only_when_moving() {
    let mut h = harness();
    h.join(&[]);

    h.room.on_tick(h.t0 + Duration::from_millis(30));
    assert!(h.sent().is_empty());

    h.room.handle_command(RoomCommand::KeyDown(Direction::Forward));
    h.room.on_tick(h.t0 + Duration::from_millis(60));
    match h.sent().as_slice() {
        [ClientEvent::PlayerMove { position }] => {
            assert!((position.z - (4.0 - 0.15)).abs() < 1e-4);
            assert_eq!(position.x, 0.0);
        }
        other => panic!("unexpected sends: {other:?}"),
    }

    h.room.handle_command(RoomCommand::KeyUp(Direction::Forward));
    h.room.on_tick(h.t0 + Duration::from_millis(90));
    assert!(h.sent().is_empty());
}

#[tokio::test]
async fn suspended_movement_sends_nothing() {
    let mut h = harness();
    h.join(&[]);
    h.room.handle_command(RoomCommand::KeyDown(Direction::Left));
    h.room.handle_command(RoomCommand::SetSuspended(true));
    h.room.on_tick(h.t0 + Duration::from_millis(30));
    assert!(h.sent().is_empty());
    assert_eq!(h.room.local_position(), Position::new(0.0, 0.75, 4.0));
}

#[tokio::test]
async fn leave_event_cascades_cleanup() {
    let mut h = harness();
    h.join(&[("a", "Ada"), ("b", "Bob")]);

    h.server(ServerEvent::PlayerMoved {
        socket_id: "a".into(),
        position: Position::new(1.0, 0.75, 1.0),
    });
    h.server(ServerEvent::UserVoiceStart {
        username: "Ada".into(),
        socket_id: Some("a".into()),
    });
    h.server(ServerEvent::Voice {
        audio_data: frame(),
        socket_id: Some("a".into()),
    });
    h.server(ServerEvent::Voice {
        audio_data: frame(),
        socket_id: Some("b".into()),
    });
    assert_eq!(h.room.open_outputs(), 2);
    h.drain();

    h.server(ServerEvent::UserLeft {
        socket_id: "a".into(),
    });
    assert_eq!(h.ids(), vec!["b"]);
    assert_eq!(h.room.open_outputs(), 1);
    assert_eq!(h.backend.journal().closed_outputs, vec![ParticipantId::from("a")]);
    assert_eq!(
        h.drain(),
        vec![
            RoomUpdate::SpeakingChanged {
                id: "a".into(),
                speaking: false
            },
            RoomUpdate::ParticipantLeft("a".into()),
        ]
    );
}

#[tokio::test]
async fn voice_frames_need_a_known_sender() {
    let mut h = harness();
    h.join(&[("a", "Ada")]);

    h.server(ServerEvent::Voice {
        audio_data: frame(),
        socket_id: None,
    });
    h.server(ServerEvent::Voice {
        audio_data: frame(),
        socket_id: Some("ghost".into()),
    });
    h.server(ServerEvent::Voice {
        audio_data: "!!".into(),
        socket_id: Some("a".into()),
    });
    assert!(h.backend.journal().played.is_empty());

    h.server(ServerEvent::Voice {
        audio_data: frame(),
        socket_id: Some("a".into()),
    });
    assert_eq!(h.backend.journal().played.len(), 1);
}

#[tokio::test]
async fn voice_activity_by_name_times_out() {
    let mut h = harness();
    h.join(&[("a", "Ada")]);

    h.server(ServerEvent::UserVoiceStart {
        username: "Ada".into(),
        socket_id: None,
    });
    assert!(h.room.snapshot()[0].speaking);

    h.room.sweep_activity(h.t0 + Duration::from_millis(1999));
    assert!(h.room.snapshot()[0].speaking);

    h.room.sweep_activity(h.t0 + Duration::from_secs(2));
    assert!(!h.room.snapshot()[0].speaking);
    assert_eq!(
        h.drain().last(),
        Some(&RoomUpdate::SpeakingChanged {
            id: "a".into(),
            speaking: false
        })
    );
}

#[tokio::test]
async fn explicit_voice_end_clears_immediately() {
    let mut h = harness();
    h.join(&[("a", "Ada")]);
    h.server(ServerEvent::UserVoiceStart {
        username: "Ada".into(),
        socket_id: Some("a".into()),
    });
    h.server_at(
        ServerEvent::UserVoiceEnd {
            username: "Ada".into(),
            socket_id: Some("a".into()),
        },
        Duration::from_millis(100),
    );
    assert!(!h.room.snapshot()[0].speaking);
}

#[tokio::test]
async fn capture_sends_frames_until_muted() {
    let mut h = harness();
    h.join(&[]);

    h.room.handle_command(RoomCommand::StartVoice);
    assert!(h.room.is_capturing());
    assert_eq!(h.sent(), vec![ClientEvent::VoiceStart {}]);

    h.room.handle_mic_block(Some(vec![0.5; 4096]));
    assert!(matches!(h.sent().as_slice(), [ClientEvent::Voice { .. }]));

    h.room.handle_command(RoomCommand::SetMuted(true));
    h.room.handle_mic_block(Some(vec![0.5; 4096]));
    h.room.handle_mic_block(Some(vec![0.5; 4096]));
    assert!(h.sent().is_empty());
    assert!(h.room.is_capturing());
    assert_eq!(h.backend.journal().microphones_released, 0);

    h.room.handle_command(RoomCommand::SetMuted(false));
    h.room.handle_mic_block(Some(vec![0.5; 4096]));
    assert_eq!(h.sent().len(), 1);

    h.room.handle_command(RoomCommand::StopVoice);
    assert_eq!(h.sent(), vec![ClientEvent::VoiceEnd {}]);
    assert_eq!(h.backend.journal().microphones_released, 1);
}

#[tokio::test]
async fn denied_microphone_becomes_a_notice() {
    let mut h = harness_with(RecordingBackend {
        deny_microphone: true,
        ..Default::default()
    });
    h.join(&[]);

    h.room.handle_command(RoomCommand::StartVoice);
    assert!(!h.room.is_capturing());
    assert!(h.sent().is_empty());
    match h.drain().as_slice() {
        [RoomUpdate::Notice(text)] => assert!(text.contains("mic access denied")),
        other => panic!("unexpected updates: {other:?}"),
    }
}

#[tokio::test]
async fn voice_requires_joined_room() {
    let mut h = harness();
    h.room.handle_command(RoomCommand::StartVoice);
    assert!(!h.room.is_capturing());
    assert!(matches!(h.drain().as_slice(), [RoomUpdate::Notice(_)]));
}

#[tokio::test]
async fn microphone_loss_ends_voice() {
    let mut h = harness();
    h.join(&[]);
    h.room.handle_command(RoomCommand::StartVoice);
    h.sent();

    h.room.handle_mic_block(None);
    assert!(!h.room.is_capturing());
    assert_eq!(h.sent(), vec![ClientEvent::VoiceEnd {}]);
}

#[tokio::test]
async fn late_microphone_denial_is_reported() {
    let mut h = harness_with(RecordingBackend {
        mic_failure: Some(AudioError::PermissionDenied("blocked by the OS".into())),
        ..Default::default()
    });
    h.join(&[]);
    h.room.handle_command(RoomCommand::StartVoice);
    assert!(h.room.is_capturing());
    h.drain();

    h.room.handle_mic_block(None);
    assert!(!h.room.is_capturing());
    let notices: Vec<_> = h
        .drain()
        .into_iter()
        .filter_map(|u| match u {
            RoomUpdate::Notice(text) => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(notices, vec!["mic access denied: blocked by the OS".to_string()]);
}

#[tokio::test]
async fn transport_loss_tears_everything_down() {
    let mut h = harness();
    h.join(&[("a", "Ada")]);
    h.room.handle_command(RoomCommand::StartVoice);
    h.server(ServerEvent::Voice {
        audio_data: frame(),
        socket_id: Some("a".into()),
    });
    h.server(ServerEvent::UserVoiceStart {
        username: "Ada".into(),
        socket_id: Some("a".into()),
    });
    h.server(ServerEvent::WhiteboardUpdate {
        image_url: "img".into(),
        username: "Ada".into(),
    });

    h.transport(TransportEvent::Disconnected);
    assert_eq!(h.room.state(), RoomState::Disconnected);
    assert!(h.room.snapshot().is_empty());
    assert_eq!(h.room.open_outputs(), 0);
    assert_eq!(h.backend.open_outputs(), 0);
    assert!(!h.room.is_capturing());
    assert_eq!(h.backend.journal().microphones_released, 1);
    assert_eq!(h.room.whiteboard().image(), None);
    assert!(h.room.self_id().is_none());
    assert!(h.drain().contains(&RoomUpdate::StateChanged(RoomState::Disconnected)));
}

#[tokio::test]
async fn reconnect_rejoins_and_resyncs_from_snapshot() {
    let mut h = harness();
    h.join(&[("a", "Ada")]);
    h.transport(TransportEvent::Disconnected);

    h.transport(TransportEvent::Connected);
    assert_eq!(h.room.state(), RoomState::Connecting);
    assert_eq!(
        h.sent(),
        vec![ClientEvent::Join {
            username: "me".into()
        }]
    );

    h.server(ServerEvent::Joined {
        socket_id: "me-2".into(),
        username: "me".into(),
    });
    h.server(ServerEvent::UsersList {
        users: vec![user("me-2", "me"), user("b", "Bob")],
    });
    assert_eq!(h.room.state(), RoomState::Joined);
    assert_eq!(h.ids(), vec!["b"]);
}

#[tokio::test]
async fn snapshot_replacement_releases_departed_peers() {
    let mut h = harness();
    h.join(&[("a", "Ada"), ("b", "Bob")]);
    h.server(ServerEvent::Voice {
        audio_data: frame(),
        socket_id: Some("a".into()),
    });

    h.server(ServerEvent::UsersList {
        users: vec![user("me", "me"), user("b", "Bob")],
    });
    assert_eq!(h.ids(), vec!["b"]);
    assert_eq!(h.room.open_outputs(), 0);
}

#[tokio::test]
async fn explicit_leave_announces_and_disconnects() {
    let mut h = harness();
    h.join(&[("a", "Ada")]);
    h.room.handle_command(RoomCommand::StartVoice);
    h.sent();

    h.room.handle_command(RoomCommand::Leave);
    assert_eq!(h.room.state(), RoomState::Disconnected);
    assert!(h.room.snapshot().is_empty());

    let mut saw_disconnect = false;
    let mut sends = Vec::new();
    while let Ok(cmd) = h.outbound.try_recv() {
        match cmd {
            TransportCommand::Send(event) => sends.push(event),
            TransportCommand::Disconnect => saw_disconnect = true,
        }
    }
    assert_eq!(sends, vec![ClientEvent::VoiceEnd {}]);
    assert!(saw_disconnect);
}

#[tokio::test]
async fn events_queued_before_leave_are_not_applied() {
    let mut h = harness();
    h.join(&[("a", "Ada")]);
    assert_eq!(h.room.username(), "me");
    h.room.handle_command(RoomCommand::Leave);
    h.drain();

    h.server(ServerEvent::ChatMessage {
        message: "late".into(),
        username: "Ada".into(),
    });
    h.server(ServerEvent::WhiteboardUpdate {
        image_url: "img".into(),
        username: "Ada".into(),
    });
    h.server(ServerEvent::UsersList {
        users: vec![user("b", "Bob")],
    });
    h.server(ServerEvent::Voice {
        audio_data: frame(),
        socket_id: Some("b".into()),
    });

    assert_eq!(h.room.state(), RoomState::Disconnected);
    assert!(h.room.chat().is_empty());
    assert_eq!(h.room.whiteboard().image(), None);
    assert!(h.room.snapshot().is_empty());
    assert_eq!(h.room.open_outputs(), 0);
    assert_eq!(h.backend.open_outputs(), 0);
    assert!(h.drain().is_empty());
}

#[tokio::test]
async fn whiteboard_last_writer_wins() {
    let mut h = harness();
    h.join(&[]);

    h.room.handle_command(RoomCommand::ShareWhiteboard("mine".into()));
    assert_eq!(
        h.sent(),
        vec![ClientEvent::WhiteboardImage {
            image_url: "mine".into(),
            username: "me".into(),
        }]
    );

    h.server(ServerEvent::WhiteboardUpdate {
        image_url: "theirs".into(),
        username: "Ada".into(),
    });
    h.server(ServerEvent::WhiteboardUpdate {
        image_url: String::new(),
        username: "Eve".into(),
    });
    assert_eq!(h.room.whiteboard().image(), Some("theirs"));
    assert_eq!(h.room.whiteboard().last_writer(), Some("Ada"));
}

#[tokio::test]
async fn chat_is_sent_trimmed_and_logged_on_echo() {
    let mut h = harness();
    h.join(&[]);

    h.room.handle_command(RoomCommand::SendChat("  ".into()));
    assert!(h.sent().is_empty());

    h.room.handle_command(RoomCommand::SendChat(" hello ".into()));
    assert_eq!(
        h.sent(),
        vec![ClientEvent::ChatMessage {
            message: "hello".into(),
            username: "me".into(),
        }]
    );
    assert!(h.room.chat().is_empty());

    h.server(ServerEvent::ChatMessage {
        message: "hello".into(),
        username: "me".into(),
    });
    h.server(ServerEvent::ChatMessage {
        message: "hi".into(),
        username: "Ada".into(),
    });
    let log: Vec<_> = h.room.chat().all().iter().map(|m| m.text.clone()).collect();
    assert_eq!(log, vec!["hello", "hi"]);
}

#[tokio::test]
async fn run_loop_applies_events_and_stops_when_handles_drop() {
    let config = ClassroomConfig::default();
    let transport_config = TransportConfig::from_server(&config.server).unwrap();
    let (transport, mut outbound, inbound) = TransportSession::loopback(transport_config);
    let (room, handle, mut updates) = RoomController::with_transport(
        &config,
        "me",
        Box::new(RecordingBackend::default()),
        transport,
    );
    let task = tokio::spawn(room.run());

    inbound.send(TransportEvent::Connected).await.unwrap();
    inbound
        .send(TransportEvent::Message(ServerEvent::Joined {
            socket_id: "me".into(),
            username: "me".into(),
        }))
        .await
        .unwrap();
    inbound
        .send(TransportEvent::Message(ServerEvent::UsersList {
            users: vec![user("me", "me"), user("a", "Ada")],
        }))
        .await
        .unwrap();

    loop {
        match updates.recv().await {
            Some(RoomUpdate::RosterReplaced(_)) => break,
            Some(_) => {}
            None => panic!("update stream closed"),
        }
    }
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].display_name, "Ada");

    drop(handle);
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap();

    let mut saw_join = false;
    let mut saw_disconnect = false;
    while let Ok(cmd) = outbound.try_recv() {
        match cmd {
            TransportCommand::Send(ClientEvent::Join { .. }) => saw_join = true,
            TransportCommand::Disconnect => saw_disconnect = true,
            _ => {}
        }
    }
    assert!(saw_join);
    assert!(saw_disconnect);
}
