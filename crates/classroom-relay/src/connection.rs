//! Per-connection handler: wait for `join`, then translate client events
//! into room broadcasts until the socket closes.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use classroom_common::{ClientEvent, ParticipantId, ServerEvent};

use crate::hub::RoomHub;

/// Handle a single WebSocket connection.
pub async fn handle_connection(ws: WebSocketStream<TcpStream>, addr: SocketAddr, hub: RoomHub) {
    let id = ParticipantId::generate();
    let (mut sink, mut stream) = ws.split();
    let (tx, mut rx) = mpsc::channel::<String>(256);
    let mut username: Option<String> = None;

    tracing::debug!(peer = %addr, participant = %id, "Connection opened");

    loop {
        tokio::select! {
            // Room events for this participant -> its WebSocket.
            Some(msg) = rx.recv() => {
                if sink.send(Message::Text(msg.into())).await.is_err() {
                    break;
                }
            }

            // Frames from this participant -> the room.
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => on_event(&hub, &id, &mut username, &tx, event).await,
                        Err(e) => {
                            tracing::debug!(peer = %addr, error = %e, "Ignoring unrecognized frame");
                        }
                    },
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(peer = %addr, error = %e, "WS error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    if let Some(name) = hub.leave(&id).await {
        tracing::info!(peer = %addr, participant = %id, username = %name, "Participant left");
    } else {
        tracing::debug!(peer = %addr, "Connection closed before join");
    }
}

/// Apply one client event. Everything except `join` is ignored until the
/// connection has joined.
async fn on_event(
    hub: &RoomHub,
    id: &ParticipantId,
    username: &mut Option<String>,
    tx: &mpsc::Sender<String>,
    event: ClientEvent,
) {
    let name = match (&event, username.clone()) {
        (ClientEvent::Join { username: requested }, None) => {
            if hub.join(id, requested, tx.clone()).await {
                tracing::info!(participant = %id, username = %requested, "Participant joined");
                *username = Some(requested.clone());
            }
            return;
        }
        (ClientEvent::Join { .. }, Some(_)) => {
            tracing::debug!(participant = %id, "Duplicate join ignored");
            return;
        }
        (_, None) => {
            tracing::debug!(participant = %id, event = event.name(), "Event before join ignored");
            return;
        }
        (_, Some(name)) => name,
    };

    match event {
        ClientEvent::Join { .. } => {}
        ClientEvent::PlayerMove { position } => {
            let moved = ServerEvent::PlayerMoved {
                socket_id: id.clone(),
                position,
            };
            hub.broadcast(Some(id), &moved).await;
        }
        ClientEvent::Voice { audio_data } => {
            let voice = ServerEvent::Voice {
                audio_data,
                socket_id: Some(id.clone()),
            };
            hub.broadcast(Some(id), &voice).await;
        }
        ClientEvent::VoiceStart {} => {
            let start = ServerEvent::UserVoiceStart {
                username: name,
                socket_id: Some(id.clone()),
            };
            hub.broadcast(Some(id), &start).await;
        }
        ClientEvent::VoiceEnd {} => {
            let end = ServerEvent::UserVoiceEnd {
                username: name,
                socket_id: Some(id.clone()),
            };
            hub.broadcast(Some(id), &end).await;
        }
        ClientEvent::WhiteboardImage {
            image_url,
            username,
        } => {
            hub.set_whiteboard(&image_url, &username).await;
            let update = ServerEvent::WhiteboardUpdate {
                image_url,
                username,
            };
            hub.broadcast(Some(id), &update).await;
        }
        ClientEvent::ChatMessage { message, username } => {
            // Chat is echoed to the sender too.
            hub.broadcast(None, &ServerEvent::ChatMessage { message, username })
                .await;
        }
    }
}
