//! Room membership: maps transport ids to per-connection outbound channels.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use classroom_common::{ParticipantId, ServerEvent, UserEntry};

/// A joined connection.
struct Member {
    username: String,
    /// Join sequence, so snapshots list members in join order.
    seq: u64,
    tx: mpsc::Sender<String>,
}

#[derive(Default)]
struct Room {
    members: HashMap<ParticipantId, Member>,
    next_seq: u64,
    /// Latest whiteboard image and its writer, replayed to late joiners.
    whiteboard: Option<(String, String)>,
}

impl Room {
    fn roster(&self) -> Vec<UserEntry> {
        let mut members: Vec<(&ParticipantId, &Member)> = self.members.iter().collect();
        members.sort_by_key(|(_, m)| m.seq);
        members
            .into_iter()
            .map(|(id, m)| UserEntry {
                username: m.username.clone(),
                socket_id: id.clone(),
            })
            .collect()
    }

    fn deliver(&self, to: &ParticipantId, json: &str) {
        if let Some(member) = self.members.get(to) {
            if member.tx.try_send(json.to_string()).is_err() {
                tracing::debug!(participant = %to, "Outbound queue full, dropping event");
            }
        }
    }

    fn broadcast(&self, except: Option<&ParticipantId>, json: &str) {
        for id in self.members.keys() {
            if Some(id) != except {
                self.deliver(id, json);
            }
        }
    }
}

fn encode(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::warn!(event = event.name(), error = %e, "Failed to encode event");
            None
        }
    }
}

/// Thread-safe room store shared by every connection.
#[derive(Clone, Default)]
pub struct RoomHub {
    room: Arc<RwLock<Room>>,
}

impl RoomHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. The joiner gets `joined`, the full roster
    /// (itself included) and the current whiteboard; everyone else gets
    /// `userJoined`. Returns `false` if the id was already joined.
    pub async fn join(&self, id: &ParticipantId, username: &str, tx: mpsc::Sender<String>) -> bool {
        let mut room = self.room.write().await;
        if room.members.contains_key(id) {
            return false;
        }
        let seq = room.next_seq;
        room.next_seq += 1;
        room.members.insert(
            id.clone(),
            Member {
                username: username.to_string(),
                seq,
                tx,
            },
        );

        let ack = ServerEvent::Joined {
            socket_id: id.clone(),
            username: username.to_string(),
        };
        let snapshot = ServerEvent::UsersList {
            users: room.roster(),
        };
        for event in [ack, snapshot] {
            if let Some(json) = encode(&event) {
                room.deliver(id, &json);
            }
        }
        if let Some((image_url, writer)) = room.whiteboard.clone() {
            let board = ServerEvent::WhiteboardUpdate {
                image_url,
                username: writer,
            };
            if let Some(json) = encode(&board) {
                room.deliver(id, &json);
            }
        }

        let joined = ServerEvent::UserJoined {
            username: username.to_string(),
            socket_id: id.clone(),
        };
        if let Some(json) = encode(&joined) {
            room.broadcast(Some(id), &json);
        }
        true
    }

    /// Unregister a connection and tell the rest. Returns its username.
    pub async fn leave(&self, id: &ParticipantId) -> Option<String> {
        let mut room = self.room.write().await;
        let member = room.members.remove(id)?;
        let left = ServerEvent::UserLeft {
            socket_id: id.clone(),
        };
        if let Some(json) = encode(&left) {
            room.broadcast(None, &json);
        }
        Some(member.username)
    }

    /// Send to every member except `except` (or to everyone if `None`).
    pub async fn broadcast(&self, except: Option<&ParticipantId>, event: &ServerEvent) {
        if let Some(json) = encode(event) {
            self.room.read().await.broadcast(except, &json);
        }
    }

    /// Remember the latest non-empty whiteboard image for late joiners.
    pub async fn set_whiteboard(&self, image_url: &str, username: &str) {
        if image_url.is_empty() {
            return;
        }
        self.room.write().await.whiteboard = Some((image_url.to_string(), username.to_string()));
    }

    pub async fn username(&self, id: &ParticipantId) -> Option<String> {
        self.room
            .read()
            .await
            .members
            .get(id)
            .map(|m| m.username.clone())
    }

    pub async fn count(&self) -> usize {
        self.room.read().await.members.len()
    }
}
