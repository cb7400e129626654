//! classroom-relay: the room side of the classroom protocol.
//!
//! Accepts WebSocket connections on the room path, assigns each one a
//! transport id, and fans client events out to the rest of the room.
//! Positions, voice and whiteboard updates go to everyone but the sender;
//! chat is echoed to the sender as well.

mod connection;
mod hub;


use tokio::net::TcpListener;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;

pub use connection::handle_connection;
pub use hub::RoomHub;

/// Accept connections until the listener fails. Upgrades are only accepted
/// on `/<room_path>`.
pub async fn serve(listener: TcpListener, hub: RoomHub, room_path: String) {
    let room_path = format!("/{}", room_path.trim_matches('/'));

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let hub = hub.clone();
                let room_path = room_path.clone();
                tokio::spawn(async move {
                    let check_path = |req: &Request, resp: Response| {
                        if req.uri().path().trim_end_matches('/') == room_path {
                            Ok(resp)
                        } else {
                            let mut err = ErrorResponse::new(Some("unknown room".into()));
                            *err.status_mut() = StatusCode::NOT_FOUND;
                            Err(err)
                        }
                    };
                    match accept_hdr_async(stream, check_path).await {
                        Ok(ws) => handle_connection(ws, addr, hub).await,
                        Err(e) => {
                            tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
                        }
                    }
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "TCP accept error");
            }
        }
    }
}
