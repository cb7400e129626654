//! Background WebSocket connection loop with auto-reconnect.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use classroom_common::ServerEvent;

use super::types::{TransportCommand, TransportConfig, TransportEvent};

type RoomSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How a live connection ended.
enum Outcome {
    /// Network loss; reconnect with backoff.
    Lost,
    /// Local disconnect request; stop for good.
    Closed,
}

// ---------------------------------------------------------------------------
// Connection Loop
// ---------------------------------------------------------------------------

/// Background task managing the WebSocket connection with auto-reconnect.
///
/// Runs until `TransportCommand::Disconnect` arrives, the command sender is
/// dropped, or the event receiver goes away.
pub(crate) async fn connection_loop(
    config: TransportConfig,
    event_tx: mpsc::Sender<TransportEvent>,
    mut command_rx: mpsc::Receiver<TransportCommand>,
) {
    let mut reconnect_delay = config.reconnect_delay;

    loop {
        if event_tx.is_closed() {
            return;
        }

        info!(url = %config.endpoint, "Connecting to room");

        match tokio::time::timeout(
            config.connect_timeout,
            tokio_tungstenite::connect_async(config.endpoint.as_str()),
        )
        .await
        {
            Ok(Ok((ws_stream, _))) => {
                reconnect_delay = config.reconnect_delay;
                let _ = event_tx.send(TransportEvent::Connected).await;

                let outcome = pump(ws_stream, &event_tx, &mut command_rx).await;

                let _ = event_tx.send(TransportEvent::Disconnected).await;
                if matches!(outcome, Outcome::Closed) {
                    info!("Room transport closed");
                    return;
                }
            }
            Ok(Err(e)) => {
                error!(error = %e, "Failed to connect to room");
                let _ = event_tx
                    .send(TransportEvent::Error(format!("Connection failed: {e}")))
                    .await;
            }
            Err(_elapsed) => {
                error!(
                    timeout_secs = config.connect_timeout.as_secs(),
                    "Room connection timed out"
                );
                let _ = event_tx
                    .send(TransportEvent::Error(format!(
                        "Connection timed out after {}s",
                        config.connect_timeout.as_secs()
                    )))
                    .await;
            }
        }

        // Exponential backoff reconnect. Events sent meanwhile are dropped.
        info!(
            delay_ms = reconnect_delay.as_millis() as u64,
            "Reconnecting to room"
        );
        let sleep = tokio::time::sleep(reconnect_delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => break,
                cmd = command_rx.recv() => match cmd {
                    Some(TransportCommand::Send(event)) => {
                        debug!(event = event.name(), "Dropping event while disconnected");
                    }
                    Some(TransportCommand::Disconnect) | None => {
                        let _ = event_tx.send(TransportEvent::Disconnected).await;
                        return;
                    }
                },
            }
        }
        reconnect_delay = (reconnect_delay * 2).min(config.max_reconnect_delay);
    }
}

// ---------------------------------------------------------------------------
// Message Pump
// ---------------------------------------------------------------------------

/// Forward commands to the socket and socket frames to the event channel
/// until either side ends.
async fn pump(
    ws_stream: RoomSocket,
    event_tx: &mpsc::Sender<TransportEvent>,
    command_rx: &mut mpsc::Receiver<TransportCommand>,
) -> Outcome {
    let (mut sink, mut stream) = ws_stream.split();

    loop {
        tokio::select! {
            cmd = command_rx.recv() => match cmd {
                Some(TransportCommand::Send(event)) => match serde_json::to_string(&event) {
                    Ok(json) => {
                        if let Err(e) = sink.send(WsMessage::Text(json.into())).await {
                            warn!(error = %e, "WebSocket send failed");
                            return Outcome::Lost;
                        }
                    }
                    Err(e) => warn!(event = event.name(), error = %e, "Failed to encode event"),
                },
                Some(TransportCommand::Disconnect) | None => {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    return Outcome::Closed;
                }
            },
            frame = stream.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => {
                            if event_tx.send(TransportEvent::Message(event)).await.is_err() {
                                return Outcome::Closed;
                            }
                        }
                        Err(e) => debug!(error = %e, "Unrecognized message from relay"),
                    }
                }
                Some(Ok(WsMessage::Ping(data))) => {
                    let _ = sink.send(WsMessage::Pong(data)).await;
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    info!("Relay closed connection");
                    return Outcome::Lost;
                }
                Some(Err(e)) => {
                    warn!(error = %e, "WebSocket error");
                    return Outcome::Lost;
                }
                Some(Ok(_)) => {}
            },
        }
    }
}
