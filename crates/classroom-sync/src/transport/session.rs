//! Public handle for one participant's connection to the room channel.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

use classroom_common::ClientEvent;

use super::connection::connection_loop;
use super::types::{TransportCommand, TransportConfig, TransportEvent};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One bidirectional event channel to the room.
///
/// `send` never blocks: events are queued for the background connection
/// task and dropped if the queue is full or the connection is gone.
pub struct TransportSession {
    config: TransportConfig,
    command_tx: Option<mpsc::Sender<TransportCommand>>,
    event_rx: Option<mpsc::Receiver<TransportEvent>>,
}

impl TransportSession {
    /// Create a session without connecting.
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            command_tx: None,
            event_rx: None,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Start the background connection. Returns `false` (and does nothing)
    /// if a connection task is already running.
    pub fn connect(&mut self) -> bool {
        if self.is_active() {
            debug!("Connect requested while already connected");
            return false;
        }

        let (event_tx, event_rx) = mpsc::channel(256);
        let (command_tx, command_rx) = mpsc::channel(256);
        tokio::spawn(connection_loop(self.config.clone(), event_tx, command_rx));

        self.command_tx = Some(command_tx);
        self.event_rx = Some(event_rx);
        true
    }

    /// Whether a connection task is running (connected or retrying).
    pub fn is_active(&self) -> bool {
        self.command_tx
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Fire-and-forget send of one room event.
    pub fn send(&self, event: ClientEvent) {
        let Some(tx) = &self.command_tx else {
            debug!(event = event.name(), "Dropping event, transport not connected");
            return;
        };
        match tx.try_send(TransportCommand::Send(event)) {
            Ok(()) => {}
            Err(TrySendError::Full(TransportCommand::Send(event))) => {
                debug!(event = event.name(), "Dropping event, transport queue full");
            }
            Err(_) => debug!("Dropping event, transport closed"),
        }
    }

    /// Stop the connection for good. Events the connection task queued
    /// before it saw the stop are discarded; `recv` pends until the next
    /// `connect`.
    pub fn disconnect(&mut self) {
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.try_send(TransportCommand::Disconnect);
        }
        self.event_rx = None;
    }

    /// Next inbound transport event. Pends forever while no connection task
    /// is attached, so it can sit in a `select!` unconditionally.
    pub async fn recv(&mut self) -> Option<TransportEvent> {
        let Some(rx) = self.event_rx.as_mut() else {
            return std::future::pending().await;
        };
        match rx.recv().await {
            Some(event) => Some(event),
            None => {
                self.event_rx = None;
                std::future::pending().await
            }
        }
    }

    /// A session wired to in-memory channels instead of a socket.
    #[cfg(test)]
    pub(crate) fn loopback(
        config: TransportConfig,
    ) -> (
        Self,
        mpsc::Receiver<TransportCommand>,
        mpsc::Sender<TransportEvent>,
    ) {
        let (event_tx, event_rx) = mpsc::channel(256);
        let (command_tx, command_rx) = mpsc::channel(256);
        let session = Self {
            config,
            command_tx: Some(command_tx),
            event_rx: Some(event_rx),
        };
        (session, command_rx, event_tx)
    }
}

impl Drop for TransportSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}
