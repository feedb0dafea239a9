//! Per-connection command loop
//!
//! Each upgraded connection goes through `CONNECTED -> (PROCESSING)* ->
//! DISCONNECTED`. On connect the peer gets the current snapshot, and only
//! that peer. Every decoded command is applied to the shared score and the
//! resulting snapshot is broadcast, even when the command changed nothing.
//! Text that does not decode is logged and skipped. A transport error or a
//! close ends the loop and deregisters the connection.

use futures_util::{Stream, StreamExt};
use log::{debug, error, info, warn};
use shared::{Command, ScoreSnapshot};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::broadcast::{BroadcastPayload, BroadcastReport, Broadcaster};
use crate::connection::{Connection, ConnectionId, Delivery};
use crate::error::ServerError;
use crate::hub::Hub;
use crate::score::SharedScore;

/// Applies commands to the shared score and broadcasts the results.
///
/// One processor is shared by every connection task and by the simulator.
pub struct CommandProcessor {
    score: Arc<SharedScore>,
    broadcaster: Broadcaster,
}

impl CommandProcessor {
    /// Creates a processor over a score and the registry it broadcasts to
    pub fn new(score: Arc<SharedScore>, hub: Arc<Hub>) -> Self {
        Self {
            score,
            broadcaster: Broadcaster::new(hub),
        }
    }

    /// The shared score this processor mutates
    pub fn score(&self) -> &Arc<SharedScore> {
        &self.score
    }

    /// The registry broadcasts go to
    pub fn hub(&self) -> &Arc<Hub> {
        self.broadcaster.hub()
    }

    /// Registers a new connection and sends it the current snapshot.
    ///
    /// The snapshot is taken and queued under the registry lock, so it is
    /// the first message the peer receives. Returns `None` if the peer's
    /// writer is already gone.
    pub async fn connect(
        &self,
        addr: SocketAddr,
        sender: mpsc::Sender<BroadcastPayload>,
    ) -> Option<ConnectionId> {
        let hub = self.hub();
        let connection = Connection::new(hub.next_id(), addr, sender);
        let id = connection.id;

        let registered = hub
            .register_with(connection, |connection| {
                let snapshot = self.score.snapshot();
                match BroadcastPayload::encode(&snapshot) {
                    Ok(payload) => connection.send(&payload),
                    Err(e) => {
                        error!("Failed to encode initial snapshot: {}", e);
                        Delivery::Closed
                    }
                }
            })
            .await;

        registered.then_some(id)
    }

    /// Applies a command and broadcasts the resulting state.
    pub async fn submit(
        &self,
        command: &Command,
    ) -> Result<(ScoreSnapshot, BroadcastReport), ServerError> {
        let (snapshot, applied) = self.score.apply(command);
        if !applied {
            debug!("Command '{}' left the score unchanged", command);
        }

        let payload = BroadcastPayload::encode(&snapshot)?;
        let report = self.broadcaster.broadcast(&payload).await;
        debug!("Processed '{}'. New state: {}", command, payload);
        Ok((snapshot, report))
    }

    /// Handles one inbound text message from `id`.
    ///
    /// Returns `None` when the message was not a command, in which case
    /// nothing was applied or broadcast.
    pub async fn handle_message(
        &self,
        id: ConnectionId,
        text: &str,
    ) -> Option<(ScoreSnapshot, BroadcastReport)> {
        let command = match Command::decode(text) {
            Ok(command) => command,
            Err(e) => {
                warn!("Ignoring message from connection {}: {}", id, e);
                return None;
            }
        };

        match self.submit(&command).await {
            Ok(result) => Some(result),
            Err(e) => {
                error!("Failed to broadcast after '{}' from {}: {}", command, id, e);
                None
            }
        }
    }

    /// Runs the command loop for `id` until `inbound` ends or yields an error.
    ///
    /// The connection is deregistered on the way out.
    pub async fn run<S>(&self, id: ConnectionId, inbound: S)
    where
        S: Stream<Item = Result<String, ServerError>>,
    {
        tokio::pin!(inbound);

        while let Some(frame) = inbound.next().await {
            match frame {
                Ok(text) => {
                    self.handle_message(id, &text).await;
                }
                Err(e) => {
                    warn!("Read error on connection {}: {}", id, e);
                    break;
                }
            }
        }

        self.disconnect(id).await;
    }

    /// Deregisters `id`. Calling it twice is harmless.
    pub async fn disconnect(&self, id: ConnectionId) {
        if self.hub().deregister(id).await {
            info!("Client {} disconnected", id);
        }
    }
}
