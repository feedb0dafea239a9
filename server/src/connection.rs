use std::fmt;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::broadcast::BroadcastPayload;

/// Identity of a registered connection, unique for the server's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of handing one payload to a connection's transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Outbound queue was full, this payload is lost for this peer only
    Dropped,
    /// Writer side is gone, the connection must be evicted
    Closed,
}

/// Registry-side handle for one websocket peer.
///
/// Payloads go through a bounded queue drained by the connection's writer
/// task. Dropping the `Connection` drops the queue sender, which makes the
/// writer close the socket.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    pub connected_at: Instant,
    pub delivered: u64,
    pub dropped: u64,
    sender: mpsc::Sender<BroadcastPayload>,
}

impl Connection {
    /// Wraps the sending half of a writer task's queue
    pub fn new(id: ConnectionId, addr: SocketAddr, sender: mpsc::Sender<BroadcastPayload>) -> Self {
        Connection {
            id,
            addr,
            connected_at: Instant::now(),
            delivered: 0,
            dropped: 0,
            sender,
        }
    }

    /// Queues a payload without waiting on the network
    pub fn send(&mut self, payload: &BroadcastPayload) -> Delivery {
        match self.sender.try_send(payload.clone()) {
            Ok(()) => {
                self.delivered += 1;
                Delivery::Sent
            }
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                Delivery::Dropped
            }
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    /// True once the writer task has stopped draining the queue
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
