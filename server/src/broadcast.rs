//! Fan-out of score snapshots to every registered connection.

use log::{debug, warn};
use shared::ScoreSnapshot;
use std::fmt;
use std::sync::Arc;

use crate::connection::{ConnectionId, Delivery};
use crate::error::ServerError;
use crate::hub::Hub;

/// A snapshot serialized once and shared by every recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastPayload(Arc<str>);

impl BroadcastPayload {
    /// Serializes a snapshot for broadcasting
    pub fn encode(snapshot: &ScoreSnapshot) -> Result<Self, ServerError> {
        Ok(Self(Arc::from(snapshot.encode()?)))
    }

    /// The serialized JSON text sent to every peer
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BroadcastPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What happened to one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
    pub evicted: Vec<ConnectionId>,
}

impl BroadcastReport {
    /// Number of connections the scan visited, evicted ones included
    pub fn recipients(&self) -> usize {
        self.delivered + self.dropped + self.evicted.len()
    }
}

/// Writes payloads to every member of a [`Hub`].
#[derive(Clone)]
pub struct Broadcaster {
    hub: Arc<Hub>,
}

impl Broadcaster {
    /// Creates a broadcaster over `hub`
    pub fn new(hub: Arc<Hub>) -> Self {
        Self { hub }
    }

    /// Registry this broadcaster writes to
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Delivers `payload` to every registered connection.
    ///
    /// A connection whose transport is closed is evicted once the scan has
    /// finished; the others still receive this payload. A full outbound
    /// queue loses the payload for that connection only.
    pub async fn broadcast(&self, payload: &BroadcastPayload) -> BroadcastReport {
        let mut delivered = 0;
        let mut dropped = 0;

        let evicted = self
            .hub
            .for_each(|connection| {
                let outcome = connection.send(payload);
                match outcome {
                    Delivery::Sent => delivered += 1,
                    Delivery::Dropped => {
                        dropped += 1;
                        warn!(
                            "Dropped update for connection {} (queue full, {} dropped so far)",
                            connection.id, connection.dropped
                        );
                    }
                    Delivery::Closed => {
                        warn!("Failed to send update to connection {}", connection.id);
                    }
                }
                outcome
            })
            .await;

        let report = BroadcastReport {
            delivered,
            dropped,
            evicted,
        };
        debug!(
            "Broadcast {} to {} connections ({} dropped, {} evicted)",
            payload,
            report.recipients(),
            report.dropped,
            report.evicted.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use std::net::SocketAddr;
    use tokio::sync::mpsc;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    async fn add_connection(
        hub: &Hub,
        capacity: usize,
    ) -> (ConnectionId, mpsc::Receiver<BroadcastPayload>) {
        let (tx, rx) = mpsc::channel(capacity);
        let connection = Connection::new(hub.next_id(), test_addr(), tx);
        let id = connection.id;
        hub.register(connection).await;
        (id, rx)
    }

    #[test]
    fn test_payload_encoding() {
        let payload = BroadcastPayload::encode(&ScoreSnapshot::new(4, 2)).unwrap();
        assert_eq!(payload.as_str(), r#"{"scoreA":4,"scoreB":2}"#);
        assert_eq!(payload.to_string(), payload.as_str());
    }

    #[tokio::test]
    async fn test_broadcast_reaches_everyone() {
        let hub = Arc::new(Hub::new());
        let broadcaster = Broadcaster::new(Arc::clone(&hub));
        let mut receivers = Vec::new();
        for _ in 0..4 {
            receivers.push(add_connection(&hub, 8).await.1);
        }

        let payload = BroadcastPayload::encode(&ScoreSnapshot::new(1, 0)).unwrap();
        let report = broadcaster.broadcast(&payload).await;

        assert_eq!(report.delivered, 4);
        assert_eq!(report.recipients(), 4);
        for rx in &mut receivers {
            assert_eq!(rx.try_recv().unwrap(), payload);
        }
    }

    #[tokio::test]
    async fn test_broadcast_with_no_connections() {
        let broadcaster = Broadcaster::new(Arc::new(Hub::new()));
        let payload = BroadcastPayload::encode(&ScoreSnapshot::default()).unwrap();
        assert_eq!(broadcaster.broadcast(&payload).await, BroadcastReport::default());
    }

    #[tokio::test]
    async fn test_failed_connection_is_evicted_others_still_receive() {
        let hub = Arc::new(Hub::new());
        let broadcaster = Broadcaster::new(Arc::clone(&hub));
        let (_, mut first) = add_connection(&hub, 8).await;
        let (dead_id, dead) = add_connection(&hub, 8).await;
        let (_, mut last) = add_connection(&hub, 8).await;
        drop(dead);

        let payload = BroadcastPayload::encode(&ScoreSnapshot::new(2, 0)).unwrap();
        let report = broadcaster.broadcast(&payload).await;

        assert_eq!(report.evicted, vec![dead_id]);
        assert_eq!(report.delivered, 2);
        assert_eq!(first.try_recv().unwrap(), payload);
        assert_eq!(last.try_recv().unwrap(), payload);
        assert!(!hub.contains(dead_id).await);

        let next = BroadcastPayload::encode(&ScoreSnapshot::new(3, 0)).unwrap();
        let report = broadcaster.broadcast(&next).await;
        assert!(report.evicted.is_empty());
        assert_eq!(report.recipients(), 2);
    }

    #[tokio::test]
    async fn test_slow_connection_drops_but_stays_registered() {
        let hub = Arc::new(Hub::new());
        let broadcaster = Broadcaster::new(Arc::clone(&hub));
        let (slow_id, mut slow) = add_connection(&hub, 1).await;
        let (_, mut fast) = add_connection(&hub, 8).await;

        let first = BroadcastPayload::encode(&ScoreSnapshot::new(1, 0)).unwrap();
        let second = BroadcastPayload::encode(&ScoreSnapshot::new(2, 0)).unwrap();
        broadcaster.broadcast(&first).await;
        let report = broadcaster.broadcast(&second).await;

        assert_eq!(report.dropped, 1);
        assert!(report.evicted.is_empty());
        assert!(hub.contains(slow_id).await);

        assert_eq!(slow.try_recv().unwrap(), first);
        assert!(slow.try_recv().is_err());
        assert_eq!(fast.try_recv().unwrap(), first);
        assert_eq!(fast.try_recv().unwrap(), second);
    }
}
