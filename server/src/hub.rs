//! Registry of live connections
//!
//! This module tracks which connections are eligible to receive broadcasts:
//! - Registration of freshly upgraded connections, with their first snapshot
//! - Deregistration on disconnect (idempotent)
//! - Point-in-time iteration used by the broadcaster, with eviction of
//!   connections whose transport has gone away
//!
//! Every operation takes the same exclusive lock, so membership never
//! changes while a broadcast is scanning it.

use log::info;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

use crate::connection::{Connection, ConnectionId, Delivery};

/// Owns every registered [`Connection`].
///
/// A connection is present in the hub if and only if it may receive
/// broadcasts. Removing it drops it, which closes its transport.
pub struct Hub {
    /// Registered connections indexed by their ID
    connections: Mutex<HashMap<ConnectionId, Connection>>,
    /// Next ID handed out by [`Hub::next_id`]
    next_id: AtomicU64,
}

impl Hub {
    /// Creates an empty hub. IDs start from 1.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocates a fresh connection ID.
    pub fn next_id(&self) -> ConnectionId {
        ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Adds a connection.
    pub async fn register(&self, connection: Connection) {
        self.register_with(connection, |_| Delivery::Sent).await;
    }

    /// Adds a connection after running `greet` on it under the registry lock.
    ///
    /// No broadcast can reach the connection before `greet` has run, so
    /// whatever `greet` sends is the first thing the peer sees. A connection
    /// whose greeting reports [`Delivery::Closed`] is not registered.
    /// Returns whether the connection was added.
    pub async fn register_with<F>(&self, mut connection: Connection, greet: F) -> bool
    where
        F: FnOnce(&mut Connection) -> Delivery,
    {
        let mut connections = self.connections.lock().await;
        if greet(&mut connection) == Delivery::Closed {
            info!("Connection {} closed before registration", connection.id);
            return false;
        }

        info!("Connection {} registered from {}", connection.id, connection.addr);
        connections.insert(connection.id, connection);
        true
    }

    /// Removes a connection. Returns false if it was already gone.
    pub async fn deregister(&self, id: ConnectionId) -> bool {
        let mut connections = self.connections.lock().await;
        if let Some(connection) = connections.remove(&id) {
            info!(
                "Connection {} deregistered after {:?}",
                connection.id,
                connection.connected_at.elapsed()
            );
            true
        } else {
            false
        }
    }

    /// Applies `f` to every registered connection while holding the lock.
    ///
    /// Connections for which `f` returns [`Delivery::Closed`] are collected
    /// during the scan and removed once it has finished, still under the
    /// same lock. Returns the IDs that were removed.
    pub async fn for_each<F>(&self, mut f: F) -> Vec<ConnectionId>
    where
        F: FnMut(&mut Connection) -> Delivery,
    {
        let mut connections = self.connections.lock().await;

        let closed: Vec<ConnectionId> = connections
            .values_mut()
            .filter_map(|connection| match f(connection) {
                Delivery::Closed => Some(connection.id),
                _ => None,
            })
            .collect();

        for id in &closed {
            if let Some(connection) = connections.remove(id) {
                info!("Connection {} evicted, transport closed", connection.id);
            }
        }

        closed
    }

    /// Returns true if `id` is currently registered
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.connections.lock().await.contains_key(&id)
    }

    /// Returns the number of registered connections
    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Returns true if no connections are registered
    pub async fn is_empty(&self) -> bool {
        self.connections.lock().await.is_empty()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}
