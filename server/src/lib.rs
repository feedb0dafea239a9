//! # Scoreboard Server Library
//!
//! This library provides the authoritative server for a live two-team
//! scoreboard. Clients hold a websocket open, send small commands
//! (increment, decrement, reset), and receive the updated score whenever
//! anyone changes it.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative State
//! The server owns the only copy of the score. Every mutation runs under a
//! single lock, so concurrent commands from different clients are applied
//! one at a time and never lose an update. Scores never go below zero.
//!
//! ### Connection Management
//! Handles the lifecycle of client connections:
//! - Upgrade and registration, with the current score sent to the newcomer
//! - Per-connection command processing
//! - Deregistration on close or transport error
//!
//! ### State Broadcasting
//! After each command the resulting score is serialized once and written to
//! every registered connection. A connection that can no longer be written
//! to is evicted without disturbing delivery to the others.
//!
//! ## Module Organization
//!
//! ### Score Module (`score`)
//! The shared score and its mutation rules.
//!
//! ### Hub Module (`hub`) and Connection Module (`connection`)
//! The registry of live connections and the handle the registry owns for
//! each of them. Registration, removal and broadcast iteration share one
//! lock.
//!
//! ### Broadcast Module (`broadcast`)
//! Serialized payloads and fan-out with self-healing eviction.
//!
//! ### Processor Module (`processor`)
//! The per-connection loop: decode, apply, broadcast.
//!
//! ### Network Module (`network`)
//! TCP accept loop, websocket upgrade on the configured path, and one
//! writer task per connection draining its outbound queue.
//!
//! ### Simulator Module (`simulator`)
//! Optional periodic score changes for demos.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind(ServerConfig::new("127.0.0.1", 8080)).await?;
//!
//!     // Accepts clients on ws://127.0.0.1:8080/ws until the listener fails
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Ordering
//!
//! Mutations are totally ordered. Broadcasts are not: two clients that
//! submit at the same time may see the two resulting snapshots in either
//! order, but each snapshot is exactly the state its command produced.

pub mod broadcast;
pub mod config;
pub mod connection;
pub mod error;
pub mod hub;
pub mod network;
pub mod processor;
pub mod score;
pub mod simulator;
