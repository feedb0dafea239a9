//! # Scoreboard Client Library
//!
//! A terminal client for the scoreboard server. It keeps one websocket
//! open, sends score commands and prints every snapshot the server pushes,
//! including the ones caused by other clients.
//!
//! ## Module Organization
//!
//! ### Input Module (`input`)
//! Turns typed lines into commands:
//! - Shorthand such as `+a` and `-b`
//! - Words such as `inc A`, `decrement b`, `reset`, `quit`
//! - Random commands for load generation
//!
//! ### Network Module (`network`)
//! The websocket connection itself:
//! - Connecting and closing
//! - Command encoding and snapshot decoding
//! - Interactive and random-load run loops
//!
//! ### Rendering Module (`rendering`)
//! Formats each received snapshot as a scoreboard line.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::ScoreClient;
//! use shared::{Command, Team};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = ScoreClient::connect("ws://127.0.0.1:8080/ws").await?;
//!
//! // The server greets every new connection with the current score
//! let initial = client.next_snapshot().await?;
//!
//! client.send(&Command::increment(Team::A)).await?;
//! let updated = client.next_snapshot().await?;
//! # let _ = (initial, updated);
//! # Ok(())
//! # }
//! ```

pub mod input;
pub mod network;
pub mod rendering;
