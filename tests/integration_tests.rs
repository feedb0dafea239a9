//! Integration tests for the scoreboard server
//!
//! These tests run a real server on an ephemeral port and talk to it over
//! real websocket connections.

use client::network::ScoreClient;
use futures_util::{SinkExt, StreamExt};
use server::config::ServerConfig;
use server::network::Server;
use server::processor::CommandProcessor;
use shared::{Command, ScoreSnapshot, Team};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tokio_test::assert_ok;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Boots a server and returns its websocket URL plus a handle on its core.
async fn start_server(config: ServerConfig) -> (String, Arc<CommandProcessor>) {
    let config = ServerConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        ..config
    };
    let server = assert_ok!(Server::bind(config).await);
    let addr = assert_ok!(server.local_addr());
    let processor = server.processor();
    tokio::spawn(server.run());
    (format!("ws://{}/ws", addr), processor)
}

async fn connect(url: &str) -> ScoreClient {
    let connected = assert_ok!(timeout(TIMEOUT, ScoreClient::connect(url)).await);
    assert_ok!(connected)
}

async fn next(client: &mut ScoreClient) -> ScoreSnapshot {
    timeout(TIMEOUT, client.next_snapshot())
        .await
        .expect("no snapshot within timeout")
        .expect("read failed")
        .expect("server closed the connection")
}

/// Polls until `check` passes or the timeout expires
async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + TIMEOUT;
    while !check().await {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within timeout"
        );
        sleep(Duration::from_millis(10)).await;
    }
}

/// CONNECTION LIFECYCLE TESTS
mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn new_client_receives_current_state_first() {
        let (url, processor) = start_server(ServerConfig::default()).await;
        processor.submit(&Command::increment(Team::B)).await.unwrap();

        let mut client = connect(&url).await;
        assert_eq!(next(&mut client).await, ScoreSnapshot::new(0, 1));
    }

    #[tokio::test]
    async fn wrong_path_is_rejected() {
        let (url, processor) = start_server(ServerConfig::default()).await;
        let wrong = url.replace("/ws", "/scores");

        let result = timeout(TIMEOUT, connect_async(wrong.as_str())).await.unwrap();
        assert!(result.is_err());
        assert!(processor.hub().is_empty().await);
    }

    #[tokio::test]
    async fn closed_client_is_deregistered() {
        let (url, processor) = start_server(ServerConfig::default()).await;
        let mut leaving = connect(&url).await;
        let mut staying = connect(&url).await;
        next(&mut leaving).await;
        next(&mut staying).await;
        assert_eq!(processor.hub().len().await, 2);

        leaving.close().await.unwrap();
        let hub = Arc::clone(processor.hub());
        eventually(|| {
            let hub = Arc::clone(&hub);
            async move { hub.len().await == 1 }
        })
        .await;

        staying.send(&Command::increment(Team::A)).await.unwrap();
        assert_eq!(next(&mut staying).await, ScoreSnapshot::new(1, 0));
    }

    #[tokio::test]
    async fn dropped_socket_is_deregistered() {
        let (url, processor) = start_server(ServerConfig::default()).await;
        {
            let (mut raw, _) = connect_async(url.as_str()).await.unwrap();
            raw.next().await.unwrap().unwrap();
        }

        let hub = Arc::clone(processor.hub());
        eventually(|| {
            let hub = Arc::clone(&hub);
            async move { hub.is_empty().await }
        })
        .await;

        // Broadcasting with nobody left is harmless
        let (_, report) = processor.submit(&Command::reset()).await.unwrap();
        assert_eq!(report.recipients(), 0);
    }
}

/// STATE SYNCHRONIZATION TESTS
mod sync_tests {
    use super::*;

    #[tokio::test]
    async fn example_scenario() {
        let (url, _) = start_server(ServerConfig::default()).await;
        let mut client = connect(&url).await;
        assert_eq!(next(&mut client).await, ScoreSnapshot::new(0, 0));

        client.send_raw(r#"{"action":"increment","team":"A"}"#).await.unwrap();
        assert_eq!(next(&mut client).await, ScoreSnapshot::new(1, 0));

        client.send_raw(r#"{"action":"decrement","team":"B"}"#).await.unwrap();
        assert_eq!(next(&mut client).await, ScoreSnapshot::new(1, 0));

        client.send_raw(r#"{"action":"reset"}"#).await.unwrap();
        assert_eq!(next(&mut client).await, ScoreSnapshot::new(0, 0));
    }

    #[tokio::test]
    async fn every_client_receives_identical_payload() {
        let (url, _) = start_server(ServerConfig::default()).await;

        let mut sockets = Vec::new();
        for _ in 0..5 {
            let (mut socket, _) = connect_async(url.as_str()).await.unwrap();
            socket.next().await.unwrap().unwrap();
            sockets.push(socket);
        }

        sockets[3]
            .send(Message::Text(
                r#"{"action":"increment","team":"A"}"#.to_string(),
            ))
            .await
            .unwrap();

        for socket in &mut sockets {
            let frame = timeout(TIMEOUT, socket.next()).await.unwrap().unwrap().unwrap();
            assert_eq!(
                frame,
                Message::Text(r#"{"scoreA":1,"scoreB":0}"#.to_string())
            );
        }
    }

    #[tokio::test]
    async fn malformed_message_is_silently_ignored() {
        let (url, processor) = start_server(ServerConfig::default()).await;
        let mut client = connect(&url).await;
        next(&mut client).await;

        client.send_raw("this is not json").await.unwrap();
        client.send_raw(r#"{"action":"increment""#).await.unwrap();
        client.send(&Command::increment(Team::B)).await.unwrap();

        // the first thing broadcast after the garbage is the valid command
        assert_eq!(next(&mut client).await, ScoreSnapshot::new(0, 1));
        assert_eq!(processor.hub().len().await, 1);
    }

    #[tokio::test]
    async fn concurrent_increments_are_never_lost() {
        let (url, processor) = start_server(ServerConfig::default()).await;
        let k = 20;

        let mut handles = Vec::new();
        for _ in 0..k {
            let url = url.clone();
            handles.push(tokio::spawn(async move {
                let (mut socket, _) = connect_async(url.as_str()).await.unwrap();
                socket.next().await.unwrap().unwrap();
                socket
                    .send(Message::Text(
                        r#"{"action":"increment","team":"A"}"#.to_string(),
                    ))
                    .await
                    .unwrap();
                socket
            }));
        }

        let mut sockets = Vec::new();
        for handle in handles {
            sockets.push(handle.await.unwrap());
        }

        let score = Arc::clone(processor.score());
        eventually(|| {
            let score = Arc::clone(&score);
            async move { score.snapshot() == ScoreSnapshot::new(k, 0) }
        })
        .await;

        let mut late = connect(&url).await;
        assert_eq!(next(&mut late).await, ScoreSnapshot::new(k, 0));
    }
}

/// SIMULATOR TESTS
mod simulator_tests {
    use super::*;

    #[tokio::test]
    async fn simulator_pushes_updates_without_input() {
        let config = ServerConfig::default().with_simulator(Duration::from_millis(50));
        let (url, _) = start_server(config).await;
        let mut client = connect(&url).await;

        let initial = next(&mut client).await;
        let total = |s: ScoreSnapshot| s.score_a + s.score_b;

        // A tick that raced our registration may repeat the initial state
        let mut last = initial;
        while total(last) < total(initial) + 2 {
            let snapshot = next(&mut client).await;
            assert!(total(snapshot) == total(last) || total(snapshot) == total(last) + 1);
            last = snapshot;
        }

        // alternating teams: one of the two points went to each side
        assert_eq!(last.score_a - initial.score_a, 1);
        assert_eq!(last.score_b - initial.score_b, 1);
    }
}
