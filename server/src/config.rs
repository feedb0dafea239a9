//! Runtime configuration for the scoreboard server.

use shared::DEFAULT_WS_PATH;
use std::time::Duration;

/// Default number of payloads buffered per connection before new ones are dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Default period between simulated score changes.
pub const DEFAULT_SIMULATE_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to, e.g. `127.0.0.1:8080`
    pub bind_addr: String,
    /// Request path that is upgraded to a websocket
    pub path: String,
    /// Capacity of each connection's outbound queue
    pub queue_capacity: usize,
    /// Period of the score simulator, `None` disables it
    pub simulate_interval: Option<Duration>,
}

impl ServerConfig {
    /// Config bound to `host:port` with default path and queue capacity
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            bind_addr: format!("{}:{}", host, port),
            ..Self::default()
        }
    }

    /// Enables the score simulator, one change every `interval`
    pub fn with_simulator(mut self, interval: Duration) -> Self {
        self.simulate_interval = Some(interval);
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            path: DEFAULT_WS_PATH.to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            simulate_interval: None,
        }
    }
}
