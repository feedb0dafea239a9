use clap::Parser;
use log::info;
use server::config::ServerConfig;
use server::network::Server;
use std::time::Duration;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Request path upgraded to a websocket
    #[clap(long, default_value = shared::DEFAULT_WS_PATH)]
    path: String,
    /// Updates buffered per client before new ones are dropped
    #[clap(short, long, default_value = "64")]
    queue_capacity: usize,
    /// Periodically score points without any client input
    #[clap(short, long)]
    simulate: bool,
    /// Seconds between simulated points
    #[clap(long, default_value = "5")]
    simulate_interval_secs: u64,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::new(&self.host, self.port);
        config.path = self.path;
        config.queue_capacity = self.queue_capacity.max(1);
        if self.simulate {
            config = config.with_simulator(Duration::from_secs(self.simulate_interval_secs.max(1)));
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let config = Args::parse().into_config();
    let server = Server::bind(config).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
