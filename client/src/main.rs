use clap::Parser;
use client::network::ScoreClient;
use log::info;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server websocket URL to connect to
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:8080/ws")]
    server: String,

    /// Send this many random commands and exit instead of reading stdin
    #[arg(short = 'r', long)]
    random: Option<u32>,

    /// Delay between random commands in milliseconds
    #[arg(short = 'i', long, default_value = "250")]
    interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Connecting to: {}", args.server);
    let mut client = ScoreClient::connect(&args.server).await?;

    match args.random {
        Some(count) => {
            let last = client
                .run_random(count, Duration::from_millis(args.interval_ms))
                .await?;
            if let Some(snapshot) = last {
                info!("Final score: {}", snapshot);
            }
        }
        None => {
            println!("Commands: +a, -a, +b, -b, inc A, dec B, reset, quit");
            client.run_interactive().await?;
        }
    }

    Ok(())
}
