use crate::input::{self, UserInput};
use crate::rendering::Renderer;
use futures_util::{SinkExt, StreamExt};
use log::{error, info, warn};
use shared::{Command, ScoreSnapshot};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::interval;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Websocket connection to a scoreboard server
pub struct ScoreClient {
    stream: WsStream,
    renderer: Renderer,
}

impl ScoreClient {
    /// Opens a websocket to `url`
    pub async fn connect(url: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let (stream, _) = connect_async(url).await?;
        info!("Connected to {}", url);

        Ok(ScoreClient {
            stream,
            renderer: Renderer::new(),
        })
    }

    /// Encodes and sends one command
    pub async fn send(&mut self, command: &Command) -> Result<(), Box<dyn std::error::Error>> {
        self.stream.send(Message::Text(command.encode()?)).await?;
        Ok(())
    }

    /// Sends raw text, bypassing command encoding
    pub async fn send_raw(&mut self, text: &str) -> Result<(), Box<dyn std::error::Error>> {
        self.stream.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Waits for the next snapshot. Returns `None` once the server closes.
    ///
    /// Control frames are skipped, text that is not a snapshot is logged
    /// and skipped.
    pub async fn next_snapshot(
        &mut self,
    ) -> Result<Option<ScoreSnapshot>, Box<dyn std::error::Error>> {
        while let Some(frame) = self.stream.next().await {
            match frame? {
                Message::Text(text) => match ScoreSnapshot::decode(&text) {
                    Ok(snapshot) => return Ok(Some(snapshot)),
                    Err(e) => warn!("Unexpected message from server: {}", e),
                },
                Message::Close(_) => return Ok(None),
                _ => {}
            }
        }

        Ok(None)
    }

    /// Sends a close frame
    pub async fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.stream.close(None).await?;
        Ok(())
    }

    fn show(&mut self, snapshot: ScoreSnapshot) {
        println!("{}", self.renderer.render(snapshot));
    }

    /// Reads commands from stdin and prints every update until quit or disconnect
    pub async fn run_interactive(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                snapshot = self.next_snapshot() => {
                    match snapshot? {
                        Some(snapshot) => self.show(snapshot),
                        None => {
                            info!("Server closed the connection");
                            return Ok(());
                        }
                    }
                },

                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };

                    match input::parse_line(&line) {
                        Ok(UserInput::Send(command)) => {
                            if let Err(e) = self.send(&command).await {
                                error!("Error sending command: {}", e);
                                return Err(e);
                            }
                        }
                        Ok(UserInput::Quit) => break,
                        Ok(UserInput::Empty) => {}
                        Err(e) => eprintln!("{}", e),
                    }
                },
            }
        }

        self.close().await
    }

    /// Sends `count` random commands, one per `spacing`, printing each update.
    ///
    /// Returns the last snapshot seen.
    pub async fn run_random(
        &mut self,
        count: u32,
        spacing: Duration,
    ) -> Result<Option<ScoreSnapshot>, Box<dyn std::error::Error>> {
        let mut rng = rand::thread_rng();
        let mut ticker = interval(spacing.max(Duration::from_millis(1)));

        // The initial snapshot arrives right after the upgrade
        if let Some(snapshot) = self.next_snapshot().await? {
            self.show(snapshot);
        }

        for _ in 0..count {
            ticker.tick().await;
            let command = input::random_command(&mut rng);
            info!("Sending {}", command);
            self.send(&command).await?;

            // Other clients may broadcast in between, so this is any update
            match self.next_snapshot().await? {
                Some(snapshot) => self.show(snapshot),
                None => break,
            }
        }

        self.close().await?;
        Ok(self.renderer.last())
    }
}
