//! Server network layer handling websocket upgrades and per-connection tasks

use crate::broadcast::BroadcastPayload;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::hub::Hub;
use crate::processor::CommandProcessor;
use crate::score::SharedScore;
use crate::simulator::Simulator;
use futures_util::{future, Sink, SinkExt, Stream, StreamExt};
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::{self, Message};

/// Accepts websocket clients and hands them to the command processor
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    processor: Arc<CommandProcessor>,
}

impl Server {
    /// Binds the listener and creates an empty score and registry
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let processor = Arc::new(CommandProcessor::new(
            Arc::new(SharedScore::new()),
            Arc::new(Hub::new()),
        ));

        Ok(Server {
            listener,
            config,
            processor,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared handle on the command processor
    pub fn processor(&self) -> Arc<CommandProcessor> {
        Arc::clone(&self.processor)
    }

    /// Main accept loop. Only returns if the listener fails.
    pub async fn run(self) -> Result<(), ServerError> {
        if let Some(period) = self.config.simulate_interval {
            tokio::spawn(Simulator::new(self.processor(), period).run());
        }

        info!(
            "Server started successfully, upgrading on {}",
            self.config.path
        );

        loop {
            let (stream, addr) = self.listener.accept().await?;
            let processor = self.processor();
            let config = self.config.clone();

            tokio::spawn(async move {
                handle_connection(stream, addr, processor, config).await;
            });
        }
    }
}

/// Upgrades one TCP stream and runs its command loop to completion
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    processor: Arc<CommandProcessor>,
    config: ServerConfig,
) {
    let path = config.path.clone();
    let ws_stream = match accept_hdr_async(stream, move |request: &Request, response: Response| {
        check_path(&path, request, response)
    })
    .await
    {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            warn!("Rejected upgrade from {}: {}", addr, e);
            return;
        }
    };

    let (sink, source) = ws_stream.split();
    let (tx, rx) = mpsc::channel(config.queue_capacity);
    let (closed_tx, closed_rx) = oneshot::channel();
    let writer = tokio::spawn(write_frames(sink, rx, closed_tx));

    let Some(id) = processor.connect(addr, tx).await else {
        warn!("Client {} went away before registration", addr);
        return;
    };
    info!("New client {} connected from {}", id, addr);

    // Inbound ends when the peer closes or when the writer gives up
    let inbound = text_frames(source).take_until(closed_rx);
    processor.run(id, inbound).await;

    if let Err(e) = writer.await {
        error!("Writer task for {} panicked: {}", id, e);
    }
}

fn check_path(path: &str, request: &Request, response: Response) -> Result<Response, ErrorResponse> {
    if request.uri().path() == path {
        return Ok(response);
    }

    let mut rejection = ErrorResponse::new(Some(format!(
        "no websocket endpoint at {}",
        request.uri().path()
    )));
    *rejection.status_mut() = StatusCode::NOT_FOUND;
    Err(rejection)
}

/// Drains the outbound queue into the socket.
///
/// Returns once the queue is closed (connection deregistered) or a write
/// fails. Returning drops the queue receiver, so later deliveries to this
/// connection report it closed, and drops `closed`, which ends the reader.
async fn write_frames<S>(
    mut sink: S,
    mut outbound: mpsc::Receiver<BroadcastPayload>,
    closed: oneshot::Sender<()>,
) where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    while let Some(payload) = outbound.recv().await {
        if let Err(e) = sink.send(Message::Text(payload.to_string())).await {
            warn!("Write error: {}", e);
            break;
        }
    }

    outbound.close();
    if let Err(e) = sink.close().await {
        debug!("Error closing websocket: {}", e);
    }
    drop(closed);
}

/// Maps raw websocket frames to the text messages the processor consumes.
///
/// Binary frames are read as UTF-8 text, control frames are skipped and a
/// close frame ends the stream.
fn text_frames<S>(source: S) -> impl Stream<Item = Result<String, ServerError>>
where
    S: Stream<Item = Result<Message, tungstenite::Error>>,
{
    source
        .take_while(|frame| future::ready(!matches!(frame, Ok(Message::Close(_)))))
        .filter_map(|frame| {
            future::ready(match frame {
                Ok(Message::Text(text)) => Some(Ok(text)),
                Ok(Message::Binary(bytes)) => Some(Ok(String::from_utf8_lossy(&bytes).into_owned())),
                Ok(_) => None,
                Err(e) => Some(Err(ServerError::from(e))),
            })
        })
}
