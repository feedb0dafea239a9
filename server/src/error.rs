use shared::ProtocolError;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors raised by the server core and its transport glue.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
