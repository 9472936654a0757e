//! Socket client error definitions.

use thiserror::Error;

/// Errors returned by `ChatSocketClient::connect`.
///
/// During steady-state operation nothing is thrown across the public API:
/// send failures come back as booleans and everything else reaches the
/// frontend through the error/status subscriber sets.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The endpoint string could not be parsed as a URL.
    #[error("invalid endpoint URL: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// A transport is already open for this client; overlapping connects
    /// are rejected rather than queued or superseded.
    #[error("already connected")]
    AlreadyConnected,

    /// The WebSocket handshake failed before the transport reported open.
    #[error("websocket connection failed: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
}
