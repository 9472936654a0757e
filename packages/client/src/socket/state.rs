//! Connection state of the chat socket client.

use std::fmt;

/// Connection lifecycle state.
///
/// The single authoritative value is owned by the client; frontends observe
/// it through status callbacks and never mutate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport. Initial state, and terminal for an explicit disconnect.
    Disconnected,
    /// A transport open is in flight (user-initiated or timed reconnect).
    Connecting,
    /// The transport reported open; heartbeat is running.
    Connected,
    /// The last transport open failed before reporting open.
    Error,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        })
    }
}
