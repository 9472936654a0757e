//! Chat domain entities.

use serde::{Deserialize, Serialize};

/// A single chat message.
///
/// Messages are immutable values received from the server. The `id` is
/// server-assigned and unique; the client never generates message ids.
/// `timestamp` is a Unix epoch time in seconds with sub-second precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub username: String,
    pub content: String,
    pub timestamp: f64,
}

impl ChatMessage {
    /// Sentinel sender name used by server-authored system messages
    /// (join/leave notices).
    pub const SYSTEM_SENDER: &'static str = "System";

    /// Whether this message was authored by the server rather than a
    /// participant.
    pub fn is_system(&self) -> bool {
        self.username == Self::SYSTEM_SENDER
    }
}
