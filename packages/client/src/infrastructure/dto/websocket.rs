//! WebSocket message DTOs for the chat protocol.
//!
//! All frames are JSON text with a `type` tag. Inbound envelopes are
//! dispatched to subscribers as-is; branching on the tag is the frontend's
//! job, not the socket client's.

use serde::{Deserialize, Serialize};

use crate::domain::ChatMessage;

/// Payload of a `user_count` envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCountData {
    pub count: u32,
}

/// A tagged wire message received from the chat server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEnvelope {
    /// A participant's chat message — appended to the visible log.
    Message { data: ChatMessage },
    /// A server-authored notice (`System` sender) — appended to the log.
    System { data: ChatMessage },
    /// The recent message history, sent on connect — replaces the log.
    History { data: Vec<ChatMessage> },
    /// Current connected-participant count.
    UserCount { data: UserCountData },
    /// A server-side error; carries a top-level `message`, no `data`.
    Error { message: String },
    /// Heartbeat acknowledgement; no payload, no required action.
    Pong,
}

/// A tagged wire message sent to the chat server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// A chat message authored by this participant.
    Message { content: String },
    /// Client-initiated liveness signal, sent every heartbeat period.
    Pong,
}
