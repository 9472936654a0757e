//! The visible message log maintained by a frontend.

use crate::domain::ChatMessage;
use crate::infrastructure::dto::websocket::InboundEnvelope;

/// How a [`ChatLog`] changed after applying an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogChange {
    /// The whole log was replaced by a `history` envelope; the new length
    /// is given.
    Replaced(usize),
    /// One message was appended.
    Appended,
    /// The envelope does not affect the log.
    Ignored,
}

/// The visible chat log.
///
/// `history` envelopes replace the entire log (not append); `message` and
/// `system` envelopes append. Everything else leaves the log untouched —
/// user counts, errors and heartbeat acknowledgements are handled by the
/// frontend outside the log.
#[derive(Debug, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one inbound envelope to the log.
    pub fn apply(&mut self, envelope: &InboundEnvelope) -> LogChange {
        match envelope {
            InboundEnvelope::Message { data } | InboundEnvelope::System { data } => {
                self.messages.push(data.clone());
                LogChange::Appended
            }
            InboundEnvelope::History { data } => {
                self.messages = data.clone();
                LogChange::Replaced(data.len())
            }
            _ => LogChange::Ignored,
        }
    }

    /// The visible messages, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
