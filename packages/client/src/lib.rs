//! Reconnecting WebSocket chat client library.
//!
//! The heart of this crate is [`socket::ChatSocketClient`]: it owns one chat
//! connection at a time, translates wire envelopes into typed events for
//! subscribed handlers, keeps the connection alive with a periodic heartbeat
//! and recovers from unexpected disconnects with exponential backoff.
//!
//! The `domain` module holds the chat values a frontend works with, the
//! `infrastructure` module the wire-format DTOs, and the `ui` module helpers
//! for frontends (the visible message log). The `hiroba-client` binary is a
//! terminal frontend built on top of all three.

pub mod domain;
pub mod infrastructure;
pub mod socket;
pub mod ui;

// Re-export the types a frontend touches most.
pub use domain::{ChatMessage, MessageBody, Username};
pub use infrastructure::dto::websocket::{InboundEnvelope, OutboundFrame, UserCountData};
pub use socket::{
    ChatSocketClient, ConnectError, ConnectionConfig, ConnectionState, ReconnectPolicy,
    Subscription,
};
pub use ui::{ChatLog, LogChange};
