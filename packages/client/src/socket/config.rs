//! Connection configuration.

use url::Url;

use crate::domain::Username;

/// Configuration for one connection attempt.
///
/// Immutable once a connect attempt starts; automatic reconnection reuses
/// the same config (same endpoint, same username).
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    endpoint: String,
    username: Username,
}

impl ConnectionConfig {
    /// Create a new ConnectionConfig.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - WebSocket endpoint URL, e.g. `ws://127.0.0.1:8000/ws/chat`
    /// * `username` - Validated participant identifier
    pub fn new(endpoint: impl Into<String>, username: Username) -> Self {
        Self {
            endpoint: endpoint.into(),
            username,
        }
    }

    /// The configured endpoint URL, without the username parameter.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The participant identifier included in the connection URL.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Build the transport URL with the `username` query parameter appended.
    pub(crate) fn connect_url(&self) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.endpoint)?;
        url.query_pairs_mut()
            .append_pair("username", self.username.as_str());
        Ok(url)
    }
}
