//! The chat socket client: connection ownership, heartbeat, reconnection
//! and envelope dispatch.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::config::ConnectionConfig;
use super::error::ConnectError;
use super::handler::{HandlerRegistry, Subscription};
use super::reconnect::ReconnectPolicy;
use super::state::ConnectionState;
use crate::infrastructure::dto::websocket::{InboundEnvelope, OutboundFrame};

/// Heartbeat period: one client-initiated `pong` frame every 30 seconds
/// while connected.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Error text pushed to error subscribers when sending without a transport.
const ERR_NOT_CONNECTED: &str = "Not connected";
/// Error text pushed to error subscribers when a send fails on the wire.
const ERR_SEND_FAILED: &str = "Failed to send message";
/// Error text pushed to error subscribers when a transport open fails.
const ERR_CONNECTION: &str = "Connection error";

type Transport = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A reconnecting WebSocket chat client.
///
/// The client owns exactly one logical connection at a time. A background
/// task owns the live transport: it dispatches inbound envelopes to message
/// subscribers, drains outbound frames, and sends the heartbeat. The task is
/// replaced wholesale on every (re)connect and torn down on disconnect, so
/// at most one heartbeat timer and one reconnect timer ever exist per
/// client instance.
///
/// Subscriber sets persist across reconnects; only an explicit unsubscribe
/// (or dropping the whole client) removes a handler.
pub struct ChatSocketClient {
    shared: Arc<Shared>,
}

struct Shared {
    reconnect_policy: ReconnectPolicy,
    heartbeat_interval: Duration,
    state: Mutex<ConnectionState>,
    message_handlers: HandlerRegistry<InboundEnvelope>,
    error_handlers: HandlerRegistry<String>,
    status_handlers: HandlerRegistry<ConnectionState>,
    conn: Mutex<ConnectionSlot>,
}

/// Mutable connection bookkeeping: the owned transport handles, the single
/// reconnect timer and the attempt counter.
#[derive(Default)]
struct ConnectionSlot {
    config: Option<ConnectionConfig>,
    outbound: Option<mpsc::UnboundedSender<OutboundFrame>>,
    reader_task: Option<JoinHandle<()>>,
    reconnect_timer: Option<JoinHandle<()>>,
    attempts: u32,
    /// Bumped on every install and explicit disconnect; lets a superseded
    /// reader task recognize that its close event is stale.
    generation: u64,
}

impl ChatSocketClient {
    /// Create a client with the default reconnect policy (5 attempts,
    /// 1 second base delay) and the default 30 second heartbeat.
    pub fn new() -> Self {
        Self::with_policy(ReconnectPolicy::default(), DEFAULT_HEARTBEAT_INTERVAL)
    }

    /// Create a client with an explicit reconnect policy and heartbeat
    /// period.
    pub fn with_policy(reconnect_policy: ReconnectPolicy, heartbeat_interval: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                reconnect_policy,
                heartbeat_interval,
                state: Mutex::new(ConnectionState::Disconnected),
                message_handlers: HandlerRegistry::new(),
                error_handlers: HandlerRegistry::new(),
                status_handlers: HandlerRegistry::new(),
                conn: Mutex::new(ConnectionSlot::default()),
            }),
        }
    }

    /// Open a connection for `config`, resolving once the transport reports
    /// open.
    ///
    /// The config is retained for automatic reconnection. Calling `connect`
    /// while a transport is live returns [`ConnectError::AlreadyConnected`];
    /// calling it during a backoff delay cancels the pending reconnect
    /// attempt and connects immediately.
    ///
    /// # Errors
    ///
    /// Fails when the endpoint cannot be parsed or the transport signals an
    /// error before it signals open. Failures also notify error and status
    /// subscribers.
    pub async fn connect(&self, config: ConnectionConfig) -> Result<(), ConnectError> {
        {
            let mut slot = self.shared.conn.lock().unwrap();
            if slot.outbound.is_some() {
                return Err(ConnectError::AlreadyConnected);
            }
            if let Some(timer) = slot.reconnect_timer.take() {
                timer.abort();
            }
            slot.attempts = 0;
            slot.config = Some(config.clone());
        }
        self.shared.clone().connect_transport(&config).await
    }

    /// Tear down the connection: stop the heartbeat, release the transport
    /// and cancel any pending reconnect attempt.
    ///
    /// Idempotent; does not clear subscriber sets. No reconnection is
    /// triggered by the close this causes.
    pub fn disconnect(&self) {
        {
            let mut slot = self.shared.conn.lock().unwrap();
            slot.generation += 1;
            if let Some(timer) = slot.reconnect_timer.take() {
                timer.abort();
            }
            if let Some(task) = slot.reader_task.take() {
                task.abort();
            }
            slot.outbound = None;
            slot.attempts = 0;
            slot.config = None;
        }
        if self.shared.set_state(ConnectionState::Disconnected) {
            self.shared
                .status_handlers
                .notify(&ConnectionState::Disconnected);
        }
    }

    /// Send a chat message.
    ///
    /// Returns `false` (and notifies error subscribers) when no transport is
    /// open or the send fails; never panics. The body is passed through
    /// untouched — trimming, length caps and rate limiting are the
    /// frontend's responsibility.
    pub fn send_message(&self, content: &str) -> bool {
        let outbound = self.shared.conn.lock().unwrap().outbound.clone();
        let Some(outbound) = outbound else {
            self.shared
                .error_handlers
                .notify(&ERR_NOT_CONNECTED.to_string());
            return false;
        };
        if self.state() != ConnectionState::Connected {
            self.shared
                .error_handlers
                .notify(&ERR_NOT_CONNECTED.to_string());
            return false;
        }

        let frame = OutboundFrame::Message {
            content: content.to_string(),
        };
        if outbound.send(frame).is_err() {
            self.shared
                .error_handlers
                .notify(&ERR_SEND_FAILED.to_string());
            return false;
        }
        true
    }

    /// Whether a transport exists and reported open.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
            && self.shared.conn.lock().unwrap().outbound.is_some()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.lock().unwrap()
    }

    /// Number of reconnection attempts made since the last successful open.
    ///
    /// Resets to zero on every successful (re)connect and on explicit
    /// disconnect; frontends can use it to render "reconnecting (n/5)".
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.conn.lock().unwrap().attempts
    }

    /// Subscribe to inbound envelopes. Every parsed envelope is delivered,
    /// without filtering by tag.
    pub fn on_message(
        &self,
        handler: impl Fn(&InboundEnvelope) + Send + Sync + 'static,
    ) -> Subscription {
        self.shared.message_handlers.subscribe(handler)
    }

    /// Subscribe to client-side error notifications.
    pub fn on_error(&self, handler: impl Fn(&str) + Send + Sync + 'static) -> Subscription {
        self.shared
            .error_handlers
            .subscribe(move |message: &String| handler(message))
    }

    /// Subscribe to connection state changes.
    pub fn on_status(
        &self,
        handler: impl Fn(ConnectionState) + Send + Sync + 'static,
    ) -> Subscription {
        self.shared
            .status_handlers
            .subscribe(move |state: &ConnectionState| handler(*state))
    }
}

impl Default for ChatSocketClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ChatSocketClient {
    fn drop(&mut self) {
        // The background tasks hold their own Arc of the shared state; abort
        // them so a dropped client leaves no timer or transport behind.
        let mut slot = self.shared.conn.lock().unwrap();
        slot.generation += 1;
        if let Some(timer) = slot.reconnect_timer.take() {
            timer.abort();
        }
        if let Some(task) = slot.reader_task.take() {
            task.abort();
        }
        slot.outbound = None;
    }
}

impl Shared {
    /// Set the connection state, returning whether it changed.
    fn set_state(&self, next: ConnectionState) -> bool {
        let mut state = self.state.lock().unwrap();
        let changed = *state != next;
        *state = next;
        changed
    }

    fn fail_connect(&self) {
        self.set_state(ConnectionState::Error);
        self.error_handlers.notify(&ERR_CONNECTION.to_string());
        self.status_handlers.notify(&ConnectionState::Error);
    }

    /// Open the transport for `config` and install the connection on
    /// success.
    ///
    /// Shared by user-initiated connects and timed reconnection attempts;
    /// failures notify error and status subscribers either way.
    async fn connect_transport(
        self: Arc<Self>,
        config: &ConnectionConfig,
    ) -> Result<(), ConnectError> {
        self.set_state(ConnectionState::Connecting);

        let url = match config.connect_url() {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("invalid endpoint '{}': {e}", config.endpoint());
                self.fail_connect();
                return Err(e.into());
            }
        };

        match connect_async(url.as_str()).await {
            Ok((transport, _response)) => {
                tracing::info!(
                    "websocket connected to {} as '{}'",
                    config.endpoint(),
                    config.username()
                );
                self.install_connection(transport);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("websocket connection to {} failed: {e}", config.endpoint());
                self.fail_connect();
                Err(e.into())
            }
        }
    }

    /// Take ownership of a freshly opened transport: replace any previous
    /// reader task, reset the attempt counter and start the heartbeat.
    fn install_connection(self: Arc<Self>, transport: Transport) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        {
            let mut slot = self.conn.lock().unwrap();
            slot.generation += 1;
            let generation = slot.generation;
            if let Some(task) = slot.reader_task.take() {
                task.abort();
            }
            slot.attempts = 0;
            slot.outbound = Some(outbound_tx);
            slot.reader_task = Some(tokio::spawn(run_connection(
                self.clone(),
                transport,
                outbound_rx,
                generation,
            )));
        }
        self.set_state(ConnectionState::Connected);
        self.status_handlers.notify(&ConnectionState::Connected);
    }

    /// Reader task epilogue: release the transport handles and start the
    /// backoff, unless this connection was superseded or torn down by an
    /// explicit disconnect (newer generation).
    fn handle_transport_closed(self: Arc<Self>, generation: u64) {
        {
            let mut slot = self.conn.lock().unwrap();
            if slot.generation != generation {
                return;
            }
            slot.outbound = None;
            slot.reader_task = None;
        }
        tracing::info!("websocket disconnected");
        self.set_state(ConnectionState::Disconnected);
        self.status_handlers.notify(&ConnectionState::Disconnected);
        self.schedule_reconnect();
    }

    /// Schedule the next reconnection attempt, replacing any pending timer,
    /// or give up once the attempt cap is reached.
    fn schedule_reconnect(self: Arc<Self>) {
        let gave_up_after = {
            let mut slot = self.conn.lock().unwrap();
            let Some(config) = slot.config.clone() else {
                return;
            };
            if slot.attempts >= self.reconnect_policy.max_attempts {
                Some(slot.attempts)
            } else {
                slot.attempts += 1;
                let attempt = slot.attempts;
                let delay = self.reconnect_policy.delay_for_attempt(attempt);
                // Aborting a finished timer task is a no-op, so replacing
                // the handle here is safe from any caller.
                if let Some(timer) = slot.reconnect_timer.take() {
                    timer.abort();
                }
                let shared = self.clone();
                slot.reconnect_timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    tracing::info!(
                        "reconnecting (attempt {attempt}, delayed {}ms)",
                        delay.as_millis()
                    );
                    if let Err(e) = shared.clone().connect_transport(&config).await {
                        tracing::warn!("reconnect attempt {attempt} failed: {e}");
                        shared.schedule_reconnect();
                    }
                }));
                None
            }
        };

        if let Some(attempts) = gave_up_after {
            tracing::warn!("giving up after {attempts} reconnection attempts");
            self.error_handlers.notify(&format!(
                "Reconnection failed: giving up after {attempts} attempts"
            ));
        }
    }
}

/// Reader task: owns the transport for one connection generation.
///
/// Runs until the transport closes or the task is aborted. Inbound text
/// frames are parsed and dispatched synchronously to message subscribers;
/// parse failures are logged and dropped. Outbound frames are drained from
/// the channel, and a heartbeat `pong` is sent every interval.
async fn run_connection(
    shared: Arc<Shared>,
    transport: Transport,
    mut outbound_rx: mpsc::UnboundedReceiver<OutboundFrame>,
    generation: u64,
) {
    let (mut sink, mut stream) = transport.split();
    let period = shared.heartbeat_interval;
    let mut heartbeat = interval_at(Instant::now() + period, period);

    loop {
        tokio::select! {
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<InboundEnvelope>(text.as_str()) {
                        Ok(envelope) => shared.message_handlers.notify(&envelope),
                        Err(e) => tracing::warn!("dropping malformed frame: {e}"),
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // binary/ping/pong frames carry no envelopes
                Some(Err(e)) => {
                    tracing::warn!("websocket read error: {e}");
                    break;
                }
            },
            frame = outbound_rx.recv() => match frame {
                Some(frame) => {
                    let json = serde_json::to_string(&frame).unwrap();
                    if let Err(e) = sink.send(Message::Text(json.into())).await {
                        tracing::warn!("failed to send message: {e}");
                        shared.error_handlers.notify(&ERR_SEND_FAILED.to_string());
                    }
                }
                None => break,
            },
            _ = heartbeat.tick() => {
                let json = serde_json::to_string(&OutboundFrame::Pong).unwrap();
                if let Err(e) = sink.send(Message::Text(json.into())).await {
                    // A failed heartbeat does not terminate the connection;
                    // the read side observes the real close if the transport
                    // is actually gone.
                    tracing::warn!("failed to send heartbeat: {e}");
                }
            }
        }
    }

    shared.handle_transport_closed(generation);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_disconnected() {
        // テスト項目: 生成直後は Disconnected で未接続
        let client = ChatSocketClient::new();

        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(!client.is_connected());
        assert_eq!(client.reconnect_attempts(), 0);
    }

    #[test]
    fn test_send_message_without_transport_notifies_error() {
        // テスト項目: 未接続の send_message は false を返しエラー購読者に通知する
        // given (前提条件):
        let client = ChatSocketClient::new();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let seen = errors.clone();
        let _sub = client.on_error(move |message| seen.lock().unwrap().push(message.to_string()));

        // when (操作):
        let sent = client.send_message("hi");

        // then (期待する結果):
        assert!(!sent);
        assert_eq!(
            errors.lock().unwrap().as_slice(),
            &["Not connected".to_string()]
        );
    }

    #[test]
    fn test_disconnect_before_connect_is_noop() {
        // テスト項目: 未接続での disconnect は何度呼んでも no-op
        let client = ChatSocketClient::new();
        let statuses = Arc::new(Mutex::new(Vec::new()));
        let seen = statuses.clone();
        let _sub = client.on_status(move |state| seen.lock().unwrap().push(state));

        client.disconnect();
        client.disconnect();

        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(statuses.lock().unwrap().is_empty());
    }
}
