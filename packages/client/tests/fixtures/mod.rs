//! Test fixtures: an in-process chat server speaking the wire protocol.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};

use hiroba_client::domain::ChatMessage;
use hiroba_client::infrastructure::dto::websocket::{
    InboundEnvelope, OutboundFrame, UserCountData,
};

/// Connection handling behavior for [`ChatServer`].
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Serve the chat protocol: send history and a user count on connect,
    /// echo a `message` envelope back for every inbound chat message.
    Chat { history: Vec<ChatMessage> },
    /// Complete the handshake, then close immediately (an unexpected close
    /// from the client's point of view).
    CloseOnAccept,
    /// Close the first `n` connections right after the handshake; serve the
    /// chat protocol on later ones.
    CloseFirst(usize),
}

/// A single-room chat server bound to an ephemeral localhost port.
pub struct ChatServer {
    addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    pongs: Arc<AtomicUsize>,
    usernames: Arc<Mutex<Vec<String>>>,
    accept_task: JoinHandle<()>,
    conn_tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl ChatServer {
    pub async fn start(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind fixture listener");
        let addr = listener
            .local_addr()
            .expect("fixture listener has no local addr");

        let accepted = Arc::new(AtomicUsize::new(0));
        let pongs = Arc::new(AtomicUsize::new(0));
        let usernames = Arc::new(Mutex::new(Vec::new()));
        let conn_tasks = Arc::new(Mutex::new(Vec::new()));

        let accept_task = tokio::spawn(accept_loop(
            listener,
            behavior,
            accepted.clone(),
            pongs.clone(),
            usernames.clone(),
            conn_tasks.clone(),
        ));

        Self {
            addr,
            accepted,
            pongs,
            usernames,
            accept_task,
            conn_tasks,
        }
    }

    /// The chat endpoint URL, without the username parameter.
    pub fn url(&self) -> String {
        format!("ws://{}/ws/chat", self.addr)
    }

    /// How many WebSocket handshakes completed so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// How many heartbeat `pong` frames arrived so far.
    pub fn pongs(&self) -> usize {
        self.pongs.load(Ordering::SeqCst)
    }

    /// Usernames observed on each handshake, in connection order.
    pub fn usernames(&self) -> Vec<String> {
        self.usernames.lock().unwrap().clone()
    }

    /// Stop the server: live connections drop and the port starts refusing
    /// new ones.
    pub fn stop(&self) {
        self.accept_task.abort();
        for task in self.conn_tasks.lock().unwrap().drain(..) {
            task.abort();
        }
    }
}

impl Drop for ChatServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn accept_loop(
    listener: TcpListener,
    behavior: Behavior,
    accepted: Arc<AtomicUsize>,
    pongs: Arc<AtomicUsize>,
    usernames: Arc<Mutex<Vec<String>>>,
    conn_tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
) {
    let mut index = 0usize;
    loop {
        let Ok((stream, _)) = listener.accept().await else {
            break;
        };
        index += 1;

        let captured = Arc::new(Mutex::new(String::from("anonymous")));
        let capture = captured.clone();
        let callback = move |request: &Request, response: Response| {
            if let Some(name) = request
                .uri()
                .query()
                .and_then(|query| query.split('&').find_map(|pair| pair.strip_prefix("username=")))
            {
                *capture.lock().unwrap() = name.to_string();
            }
            Ok(response)
        };

        let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(stream, callback).await else {
            continue;
        };
        accepted.fetch_add(1, Ordering::SeqCst);
        let username = captured.lock().unwrap().clone();
        usernames.lock().unwrap().push(username.clone());

        let close_now = match &behavior {
            Behavior::CloseOnAccept => true,
            Behavior::CloseFirst(n) => index <= *n,
            Behavior::Chat { .. } => false,
        };
        if close_now {
            let _ = ws.close(None).await;
            continue;
        }

        let history = match &behavior {
            Behavior::Chat { history } => history.clone(),
            _ => Vec::new(),
        };
        let task = tokio::spawn(serve_chat(ws, history, username, pongs.clone()));
        conn_tasks.lock().unwrap().push(task);
    }
}

async fn serve_chat(
    mut ws: WebSocketStream<TcpStream>,
    history: Vec<ChatMessage>,
    username: String,
    pongs: Arc<AtomicUsize>,
) {
    if send_envelope(&mut ws, &InboundEnvelope::History { data: history })
        .await
        .is_err()
    {
        return;
    }
    if send_envelope(
        &mut ws,
        &InboundEnvelope::UserCount {
            data: UserCountData { count: 1 },
        },
    )
    .await
    .is_err()
    {
        return;
    }

    while let Some(Ok(message)) = ws.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(frame) = serde_json::from_str::<OutboundFrame>(text.as_str()) else {
            continue;
        };
        match frame {
            OutboundFrame::Pong => {
                pongs.fetch_add(1, Ordering::SeqCst);
            }
            OutboundFrame::Message { content } => {
                let reply = InboundEnvelope::Message {
                    data: ChatMessage {
                        id: uuid::Uuid::new_v4().to_string(),
                        username: username.clone(),
                        content,
                        timestamp: hiroba_shared::time::unix_timestamp(),
                    },
                };
                if send_envelope(&mut ws, &reply).await.is_err() {
                    break;
                }
            }
        }
    }
}

async fn send_envelope(
    ws: &mut WebSocketStream<TcpStream>,
    envelope: &InboundEnvelope,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let json = serde_json::to_string(envelope).expect("envelope serialization");
    ws.send(Message::Text(json.into())).await
}

/// Poll `predicate` every 20ms until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    predicate()
}
