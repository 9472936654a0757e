//! Terminal chat frontend for Hiroba.
//!
//! Connects to a chat server over WebSocket, prints incoming messages and
//! reads outgoing ones from an interactive prompt. Username validation and
//! message length capping happen here, before anything reaches the socket
//! client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-client -- --username alice
//! ```

use std::sync::{Arc, Mutex};

use clap::Parser;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

use hiroba_client::domain::{ChatMessage, MessageBody, Username};
use hiroba_client::infrastructure::dto::websocket::InboundEnvelope;
use hiroba_client::socket::{ChatSocketClient, ConnectionConfig};
use hiroba_client::ui::{ChatLog, LogChange};
use hiroba_shared::logger::setup_logger;
use hiroba_shared::time::format_timestamp;

/// Terminal chat client for the Hiroba WebSocket chat.
#[derive(Debug, Parser)]
#[command(name = "hiroba-client")]
struct Args {
    /// WebSocket endpoint of the chat server
    #[arg(long, default_value = "ws://127.0.0.1:8000/ws/chat")]
    endpoint: String,

    /// Chat username (letters, numbers, hyphens, underscores; max 50 chars)
    #[arg(long)]
    username: String,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    if let Err(e) = run(args).await {
        tracing::error!("client error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let username = Username::new(args.username)?;
    let client = ChatSocketClient::new();

    let log = Arc::new(Mutex::new(ChatLog::new()));
    let log_for_messages = log.clone();
    let _message_sub = client.on_message(move |envelope| match envelope {
        InboundEnvelope::UserCount { data } => {
            println!("* {} user(s) online", data.count);
        }
        InboundEnvelope::Error { message } => {
            eprintln!("! server error: {message}");
        }
        InboundEnvelope::Pong => {}
        _ => {
            let mut log = log_for_messages.lock().unwrap();
            match log.apply(envelope) {
                LogChange::Appended => {
                    if let Some(message) = log.messages().last() {
                        print_message(message);
                    }
                }
                LogChange::Replaced(count) => {
                    println!("--- {count} recent message(s) ---");
                    for message in log.messages() {
                        print_message(message);
                    }
                }
                LogChange::Ignored => {}
            }
        }
    });

    let _error_sub = client.on_error(|error| eprintln!("! {error}"));
    let _status_sub = client.on_status(|state| println!("* connection {state}"));

    client
        .connect(ConnectionConfig::new(args.endpoint, username.clone()))
        .await?;
    println!("joined as '{username}' — type a message and press enter, /quit to leave");

    // rustyline is blocking; run it on its own thread and feed lines back
    // through a channel.
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || read_lines(line_tx));

    while let Some(line) = line_rx.recv().await {
        let input = line.trim();
        if input == "/quit" {
            break;
        }
        if input.is_empty() {
            continue;
        }
        match MessageBody::new(input.to_string()) {
            Ok(body) => {
                client.send_message(body.as_str());
            }
            Err(e) => eprintln!("! {e}"),
        }
    }

    client.disconnect();
    println!("left the chat");
    Ok(())
}

fn print_message(message: &ChatMessage) {
    if message.is_system() {
        println!("[{}] * {}", format_timestamp(message.timestamp), message.content);
    } else {
        println!(
            "[{}] {}: {}",
            format_timestamp(message.timestamp),
            message.username,
            message.content
        );
    }
}

/// Read lines on a dedicated thread until the receiver goes away. Ctrl-C and
/// Ctrl-D both translate into `/quit`.
fn read_lines(line_tx: mpsc::UnboundedSender<String>) {
    let mut editor = match rustyline::DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            tracing::error!("failed to initialize line editor: {e}");
            let _ = line_tx.send("/quit".to_string());
            return;
        }
    };

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(&line);
                if line_tx.send(line).is_err() {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                let _ = line_tx.send("/quit".to_string());
                break;
            }
            Err(e) => {
                tracing::error!("input error: {e}");
                let _ = line_tx.send("/quit".to_string());
                break;
            }
        }
    }
}
