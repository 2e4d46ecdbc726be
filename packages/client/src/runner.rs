//! Interactive client loop: stdin in, rendered chat state out.
//!
//! There is no reconnection: once the connection closes the loop reports it
//! and returns.

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use crate::{
    config::RelayConfig,
    connection::ConnectionManager,
    domain::{ConnectionState, PresenceSnapshot},
    error::ClientError,
    formatter::MessageFormatter,
    projector::StateProjector,
    ui::redisplay_prompt,
};

/// Tracks what has already been printed
#[derive(Default)]
struct RenderCursor {
    messages_shown: usize,
    presence: Option<PresenceSnapshot>,
    connected: bool,
    ever_connected: bool,
}

/// Run the chat client against the configured relay until the connection
/// closes or stdin ends.
pub async fn run_client(config: RelayConfig) -> Result<(), ClientError> {
    let mut projector = StateProjector::new(ConnectionManager::new(&config));
    let url = projector.url().to_string();
    let session_id = projector.session_id().to_string();

    tracing::info!("Starting chat client as '{}'", session_id);
    projector.connect();

    let mut input_rx = spawn_readline(session_id.clone());
    let mut cursor = RenderCursor::default();

    loop {
        tokio::select! {
            dispatched = projector.dispatch_next() => {
                if dispatched {
                    render(&projector, &mut cursor, &url);
                } else {
                    break;
                }
            }
            line = input_rx.recv() => match line {
                Some(line) => projector.send_message(&line),
                None => {
                    tracing::info!("Input closed");
                    break;
                }
            }
        }
    }

    projector.disconnect();

    if cursor.ever_connected {
        Ok(())
    } else {
        Err(ClientError::ConnectionError(format!(
            "could not connect to {}",
            url
        )))
    }
}

/// Print whatever changed since the last render
fn render(projector: &StateProjector, cursor: &mut RenderCursor, url: &str) {
    let session_id = projector.session_id().as_str();
    let view = projector.snapshot();
    let mut output = String::new();

    if view.connected != cursor.connected {
        cursor.connected = view.connected;
        cursor.ever_connected |= view.connected;
        let state = if view.connected {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        };
        output.push_str(&MessageFormatter::format_connection_state(state, url));
    }

    for message in view.messages.iter().skip(cursor.messages_shown) {
        output.push_str(&MessageFormatter::format_chat_message(
            message,
            projector.is_own_message(message),
        ));
    }
    cursor.messages_shown = view.messages.len();

    if cursor.presence.as_ref() != Some(&view.presence) && view.connected {
        output.push_str(&MessageFormatter::format_presence(&view.presence, session_id));
        cursor.presence = Some(view.presence);
    }

    if !output.is_empty() {
        print!("{}", output);
        if cursor.connected {
            redisplay_prompt(session_id);
        }
    }
}

/// Read stdin lines on a blocking thread and forward non-empty ones
fn spawn_readline(session_id: String) -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                tracing::error!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", session_id);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}
