//! WebSocket transport built on tokio-tungstenite.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use super::{Connector, TransportChannel, TransportEvent};
use crate::error::ClientError;

/// Opens one WebSocket connection per [`Connector::open`] call.
///
/// Each connection runs on its own spawned I/O task, so `open` must be called
/// from within a tokio runtime; otherwise the failure is reported as events.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    connect_timeout: Duration,
}

impl WebSocketConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Connector for WebSocketConnector {
    fn open(&self, url: &str) -> TransportChannel {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel::<String>();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(run_connection(
                    url.to_string(),
                    self.connect_timeout,
                    outgoing_rx,
                    events_tx,
                ));
            }
            Err(e) => {
                tracing::error!("Cannot open WebSocket outside a tokio runtime: {}", e);
                let _ = events_tx.send(TransportEvent::Error(e.to_string()));
                let _ = events_tx.send(TransportEvent::Closed);
            }
        }

        TransportChannel {
            outgoing: outgoing_tx,
            events: events_rx,
        }
    }
}

/// Drive one connection until either side goes away
async fn run_connection(
    url: String,
    connect_timeout: Duration,
    mut outgoing_rx: mpsc::UnboundedReceiver<String>,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
) {
    // Nothing is written before `Opened`, so a `None` here means the handle was released.
    let connected = tokio::select! {
        result = tokio::time::timeout(connect_timeout, connect_async(&url)) => result,
        _ = outgoing_rx.recv() => {
            tracing::debug!("Transport released while connecting to {}", url);
            return;
        }
    };

    let ws_stream = match connected {
        Ok(Ok((ws_stream, _response))) => ws_stream,
        Ok(Err(e)) => {
            let error = ClientError::ConnectionError(e.to_string());
            report_failure(&events_tx, error);
            return;
        }
        Err(_) => {
            report_failure(&events_tx, ClientError::ConnectTimeout(connect_timeout));
            return;
        }
    };

    if events_tx.send(TransportEvent::Opened).is_err() {
        return;
    }

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            outgoing = outgoing_rx.recv() => match outgoing {
                Some(text) => {
                    if let Err(e) = write.send(Message::Text(text.into())).await {
                        tracing::warn!("Failed to send frame: {}", e);
                        let _ = events_tx.send(TransportEvent::Error(e.to_string()));
                        break;
                    }
                }
                None => {
                    // Released by the owner: close politely, no one listens for events anymore.
                    if let Err(e) = write.close().await {
                        tracing::debug!("Error while closing WebSocket: {}", e);
                    }
                    return;
                }
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if events_tx.send(TransportEvent::Frame(text.as_str().to_owned())).is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Binary(data))) => {
                    tracing::debug!("Ignoring binary frame ({} bytes)", data.len());
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!("Relay closed the connection: {:?}", frame);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    let _ = events_tx.send(TransportEvent::Error(e.to_string()));
                    break;
                }
                None => break,
            },
        }
    }

    let _ = events_tx.send(TransportEvent::Closed);
}

fn report_failure(events_tx: &mpsc::UnboundedSender<TransportEvent>, error: ClientError) {
    let _ = events_tx.send(TransportEvent::Error(error.to_string()));
    let _ = events_tx.send(TransportEvent::Closed);
}
