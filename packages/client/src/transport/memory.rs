//! In-process transport.
//!
//! [`MemoryConnector`] hands every opened transport's far end to a
//! [`MemoryPeer`], which plays the relay: it decides when the transport opens
//! or closes, delivers inbound frames and inspects what the client sent.

use tokio::sync::mpsc;

use super::{Connector, TransportChannel, TransportEvent};

/// Connector whose transports live entirely in memory
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    peers: mpsc::UnboundedSender<MemoryPeer>,
}

impl MemoryConnector {
    /// Create a connector and the receiver yielding one peer per `open` call
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MemoryPeer>) {
        let (peers_tx, peers_rx) = mpsc::unbounded_channel();
        (Self { peers: peers_tx }, peers_rx)
    }
}

impl Connector for MemoryConnector {
    fn open(&self, url: &str) -> TransportChannel {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let peer = MemoryPeer {
            url: url.to_string(),
            events: events_tx,
            sent: outgoing_rx,
        };
        if let Err(mpsc::error::SendError(peer)) = self.peers.send(peer) {
            tracing::debug!("No peer receiver for {}; closing transport", peer.url());
            let _ = peer.events.send(TransportEvent::Closed);
        }

        TransportChannel {
            outgoing: outgoing_tx,
            events: events_rx,
        }
    }
}

/// Relay-side end of an in-memory transport
#[derive(Debug)]
pub struct MemoryPeer {
    url: String,
    events: mpsc::UnboundedSender<TransportEvent>,
    sent: mpsc::UnboundedReceiver<String>,
}

impl MemoryPeer {
    /// URL the client asked for
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn open(&self) {
        self.emit(TransportEvent::Opened);
    }

    /// Deliver an inbound text frame to the client
    pub fn deliver(&self, text: impl Into<String>) {
        self.emit(TransportEvent::Frame(text.into()));
    }

    /// Report a transport error followed by a close
    pub fn fail(&self, reason: impl Into<String>) {
        self.emit(TransportEvent::Error(reason.into()));
        self.emit(TransportEvent::Closed);
    }

    pub fn close(&self) {
        self.emit(TransportEvent::Closed);
    }

    /// Next frame sent by the client, if one is queued
    pub fn try_recv_sent(&mut self) -> Option<String> {
        self.sent.try_recv().ok()
    }

    /// Drain every frame sent by the client so far
    pub fn sent_frames(&mut self) -> Vec<String> {
        std::iter::from_fn(|| self.try_recv_sent()).collect()
    }

    /// Whether the client released its end of the transport
    pub fn is_released(&self) -> bool {
        self.sent.is_closed()
    }

    fn emit(&self, event: TransportEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Client end of {} already released", self.url);
        }
    }
}
