//! Transport abstraction between the connection manager and the network.
//!
//! A [`Connector`] opens a transport without blocking and hands back a
//! [`TransportChannel`]: a sender for outgoing text frames and a receiver of
//! lifecycle events. Dropping the outgoing sender releases the transport.

pub mod memory;
pub mod websocket;

use tokio::sync::mpsc;

pub use memory::{MemoryConnector, MemoryPeer};
pub use websocket::WebSocketConnector;

/// Lifecycle and data events reported by a transport, in delivery order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The transport is open and can carry frames
    Opened,
    /// A text frame arrived
    Frame(String),
    /// A transport-level failure; diagnostic only, `Closed` follows when fatal
    Error(String),
    /// The transport is gone
    Closed,
}

/// Both ends the connection manager holds for one open transport
#[derive(Debug)]
pub struct TransportChannel {
    pub outgoing: mpsc::UnboundedSender<String>,
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Opens transports to a relay endpoint.
///
/// `open` must not block; failures are reported through the event receiver.
#[cfg_attr(test, mockall::automock)]
pub trait Connector: Send + Sync {
    fn open(&self, url: &str) -> TransportChannel;
}
