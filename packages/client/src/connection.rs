//! Connection manager: owns the single transport to the relay.
//!
//! The manager encodes outbound frames, decodes inbound ones and reports
//! three kinds of notifications (message, presence, status) to at most one
//! handler each. Transport events are dispatched by the owner's event loop
//! through [`ConnectionManager::dispatch_next`] or
//! [`ConnectionManager::dispatch_pending`]; handlers run synchronously inside
//! those calls.
//!
//! ```text
//! Disconnected --connect()--> (opening) --Opened--> Connected
//! Connected --Closed event / disconnect()--> Disconnected
//! ```
//!
//! The opening gap is not a separate state: [`ConnectionManager::is_connected`]
//! reports `false` until the `Opened` event has been dispatched.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TryRecvError};
use tsunagi_shared::time::{Clock, SystemClock};

use crate::{
    config::RelayConfig,
    domain::{ChatMessage, ConnectionState, PresenceSnapshot, SessionId},
    protocol::{InboundFrame, OutboundFrame, to_chat_message, to_presence},
    transport::{Connector, TransportChannel, TransportEvent, WebSocketConnector},
};

type MessageHandler = Box<dyn FnMut(ChatMessage) + Send>;
type PresenceHandler = Box<dyn FnMut(PresenceSnapshot) + Send>;
type StatusHandler = Box<dyn FnMut(ConnectionState) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadyState {
    Opening,
    Open,
}

/// The transport currently held, with its live state
struct ActiveTransport {
    outgoing: mpsc::UnboundedSender<String>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    ready: ReadyState,
}

impl From<TransportChannel> for ActiveTransport {
    fn from(channel: TransportChannel) -> Self {
        Self {
            outgoing: channel.outgoing,
            events: channel.events,
            ready: ReadyState::Opening,
        }
    }
}

pub struct ConnectionManager {
    url: String,
    session_id: SessionId,
    connector: Arc<dyn Connector>,
    clock: Arc<dyn Clock>,
    transport: Option<ActiveTransport>,
    on_message: Option<MessageHandler>,
    on_presence: Option<PresenceHandler>,
    on_status: Option<StatusHandler>,
}

impl ConnectionManager {
    /// Create a manager that connects over WebSocket to the configured relay
    pub fn new(config: &RelayConfig) -> Self {
        Self::with_parts(
            config.url(),
            Arc::new(WebSocketConnector::new(config.connect_timeout)),
            Arc::new(SystemClock),
        )
    }

    /// Create a manager with an explicit transport connector and clock
    pub fn with_parts(
        url: impl Into<String>,
        connector: Arc<dyn Connector>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            url: url.into(),
            session_id: SessionId::generate(),
            connector,
            clock,
            transport: None,
            on_message: None,
            on_presence: None,
            on_status: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Start opening the transport.
    ///
    /// Returns immediately; the outcome is reported later as a status
    /// notification. Does nothing while a transport is already held.
    pub fn connect(&mut self) {
        if self.transport.is_some() {
            tracing::debug!("connect() ignored: a transport is already held");
            return;
        }

        tracing::info!("Connecting to {} as '{}'", self.url, self.session_id);
        self.transport = Some(self.connector.open(&self.url).into());
    }

    /// Close and release the transport, if any.
    ///
    /// Notifies `Disconnected` when a transport was held; calling this again is a no-op.
    pub fn disconnect(&mut self) {
        if self.transport.take().is_none() {
            return;
        }

        tracing::info!("Disconnected from {}", self.url);
        self.notify_status(ConnectionState::Disconnected);
    }

    /// Whether the transport is open
    pub fn is_connected(&self) -> bool {
        self.transport
            .as_ref()
            .is_some_and(|transport| transport.ready == ReadyState::Open)
    }

    pub fn connection_state(&self) -> ConnectionState {
        if self.is_connected() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Send a chat message authored by this session.
    ///
    /// Dropped silently when the transport is not open or the content is blank.
    pub fn send_message(&mut self, content: &str) {
        if content.trim().is_empty() {
            tracing::debug!("Dropping empty message");
            return;
        }

        let frame = OutboundFrame::Message {
            content: content.to_string(),
            sender_id: self.session_id.to_string(),
            timestamp: self.clock.now_iso8601(),
        };
        if !self.send_frame(&frame) {
            tracing::debug!("Dropping message: not connected");
        }
    }

    /// Register the message-arrived handler, replacing any previous one
    pub fn on_message<F>(&mut self, handler: F)
    where
        F: FnMut(ChatMessage) + Send + 'static,
    {
        self.on_message = Some(Box::new(handler));
    }

    /// Register the presence-updated handler, replacing any previous one
    pub fn on_presence<F>(&mut self, handler: F)
    where
        F: FnMut(PresenceSnapshot) + Send + 'static,
    {
        self.on_presence = Some(Box::new(handler));
    }

    /// Register the status-changed handler, replacing any previous one
    pub fn on_status<F>(&mut self, handler: F)
    where
        F: FnMut(ConnectionState) + Send + 'static,
    {
        self.on_status = Some(Box::new(handler));
    }

    /// Wait for the next transport event and dispatch it.
    ///
    /// Returns `false` without waiting when no transport is held.
    pub async fn dispatch_next(&mut self) -> bool {
        let Some(transport) = self.transport.as_mut() else {
            return false;
        };

        // A dropped event sender means the transport vanished without saying so.
        let event = transport
            .events
            .recv()
            .await
            .unwrap_or(TransportEvent::Closed);
        self.handle_event(event);
        true
    }

    /// Dispatch every transport event that is already available.
    ///
    /// Returns the number of events dispatched.
    pub fn dispatch_pending(&mut self) -> usize {
        let mut dispatched = 0;

        while let Some(transport) = self.transport.as_mut() {
            let event = match transport.events.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => TransportEvent::Closed,
            };
            self.handle_event(event);
            dispatched += 1;
        }

        dispatched
    }

    fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => self.handle_opened(),
            TransportEvent::Frame(text) => self.handle_frame(&text),
            TransportEvent::Error(reason) => {
                tracing::warn!("Transport error on {}: {}", self.url, reason);
            }
            TransportEvent::Closed => {
                if self.transport.take().is_some() {
                    tracing::info!("Connection to {} closed", self.url);
                    self.notify_status(ConnectionState::Disconnected);
                }
            }
        }
    }

    fn handle_opened(&mut self) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        if transport.ready == ReadyState::Open {
            return;
        }
        transport.ready = ReadyState::Open;
        tracing::info!("Connected to {}", self.url);

        // Announce presence before anyone can observe the connected state.
        let join = OutboundFrame::UserJoin {
            user_id: self.session_id.to_string(),
        };
        self.send_frame(&join);
        self.notify_status(ConnectionState::Connected);
    }

    fn handle_frame(&mut self, text: &str) {
        let frame = match InboundFrame::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Ignoring inbound payload: {}", e);
                return;
            }
        };

        match frame {
            InboundFrame::Message {
                content,
                sender_id,
                timestamp,
            } => {
                let clock = &self.clock;
                let message =
                    to_chat_message(content, sender_id, timestamp, || clock.now_iso8601());
                tracing::debug!("Message from '{}'", message.sender_id);
                if let Some(handler) = self.on_message.as_mut() {
                    handler(message);
                }
            }
            InboundFrame::ClientInfo {
                total_clients,
                online_users,
            } => {
                let presence = to_presence(total_clients, online_users);
                tracing::debug!("Presence update: {} clients", presence.total_clients);
                if let Some(handler) = self.on_presence.as_mut() {
                    handler(presence);
                }
            }
            InboundFrame::Unknown => {
                tracing::debug!("Ignoring frame of unknown type");
            }
        }
    }

    /// Encode and transmit a frame if the transport is open
    fn send_frame(&self, frame: &OutboundFrame) -> bool {
        let Some(transport) = self
            .transport
            .as_ref()
            .filter(|transport| transport.ready == ReadyState::Open)
        else {
            return false;
        };

        let json = match frame.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("{}", e);
                return false;
            }
        };

        if transport.outgoing.send(json).is_err() {
            // The I/O side is gone; its Closed event will follow.
            tracing::warn!("Failed to send frame: transport already closed");
            return false;
        }
        true
    }

    fn notify_status(&mut self, state: ConnectionState) {
        if let Some(handler) = self.on_status.as_mut() {
            handler(state);
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if self.transport.take().is_some() {
            tracing::debug!("Released transport to {} on teardown", self.url);
        }
    }
}
