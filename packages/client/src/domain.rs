//! Domain types for the chat client.
//!
//! These are the values the connection layer produces and the state
//! projector stores. They carry no transport details.

use std::fmt;

use uuid::Uuid;

const SESSION_ID_PREFIX: &str = "user_";
const SESSION_ID_RANDOM_LEN: usize = 9;

/// Per-client identity used to tag outbound messages.
///
/// Generated randomly once per client; uniqueness is probabilistic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh identity (`user_` followed by 9 random characters)
    pub fn generate() -> Self {
        let random = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}{}",
            SESSION_ID_PREFIX,
            &random[..SESSION_ID_RANDOM_LEN]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A chat message as received from the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub content: String,
    pub sender_id: String,
    /// ISO-8601 timestamp
    pub timestamp: String,
}

impl ChatMessage {
    /// Whether this message was sent by the given session
    pub fn is_from(&self, session_id: &SessionId) -> bool {
        self.sender_id == session_id.as_str()
    }
}

/// Latest presence information reported by the relay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceSnapshot {
    pub total_clients: u64,
    pub online_users: Vec<String>,
}

/// Connection status as driven by transport lifecycle events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}
