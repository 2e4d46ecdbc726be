//! JSON wire protocol exchanged with the relay.
//!
//! Every frame is a JSON object tagged with a `type` field:
//!
//! - outbound: `user_join`, `message`
//! - inbound: `message`, `client_info`; any other `type` decodes to
//!   [`InboundFrame::Unknown`]

use serde::{Deserialize, Serialize};

use crate::{
    domain::{ChatMessage, PresenceSnapshot},
    error::FrameError,
};

/// Frames sent by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OutboundFrame {
    /// Presence announcement, sent once right after the transport opens
    UserJoin { user_id: String },
    /// A chat message authored by this client
    Message {
        content: String,
        sender_id: String,
        timestamp: String,
    },
}

impl OutboundFrame {
    pub fn to_json(&self) -> Result<String, FrameError> {
        serde_json::to_string(self).map_err(FrameError::Encode)
    }
}

/// Frames received from the relay
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum InboundFrame {
    // The relay omits empty fields, so every field may be missing or null.
    Message {
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        sender_id: Option<String>,
        #[serde(default)]
        timestamp: Option<String>,
    },
    ClientInfo {
        total_clients: u64,
        #[serde(default)]
        online_users: Option<Vec<String>>,
    },
    #[serde(other)]
    Unknown,
}

impl InboundFrame {
    /// Decode one text payload
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        serde_json::from_str(text).map_err(FrameError::Malformed)
    }
}

/// Build a [`ChatMessage`] from the fields of an inbound `message` frame.
///
/// Missing content or sender become empty strings; a missing or empty
/// timestamp is filled with `received_at`.
pub fn to_chat_message(
    content: Option<String>,
    sender_id: Option<String>,
    timestamp: Option<String>,
    received_at: impl FnOnce() -> String,
) -> ChatMessage {
    let timestamp = timestamp
        .filter(|ts| !ts.is_empty())
        .unwrap_or_else(received_at);
    ChatMessage {
        content: content.unwrap_or_default(),
        sender_id: sender_id.unwrap_or_default(),
        timestamp,
    }
}

/// Build a [`PresenceSnapshot`] from the fields of an inbound `client_info` frame
pub fn to_presence(total_clients: u64, online_users: Option<Vec<String>>) -> PresenceSnapshot {
    PresenceSnapshot {
        total_clients,
        online_users: online_users.unwrap_or_default(),
    }
}
