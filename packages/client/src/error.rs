//! Error types for the Tsunagi chat client.

use std::time::Duration;

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The relay could not be reached or the connection was lost
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Opening the connection took longer than the configured timeout
    #[error("Connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// Configuration value could not be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Wire frame encoding/decoding errors
#[derive(Debug, Error)]
pub enum FrameError {
    /// Inbound payload is not a well-formed frame
    #[error("Malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Outbound frame could not be serialized
    #[error("Failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
}
