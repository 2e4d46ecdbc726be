//! Real-time chat client for a Tsunagi relay.
//!
//! The core is split in two:
//!
//! - [`ConnectionManager`] owns the single transport, speaks the JSON wire
//!   protocol and reports message, presence and status notifications.
//! - [`StateProjector`] subscribes to those notifications and keeps the
//!   message log, the presence snapshot and the connected flag for a
//!   render layer.
//!
//! The `tsunagi-client` binary is a thin terminal render layer on top.

pub mod config;
pub mod connection;
pub mod domain;
pub mod error;
pub mod formatter;
pub mod projector;
pub mod protocol;
pub mod runner;
pub mod transport;
mod ui;

pub use config::RelayConfig;
pub use connection::ConnectionManager;
pub use domain::{ChatMessage, ConnectionState, PresenceSnapshot, SessionId};
pub use error::{ClientError, FrameError};
pub use projector::{ChatView, StateProjector};
pub use runner::run_client;
