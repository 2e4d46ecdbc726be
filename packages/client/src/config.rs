//! Relay endpoint configuration.
//!
//! Values come from the environment (empty values count as unset) and can be
//! overridden by command line flags in the binary.

use std::{fmt, str::FromStr, time::Duration};

use crate::error::ClientError;

pub const ENV_SCHEME: &str = "TSUNAGI_WS_PROTOCOL";
pub const ENV_HOST: &str = "TSUNAGI_WS_HOST";
pub const ENV_PORT: &str = "TSUNAGI_WS_PORT";
pub const ENV_PATH: &str = "TSUNAGI_WS_PATH";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "TSUNAGI_CONNECT_TIMEOUT_SECS";

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_PATH: &str = "/ws";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// WebSocket URL scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scheme {
    #[default]
    Ws,
    Wss,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Ws => f.write_str("ws"),
            Scheme::Wss => f.write_str("wss"),
        }
    }
}

impl FromStr for Scheme {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ws" => Ok(Scheme::Ws),
            "wss" => Ok(Scheme::Wss),
            other => Err(ClientError::InvalidConfig(format!(
                "unsupported scheme '{}' (expected 'ws' or 'wss')",
                other
            ))),
        }
    }
}

/// Where the relay lives and how long to wait for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub connect_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::default(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            path: DEFAULT_PATH.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl RelayConfig {
    /// Load the configuration from the process environment
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(scheme) = get(ENV_SCHEME) {
            config.scheme = scheme.parse()?;
        }
        if let Some(host) = get(ENV_HOST) {
            config.host = host.trim().to_string();
        }
        if let Some(port) = get(ENV_PORT) {
            config.port = parse_port(&port)?;
        }
        if let Some(path) = get(ENV_PATH) {
            config.path = normalize_path(&path);
        }
        if let Some(secs) = get(ENV_CONNECT_TIMEOUT_SECS) {
            config.connect_timeout = parse_connect_timeout(&secs)?;
        }

        Ok(config)
    }

    /// Replace the path, adding a leading `/` when missing
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = normalize_path(path);
        self
    }

    /// Connection URL in the form `<scheme>://<host>:<port><path>`
    pub fn url(&self) -> String {
        format!("{}://{}:{}{}", self.scheme, self.host, self.port, self.path)
    }
}

fn parse_port(value: &str) -> Result<u16, ClientError> {
    value
        .trim()
        .parse()
        .map_err(|_| ClientError::InvalidConfig(format!("invalid port '{}'", value)))
}

fn parse_connect_timeout(value: &str) -> Result<Duration, ClientError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ClientError::InvalidConfig(format!(
            "invalid connect timeout '{}' (expected a positive number of seconds)",
            value
        ))),
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}
