//! Terminal chat client for a Tsunagi relay.
//!
//! Connects to the relay, announces itself and sends every stdin line as a
//! chat message. Incoming messages and presence updates are printed as they
//! arrive. The client exits when the connection closes.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tsunagi-client
//! cargo run --bin tsunagi-client -- --host chat.example.com --port 443 --scheme wss
//! ```

use clap::Parser;

use tsunagi_client::{RelayConfig, config::Scheme};
use tsunagi_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tsunagi-client")]
#[command(about = "Real-time chat client with live presence", long_about = None)]
struct Args {
    /// WebSocket scheme (ws or wss) [env: TSUNAGI_WS_PROTOCOL]
    #[arg(short = 's', long)]
    scheme: Option<Scheme>,

    /// Relay host [env: TSUNAGI_WS_HOST]
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Relay port [env: TSUNAGI_WS_PORT]
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Relay path [env: TSUNAGI_WS_PATH]
    #[arg(long)]
    path: Option<String>,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn apply(self, mut config: RelayConfig) -> RelayConfig {
        if let Some(scheme) = self.scheme {
            config.scheme = scheme;
        }
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(path) = self.path {
            config = config.with_path(&path);
        }
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(&[env!("CARGO_PKG_NAME"), "tsunagi-shared"], &args.log_level);

    let config = match RelayConfig::from_env() {
        Ok(config) => args.apply(config),
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = tsunagi_client::run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
