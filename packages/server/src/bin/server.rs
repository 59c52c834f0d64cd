//! WebSocket message relay server.
//!
//! Clients connect with a `text` or `json` subprotocol and every message is
//! broadcast to all other connected clients and appended to the message log.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin idobata-server
//! cargo run --bin idobata-server -- --host 0.0.0.0 --port 3000
//! ```

use std::{path::PathBuf, sync::Arc};

use clap::Parser;

use idobata_server::{
    registry::Registry,
    server::{AppState, run_server},
    storage::SqliteMessageLog,
};
use idobata_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "idobata-server")]
#[command(about = "WebSocket message relay with subprotocol negotiation", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "IDOBATA_PORT", default_value_t = 1338)]
    port: u16,

    /// Path to the SQLite message log
    #[arg(long, default_value = "chat.db")]
    db_path: PathBuf,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // A relay that can never persist is misconfigured; fail fast here.
    // Per-message append failures later stay non-fatal.
    let log = SqliteMessageLog::new(&args.db_path);
    if let Err(e) = log.ensure_schema().await {
        tracing::error!(
            "Failed to prepare message log at {}: {}",
            args.db_path.display(),
            e
        );
        std::process::exit(1);
    }

    let registry = Arc::new(Registry::new());
    let state = Arc::new(AppState::new(registry, Arc::new(log), Arc::new(SystemClock)));

    if let Err(e) = run_server(args.host, args.port, state).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
