//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use super::{
    handler::{health_check, message_log, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Run the relay server
///
/// # Arguments
///
/// * `host` - The host address to bind to (e.g., "127.0.0.1")
/// * `port` - The port number to bind to (e.g., 1338)
/// * `state` - Shared application state (registry, broadcaster, message log)
///
/// # Errors
///
/// Returns an error if the server fails to bind to the specified address or
/// if there's an error during server execution.
pub async fn run_server(
    host: String,
    port: u16,
    state: Arc<AppState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Define handlers
    let app = Router::new()
        // HTTP endpoints
        .route("/api/health", get(health_check))
        .route("/api/log", get(message_log))
        // WebSocket endpoint; the path remainder becomes the client identity
        .route("/{*identity}", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Bind the server to the host and port
    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    // Start the server
    tracing::info!("Relay server listening on {}", listener.local_addr()?);
    tracing::info!("Connect to: ws://{}/<nickname>", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown gracefully");

    // Set up graceful shutdown signal handler
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
