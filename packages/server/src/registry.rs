//! Connection registry and per-connection state.

use std::collections::HashMap;

use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use crate::protocol::Protocol;

/// Instance identity of one live connection.
///
/// Minted at admission time. Registry keys are per-instance rather than
/// per-nickname: several connections may share the same identity string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to one live connection.
#[derive(Clone)]
pub struct Connection {
    pub id: ConnectionId,
    /// Nickname taken from the handshake request path; not validated, not
    /// unique-checked.
    pub identity: String,
    /// Subprotocol fixed at admission time.
    pub protocol: Protocol,
    /// Channel into the connection's writer task. A closed channel means
    /// the socket is no longer open.
    pub outbound: mpsc::UnboundedSender<String>,
}

/// The set of all currently admitted connections.
///
/// Membership is advisory for broadcast targeting: liveness is re-checked
/// against the outbound channel at iteration and send time. All state is
/// in-memory and process-lifetime scoped.
pub struct Registry {
    connections: Mutex<HashMap<ConnectionId, Connection>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Add a newly handshaken connection. Must happen before any broadcast
    /// can target it.
    pub async fn admit(&self, connection: Connection) {
        let mut connections = self.connections.lock().await;
        connections.insert(connection.id, connection);
    }

    /// Remove a connection. Idempotent: evicting an absent connection is a
    /// no-op. Returns whether the connection was present, so the caller
    /// announces a departure at most once.
    pub async fn evict(&self, id: ConnectionId) -> bool {
        let mut connections = self.connections.lock().await;
        connections.remove(&id).is_some()
    }

    /// Every admitted connection other than `exclude` whose outbound channel
    /// is still open. Returns cloned handles so no caller retains a borrow
    /// of registry state across a suspension point.
    pub async fn all_except(&self, exclude: ConnectionId) -> Vec<Connection> {
        let connections = self.connections.lock().await;
        connections
            .values()
            .filter(|connection| connection.id != exclude)
            .filter(|connection| !connection.outbound.is_closed())
            .cloned()
            .collect()
    }

    /// Current number of admitted connections. Derived from the map itself,
    /// never a separately maintained counter.
    pub async fn count(&self) -> usize {
        let connections = self.connections.lock().await;
        connections.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
