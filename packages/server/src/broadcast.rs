//! Fan-out broadcast engine.

use std::sync::Arc;

use serde::Serialize;

use idobata_shared::time::Clock;

use crate::{
    protocol::Protocol,
    registry::{ConnectionId, Registry},
};

/// Wire envelope delivered to `json` subprotocol clients.
#[derive(Debug, Serialize)]
struct Envelope<'a> {
    timestamp: String,
    nick: &'a str,
    data: &'a str,
}

/// Delivers one sender's payload to every other open connection, choosing
/// the framing by each recipient's negotiated subprotocol.
pub struct Broadcaster {
    registry: Arc<Registry>,
    clock: Arc<dyn Clock>,
}

impl Broadcaster {
    pub fn new(registry: Arc<Registry>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    /// Broadcast `payload` to everyone except the sending connection.
    ///
    /// `text` recipients receive the raw payload unmodified; `json`
    /// recipients receive a `{timestamp, nick, data}` envelope. Delivery is
    /// fire-and-forget per recipient: a recipient whose writer is gone is
    /// skipped and the loop continues.
    ///
    /// Returns the number of recipients the payload was handed to. The
    /// count is for logging only; the socket write happens later in each
    /// recipient's writer task and may still fail.
    pub async fn broadcast_except(
        &self,
        sender_id: ConnectionId,
        sender_identity: &str,
        payload: &str,
    ) -> usize {
        let recipients = self.registry.all_except(sender_id).await;

        let envelope = Envelope {
            timestamp: self.clock.now_utc().to_rfc3339(),
            nick: sender_identity,
            data: payload,
        };
        let enveloped = serde_json::to_string(&envelope).unwrap();

        let mut pushed = 0;
        for recipient in &recipients {
            let frame = match recipient.protocol {
                Protocol::Text => payload.to_string(),
                Protocol::Json => enveloped.clone(),
            };
            if recipient.outbound.send(frame).is_err() {
                tracing::warn!(
                    "Failed to push message to client '{}', skipping",
                    recipient.identity
                );
                continue;
            }
            pushed += 1;
        }
        pushed
    }
}
