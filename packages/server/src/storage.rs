//! Persistent message log.
//!
//! The gateway opens one short-lived SQLite connection per call, mirroring
//! an external store with no client-held lock: acquired and released inside
//! each call, on every exit path.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{
    Connection, SqliteConnection,
    sqlite::SqliteConnectOptions,
};
use thiserror::Error;

/// One persisted chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LogEntry {
    /// Point in time the message was received by the relay.
    pub timestamp: DateTime<Utc>,
    /// The sending connection's identity at receipt time.
    pub nickname: String,
    /// The raw payload, unparsed.
    pub message: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Append-only access to the message log.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageLog: Send + Sync {
    /// Insert one entry. Each call owns its own store connection.
    async fn append(&self, entry: LogEntry) -> Result<(), StoreError>;

    /// Every entry in insertion order, fully materialized.
    async fn list_all(&self) -> Result<Vec<LogEntry>, StoreError>;
}

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    nickname TEXT NOT NULL,
    message TEXT NOT NULL
)";

/// SQLite-backed message log.
///
/// Holds connect options only; no pooling, no connection kept between
/// calls.
pub struct SqliteMessageLog {
    options: SqliteConnectOptions,
}

impl SqliteMessageLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            options: SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true),
        }
    }

    /// Create the log table if it does not exist yet. Run once at startup.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let mut conn = self.open().await?;
        sqlx::query(SCHEMA_SQL).execute(&mut conn).await?;
        conn.close().await?;
        Ok(())
    }

    async fn open(&self) -> Result<SqliteConnection, StoreError> {
        Ok(SqliteConnection::connect_with(&self.options).await?)
    }
}

#[async_trait]
impl MessageLog for SqliteMessageLog {
    async fn append(&self, entry: LogEntry) -> Result<(), StoreError> {
        let mut conn = self.open().await?;
        sqlx::query("INSERT INTO log (timestamp, nickname, message) VALUES (?1, ?2, ?3)")
            .bind(entry.timestamp)
            .bind(&entry.nickname)
            .bind(&entry.message)
            .execute(&mut conn)
            .await?;
        conn.close().await?;
        tracing::debug!("Message from '{}' saved in log", entry.nickname);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<LogEntry>, StoreError> {
        let mut conn = self.open().await?;
        let entries = sqlx::query_as::<_, LogEntry>(
            "SELECT timestamp, nickname, message FROM log ORDER BY id",
        )
        .fetch_all(&mut conn)
        .await?;
        conn.close().await?;
        Ok(entries)
    }
}
