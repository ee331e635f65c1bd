//! SQLite conversation store implementation.
//!
//! Sessions are keyed by (ip_address, session_id); the turn list is
//! persisted as a JSON text column. A corrupt turn payload decodes to an
//! empty history with a warning -- the one place a storage-side problem is
//! deliberately not fatal, so a damaged row cannot take a chat session
//! down with it.

use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::warn;

use anonchat_core::history::ConversationStore;
use anonchat_types::chat::{ConversationSession, Turn};
use anonchat_types::error::StorageError;

use super::pool::{map_sqlx_error, DatabasePool};

/// SQLite-backed implementation of `ConversationStore`.
pub struct SqliteConversationStore {
    pool: DatabasePool,
}

impl SqliteConversationStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct SessionRow {
    ip_address: String,
    session_id: String,
    turns: String,
    last_activity: String,
    created_at: String,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            ip_address: row.try_get("ip_address")?,
            session_id: row.try_get("session_id")?,
            turns: row.try_get("turns")?,
            last_activity: row.try_get("last_activity")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_session(self) -> Result<ConversationSession, StorageError> {
        // Corrupt turn payloads degrade to an empty history instead of
        // failing the request. Availability over visibility -- but leave
        // a trace in the logs.
        let turns: Vec<Turn> = match serde_json::from_str(&self.turns) {
            Ok(turns) => turns,
            Err(err) => {
                warn!(
                    ip = %self.ip_address,
                    session_id = %self.session_id,
                    %err,
                    "corrupt turn payload, treating history as empty"
                );
                Vec::new()
            }
        };

        Ok(ConversationSession {
            ip_address: self.ip_address,
            session_id: self.session_id,
            turns,
            last_activity: parse_datetime(&self.last_activity)?,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// ConversationStore implementation
// ---------------------------------------------------------------------------

impl ConversationStore for SqliteConversationStore {
    async fn get_session(
        &self,
        ip_address: &str,
        session_id: &str,
    ) -> Result<Option<ConversationSession>, StorageError> {
        let row = sqlx::query(
            "SELECT * FROM conversation_sessions WHERE ip_address = ? AND session_id = ?",
        )
        .bind(ip_address)
        .bind(session_id)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => {
                let session_row =
                    SessionRow::from_row(&row).map_err(|e| StorageError::Query(e.to_string()))?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn upsert_session(&self, session: &ConversationSession) -> Result<(), StorageError> {
        let turns = serde_json::to_string(&session.turns)
            .map_err(|e| StorageError::Query(format!("failed to serialize turns: {e}")))?;

        sqlx::query(
            r#"INSERT INTO conversation_sessions (ip_address, session_id, turns, last_activity, created_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(ip_address, session_id) DO UPDATE
               SET turns = excluded.turns,
                   last_activity = excluded.last_activity"#,
        )
        .bind(&session.ip_address)
        .bind(&session.session_id)
        .bind(turns)
        .bind(format_datetime(&session.last_activity))
        .bind(format_datetime(&session.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete_session(
        &self,
        ip_address: &str,
        session_id: &str,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "DELETE FROM conversation_sessions WHERE ip_address = ? AND session_id = ?",
        )
        .bind(ip_address)
        .bind(session_id)
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM conversation_sessions WHERE last_activity < ?")
            .bind(format_datetime(&cutoff))
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
