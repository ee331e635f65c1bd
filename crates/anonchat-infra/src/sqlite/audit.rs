//! SQLite exchange audit log implementation.
//!
//! Append-only record of every raw exchange for analytics and debugging,
//! distinct from the trimmed working history. Rows are only ever inserted
//! or removed by the retention purge.

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use anonchat_core::history::ExchangeLog;
use anonchat_types::audit::ExchangeRecord;
use anonchat_types::error::StorageError;

use super::pool::{map_sqlx_error, DatabasePool};

/// SQLite-backed implementation of `ExchangeLog`.
pub struct SqliteExchangeLog {
    pool: DatabasePool,
}

impl SqliteExchangeLog {
    /// Create a new audit log backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types
// ---------------------------------------------------------------------------

struct AuditRow {
    id: String,
    ip_address: String,
    session_id: String,
    message: String,
    response: String,
    created_at: String,
}

impl AuditRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            ip_address: row.try_get("ip_address")?,
            session_id: row.try_get("session_id")?,
            message: row.try_get("message")?,
            response: row.try_get("response")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_record(self) -> Result<ExchangeRecord, StorageError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StorageError::Query(format!("invalid audit id: {e}")))?;

        Ok(ExchangeRecord {
            id,
            ip_address: self.ip_address,
            session_id: self.session_id,
            message: self.message,
            response: self.response,
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
// ExchangeLog implementation
// ---------------------------------------------------------------------------

impl ExchangeLog for SqliteExchangeLog {
    async fn record(&self, entry: &ExchangeRecord) -> Result<(), StorageError> {
        sqlx::query(
            r#"INSERT INTO exchange_audit_log (id, ip_address, session_id, message, response, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(entry.id.to_string())
        .bind(&entry.ip_address)
        .bind(&entry.session_id)
        .bind(&entry.message)
        .bind(&entry.response)
        .bind(format_datetime(&entry.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn recent_for_session(
        &self,
        ip_address: &str,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<ExchangeRecord>, StorageError> {
        let rows = sqlx::query(
            r#"SELECT * FROM exchange_audit_log
               WHERE ip_address = ? AND session_id = ?
               ORDER BY created_at DESC
               LIMIT ?"#,
        )
        .bind(ip_address)
        .bind(session_id)
        .bind(limit)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx_error)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let audit_row =
                AuditRow::from_row(row).map_err(|e| StorageError::Query(e.to_string()))?;
            entries.push(audit_row.into_record()?);
        }

        Ok(entries)
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM exchange_audit_log WHERE created_at < ?")
            .bind(format_datetime(&cutoff))
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
