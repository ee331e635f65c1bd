//! SQLite rate-limit store implementation.
//!
//! Implements `RateLimitStore` from `anonchat-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, upsert via
//! `ON CONFLICT`.

use chrono::{DateTime, Utc};
use sqlx::Row;

use anonchat_core::limiter::RateLimitStore;
use anonchat_types::error::StorageError;
use anonchat_types::rate_limit::RateLimitRecord;

use super::pool::{map_sqlx_error, DatabasePool};

/// SQLite-backed implementation of `RateLimitStore`.
pub struct SqliteRateLimitStore {
    pool: DatabasePool,
}

impl SqliteRateLimitStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct RateLimitRow {
    ip_address: String,
    request_count: i64,
    window_start: String,
    created_at: String,
}

impl RateLimitRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            ip_address: row.try_get("ip_address")?,
            request_count: row.try_get("request_count")?,
            window_start: row.try_get("window_start")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_record(self) -> Result<RateLimitRecord, StorageError> {
        Ok(RateLimitRecord {
            ip_address: self.ip_address,
            request_count: self.request_count as u32,
            window_start: parse_datetime(&self.window_start)?,
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
// RateLimitStore implementation
// ---------------------------------------------------------------------------

impl RateLimitStore for SqliteRateLimitStore {
    async fn get(&self, ip_address: &str) -> Result<Option<RateLimitRecord>, StorageError> {
        let row = sqlx::query("SELECT * FROM rate_limits WHERE ip_address = ?")
            .bind(ip_address)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => {
                let record_row = RateLimitRow::from_row(&row)
                    .map_err(|e| StorageError::Query(e.to_string()))?;
                Ok(Some(record_row.into_record()?))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, record: &RateLimitRecord) -> Result<(), StorageError> {
        sqlx::query(
            r#"INSERT INTO rate_limits (ip_address, request_count, window_start, created_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(ip_address) DO UPDATE
               SET request_count = excluded.request_count,
                   window_start = excluded.window_start"#,
        )
        .bind(&record.ip_address)
        .bind(record.request_count as i64)
        .bind(format_datetime(&record.window_start))
        .bind(format_datetime(&record.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn clear_all(&self) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM rate_limits")
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::DatabasePool;
    use chrono::TimeZone;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = SqliteRateLimitStore::new(test_pool().await);
        let record = store.get("1.2.3.4").await.unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_put_and_get_roundtrip() {
        let store = SqliteRateLimitStore::new(test_pool().await);

        let record = RateLimitRecord::first_request("1.2.3.4", at(0));
        store.put(&record).await.unwrap();

        let found = store.get("1.2.3.4").await.unwrap().unwrap();
        assert_eq!(found, record);
    }

    #[tokio::test]
    async fn test_put_updates_existing_row() {
        let store = SqliteRateLimitStore::new(test_pool().await);

        let mut record = RateLimitRecord::first_request("1.2.3.4", at(0));
        store.put(&record).await.unwrap();

        record.request_count = 2;
        store.put(&record).await.unwrap();

        let found = store.get("1.2.3.4").await.unwrap().unwrap();
        assert_eq!(found.request_count, 2);
        assert_eq!(found.window_start, at(0));
    }

    #[tokio::test]
    async fn test_opaque_keys_accepted() {
        // The store performs no IP format validation.
        let store = SqliteRateLimitStore::new(test_pool().await);

        let record = RateLimitRecord::first_request("not-an-ip, but a key", at(0));
        store.put(&record).await.unwrap();

        let found = store.get("not-an-ip, but a key").await.unwrap().unwrap();
        assert_eq!(found.request_count, 1);
    }

    #[tokio::test]
    async fn test_clear_all_removes_every_row() {
        let store = SqliteRateLimitStore::new(test_pool().await);

        for ip in ["1.1.1.1", "2.2.2.2", "3.3.3.3"] {
            store.put(&RateLimitRecord::first_request(ip, at(0))).await.unwrap();
        }

        let cleared = store.clear_all().await.unwrap();
        assert_eq!(cleared, 3);
        assert!(store.get("1.1.1.1").await.unwrap().is_none());
    }
}
