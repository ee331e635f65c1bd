//! RateLimitStore trait definition.

use anonchat_types::error::StorageError;
use anonchat_types::rate_limit::RateLimitRecord;

/// Storage port for per-IP rate-limit records.
///
/// Implementations live in anonchat-infra (e.g., `SqliteRateLimitStore`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
///
/// The store is a plain key-value surface; the check-and-consume decision
/// and its per-key atomicity are owned by [`super::RateLimiter`].
pub trait RateLimitStore: Send + Sync {
    /// Look up the record for an IP, if any.
    fn get(
        &self,
        ip_address: &str,
    ) -> impl std::future::Future<Output = Result<Option<RateLimitRecord>, StorageError>> + Send;

    /// Insert or replace the record for `record.ip_address`.
    fn put(
        &self,
        record: &RateLimitRecord,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Delete every record. Returns the number of rows removed.
    fn clear_all(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, StorageError>> + Send;
}
