//! ConversationStore and ExchangeLog trait definitions.
//!
//! Follows the same RPITIT pattern as `RateLimitStore`. Implementations
//! live in anonchat-infra.

use chrono::{DateTime, Utc};

use anonchat_types::audit::ExchangeRecord;
use anonchat_types::chat::ConversationSession;
use anonchat_types::error::StorageError;

/// Storage port for the trimmed working history, keyed by
/// (client IP, session id).
pub trait ConversationStore: Send + Sync {
    /// Load a session. A stored-but-corrupt turn payload decodes to a
    /// session with empty turns rather than an error; all other storage
    /// failures propagate.
    fn get_session(
        &self,
        ip_address: &str,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<ConversationSession>, StorageError>> + Send;

    /// Insert or replace the session row for
    /// `(session.ip_address, session.session_id)`.
    fn upsert_session(
        &self,
        session: &ConversationSession,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Delete one session. Returns whether a row existed.
    fn delete_session(
        &self,
        ip_address: &str,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<bool, StorageError>> + Send;

    /// Delete sessions whose `last_activity` is older than `cutoff`.
    /// Returns the number of rows removed.
    fn purge_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, StorageError>> + Send;
}

/// Storage port for the append-only exchange audit log.
///
/// Entries are never updated or trimmed; they leave the table only through
/// the retention purge.
pub trait ExchangeLog: Send + Sync {
    /// Append one raw exchange.
    fn record(
        &self,
        entry: &ExchangeRecord,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Most recent entries for a session, newest first.
    fn recent_for_session(
        &self,
        ip_address: &str,
        session_id: &str,
        limit: i64,
    ) -> impl std::future::Future<Output = Result<Vec<ExchangeRecord>, StorageError>> + Send;

    /// Delete entries created before `cutoff`. Returns the number of rows
    /// removed.
    fn purge_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, StorageError>> + Send;
}
