//! Conversation history service.
//!
//! Coordinates the audit log and the trimmed working history. The
//! load-append-trim-persist sequence is serialized per (IP, session) key
//! through a keyed async mutex; sessions for different keys never contend.
//! Every access round-trips through the store -- nothing is cached here.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use anonchat_types::audit::ExchangeRecord;
use anonchat_types::chat::{ConversationSession, Turn};
use anonchat_types::error::StorageError;

use super::store::{ConversationStore, ExchangeLog};

/// Row counts removed by a retention purge.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PurgeReport {
    pub sessions: u64,
    pub audit_entries: u64,
}

/// Orchestrates exchange persistence: audit logging, history append,
/// FIFO trimming, and retention purges.
pub struct ConversationService<C: ConversationStore, A: ExchangeLog> {
    sessions: C,
    audit: A,
    locks: DashMap<(String, String), Arc<Mutex<()>>>,
}

impl<C: ConversationStore, A: ExchangeLog> ConversationService<C, A> {
    /// Create a new service with the given stores.
    pub fn new(sessions: C, audit: A) -> Self {
        Self {
            sessions,
            audit,
            locks: DashMap::new(),
        }
    }

    /// Access the session store.
    pub fn session_store(&self) -> &C {
        &self.sessions
    }

    /// Access the audit log.
    pub fn audit_log(&self) -> &A {
        &self.audit
    }

    fn key_lock(&self, ip_address: &str, session_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry((ip_address.to_string(), session_id.to_string()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Ordered turns for a session; empty when the session does not exist.
    pub async fn get_history(
        &self,
        ip_address: &str,
        session_id: &str,
    ) -> Result<Vec<Turn>, StorageError> {
        let session = self.sessions.get_session(ip_address, session_id).await?;
        Ok(session.map(|s| s.turns).unwrap_or_default())
    }

    /// Record one user/assistant exchange.
    ///
    /// Writes the raw exchange to the audit log first, then appends the
    /// pair to the working history, trims it to the newest
    /// [`anonchat_types::chat::MAX_TURNS`] turns, and persists it with a
    /// fresh `last_activity`.
    pub async fn append_exchange(
        &self,
        ip_address: &str,
        session_id: &str,
        user_message: &str,
        assistant_response: &str,
    ) -> Result<(), StorageError> {
        self.append_exchange_at(ip_address, session_id, user_message, assistant_response, Utc::now())
            .await
    }

    /// Clock-injected variant of [`Self::append_exchange`].
    pub async fn append_exchange_at(
        &self,
        ip_address: &str,
        session_id: &str,
        user_message: &str,
        assistant_response: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let lock = self.key_lock(ip_address, session_id);
        let _guard = lock.lock().await;

        let entry = ExchangeRecord::new(ip_address, session_id, user_message, assistant_response, now);
        self.audit.record(&entry).await?;

        let mut session = self
            .sessions
            .get_session(ip_address, session_id)
            .await?
            .unwrap_or_else(|| ConversationSession::new(ip_address, session_id, now));

        session.append_exchange(user_message, assistant_response, now);
        self.sessions.upsert_session(&session).await
    }

    /// Delete one conversation. Returns whether a session existed.
    pub async fn delete_conversation(
        &self,
        ip_address: &str,
        session_id: &str,
    ) -> Result<bool, StorageError> {
        let lock = self.key_lock(ip_address, session_id);
        let _guard = lock.lock().await;
        self.sessions.delete_session(ip_address, session_id).await
    }

    /// Delete sessions and audit entries older than `days`.
    pub async fn purge_older_than(&self, days: i64) -> Result<PurgeReport, StorageError> {
        self.purge_older_than_at(days, Utc::now()).await
    }

    /// Clock-injected variant of [`Self::purge_older_than`].
    pub async fn purge_older_than_at(
        &self,
        days: i64,
        now: DateTime<Utc>,
    ) -> Result<PurgeReport, StorageError> {
        let cutoff = now - Duration::days(days);
        let sessions = self.sessions.purge_older_than(cutoff).await?;
        let audit_entries = self.audit.purge_older_than(cutoff).await?;

        info!(sessions, audit_entries, %cutoff, "retention purge completed");

        Ok(PurgeReport {
            sessions,
            audit_entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anonchat_types::chat::{MessageRole, MAX_TURNS};
    use chrono::TimeZone;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemorySessions {
        rows: std::sync::Mutex<HashMap<(String, String), ConversationSession>>,
    }

    impl ConversationStore for MemorySessions {
        async fn get_session(
            &self,
            ip_address: &str,
            session_id: &str,
        ) -> Result<Option<ConversationSession>, StorageError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .get(&(ip_address.to_string(), session_id.to_string()))
                .cloned())
        }

        async fn upsert_session(&self, session: &ConversationSession) -> Result<(), StorageError> {
            self.rows.lock().unwrap().insert(
                (session.ip_address.clone(), session.session_id.clone()),
                session.clone(),
            );
            Ok(())
        }

        async fn delete_session(
            &self,
            ip_address: &str,
            session_id: &str,
        ) -> Result<bool, StorageError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .remove(&(ip_address.to_string(), session_id.to_string()))
                .is_some())
        }

        async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|_, s| s.last_activity >= cutoff);
            Ok((before - rows.len()) as u64)
        }
    }

    #[derive(Default)]
    struct MemoryLog {
        entries: std::sync::Mutex<Vec<ExchangeRecord>>,
    }

    impl ExchangeLog for MemoryLog {
        async fn record(&self, entry: &ExchangeRecord) -> Result<(), StorageError> {
            self.entries.lock().unwrap().push(entry.clone());
            Ok(())
        }

        async fn recent_for_session(
            &self,
            ip_address: &str,
            session_id: &str,
            limit: i64,
        ) -> Result<Vec<ExchangeRecord>, StorageError> {
            let entries = self.entries.lock().unwrap();
            let mut matching: Vec<ExchangeRecord> = entries
                .iter()
                .filter(|e| e.ip_address == ip_address && e.session_id == session_id)
                .cloned()
                .collect();
            matching.reverse();
            matching.truncate(limit as usize);
            Ok(matching)
        }

        async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError> {
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            entries.retain(|e| e.created_at >= cutoff);
            Ok((before - entries.len()) as u64)
        }
    }

    fn service() -> ConversationService<MemorySessions, MemoryLog> {
        ConversationService::new(MemorySessions::default(), MemoryLog::default())
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_session_returns_empty_history() {
        let svc = service();
        let history = svc.get_history("1.2.3.4", "missing").await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_append_exchange_builds_pairs_in_order() {
        let svc = service();
        svc.append_exchange_at("1.2.3.4", "s1", "q1", "a1", at(0)).await.unwrap();
        svc.append_exchange_at("1.2.3.4", "s1", "q2", "a2", at(1)).await.unwrap();

        let history = svc.get_history("1.2.3.4", "s1").await.unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].content, "q1");
        assert_eq!(history[0].role, MessageRole::User);
        assert_eq!(history[3].content, "a2");
        assert_eq!(history[3].role, MessageRole::Assistant);
    }

    #[tokio::test]
    async fn test_history_trims_to_last_twenty_turns() {
        let svc = service();
        for i in 0..11 {
            svc.append_exchange_at("1.2.3.4", "s1", &format!("q{i}"), &format!("a{i}"), at(i))
                .await
                .unwrap();
        }

        let history = svc.get_history("1.2.3.4", "s1").await.unwrap();
        assert_eq!(history.len(), MAX_TURNS);
        // The oldest pair is gone; the newest pair closes the list.
        assert_eq!(history[0].content, "q1");
        assert_eq!(history[MAX_TURNS - 1].content, "a10");
    }

    #[tokio::test]
    async fn test_audit_log_is_never_trimmed() {
        let svc = service();
        for i in 0..11 {
            svc.append_exchange_at("1.2.3.4", "s1", &format!("q{i}"), &format!("a{i}"), at(i))
                .await
                .unwrap();
        }

        let entries = svc
            .audit_log()
            .recent_for_session("1.2.3.4", "s1", 100)
            .await
            .unwrap();
        assert_eq!(entries.len(), 11);
    }

    #[tokio::test]
    async fn test_sessions_are_scoped_by_ip() {
        let svc = service();
        svc.append_exchange_at("1.1.1.1", "s1", "q", "a", at(0)).await.unwrap();

        let other = svc.get_history("2.2.2.2", "s1").await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_delete_conversation() {
        let svc = service();
        svc.append_exchange_at("1.2.3.4", "s1", "q", "a", at(0)).await.unwrap();

        assert!(svc.delete_conversation("1.2.3.4", "s1").await.unwrap());
        assert!(!svc.delete_conversation("1.2.3.4", "s1").await.unwrap());
        assert!(svc.get_history("1.2.3.4", "s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purge_removes_stale_sessions_and_audit_rows() {
        let svc = service();
        svc.append_exchange_at("1.2.3.4", "old", "q", "a", at(0)).await.unwrap();
        svc.append_exchange_at("1.2.3.4", "new", "q", "a", at(8 * 86_400))
            .await
            .unwrap();

        let report = svc.purge_older_than_at(7, at(8 * 86_400 + 60)).await.unwrap();
        assert_eq!(report.sessions, 1);
        assert_eq!(report.audit_entries, 1);

        assert!(svc.get_history("1.2.3.4", "old").await.unwrap().is_empty());
        assert_eq!(svc.get_history("1.2.3.4", "new").await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_lose_nothing() {
        let svc = Arc::new(service());

        let mut handles = Vec::new();
        for i in 0..8 {
            let svc = Arc::clone(&svc);
            handles.push(tokio::spawn(async move {
                svc.append_exchange_at("1.2.3.4", "s1", &format!("q{i}"), &format!("a{i}"), at(i))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let history = svc.get_history("1.2.3.4", "s1").await.unwrap();
        assert_eq!(history.len(), 16);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_respect_bound() {
        let svc = Arc::new(service());

        let mut handles = Vec::new();
        for i in 0..25 {
            let svc = Arc::clone(&svc);
            handles.push(tokio::spawn(async move {
                svc.append_exchange_at("1.2.3.4", "s1", &format!("q{i}"), &format!("a{i}"), at(i))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let history = svc.get_history("1.2.3.4", "s1").await.unwrap();
        assert_eq!(history.len(), MAX_TURNS);
    }
}
