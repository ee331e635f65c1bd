//! Fixed-window rate limiter service.
//!
//! Wraps a [`RateLimitStore`] with the check-and-consume decision logic.
//! Every logical operation round-trips through the store; the service
//! holds no counter state of its own. Read-modify-write sequences are
//! serialized per IP through a keyed async mutex, so concurrent checks
//! for the same IP can never double-increment while checks for different
//! IPs proceed independently.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use anonchat_types::error::StorageError;
use anonchat_types::rate_limit::{RateLimitDecision, RateLimitRecord, RateLimitStatus};

use super::store::RateLimitStore;

/// Per-IP fixed-window request limiter.
///
/// The window anchors at the timestamp of the first request after the
/// previous window expired; it does not slide. Denials are side-effect-free.
pub struct RateLimiter<S: RateLimitStore> {
    store: S,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<S: RateLimitStore> RateLimiter<S> {
    /// Create a new limiter backed by the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn key_lock(&self, ip_address: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(ip_address.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Check whether a request from `ip_address` is allowed and, if so,
    /// consume one unit of quota.
    pub async fn check_and_consume(
        &self,
        ip_address: &str,
        limit: u32,
    ) -> Result<RateLimitDecision, StorageError> {
        self.check_and_consume_at(ip_address, limit, Utc::now()).await
    }

    /// Clock-injected variant of [`Self::check_and_consume`].
    pub async fn check_and_consume_at(
        &self,
        ip_address: &str,
        limit: u32,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, StorageError> {
        let lock = self.key_lock(ip_address);
        let _guard = lock.lock().await;

        let decision = match self.store.get(ip_address).await? {
            None => {
                let record = RateLimitRecord::first_request(ip_address, now);
                self.store.put(&record).await?;
                RateLimitDecision::allowed(limit.saturating_sub(1))
            }
            Some(mut record) => {
                if record.window_expired(now) {
                    record.reset(now);
                    self.store.put(&record).await?;
                    RateLimitDecision::allowed(limit.saturating_sub(1))
                } else if record.request_count >= limit {
                    // Denial must not mutate the record.
                    RateLimitDecision::denied()
                } else {
                    record.request_count += 1;
                    self.store.put(&record).await?;
                    RateLimitDecision::allowed(limit.saturating_sub(record.request_count))
                }
            }
        };

        debug!(
            ip = %ip_address,
            allowed = decision.allowed,
            remaining = decision.remaining,
            "rate limit check"
        );

        Ok(decision)
    }

    /// Read-only quota projection for an IP. Never mutates state.
    pub async fn info(&self, ip_address: &str) -> Result<RateLimitStatus, StorageError> {
        self.info_at(ip_address, Utc::now()).await
    }

    /// Clock-injected variant of [`Self::info`].
    pub async fn info_at(
        &self,
        ip_address: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLimitStatus, StorageError> {
        let record = self.store.get(ip_address).await?;
        Ok(RateLimitStatus::from_record(record.as_ref(), now))
    }

    /// Delete every rate-limit record, giving all clients a fresh quota.
    ///
    /// Run at startup so a server restart resets everyone -- an operational
    /// policy, not an accident.
    pub async fn reset_all(&self) -> Result<u64, StorageError> {
        self.store.clear_all().await
    }
}
