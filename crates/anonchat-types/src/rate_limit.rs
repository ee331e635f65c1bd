//! Rate-limit record and decision types.
//!
//! The limiter is a fixed-window counter: the window fully resets to a
//! fresh hour on the first request after expiry rather than decaying
//! continuously. The boundary burst this allows is intended behavior and
//! must be preserved for compatibility with existing clients.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Length of the accounting window in seconds.
pub const WINDOW_SECS: i64 = 3600;

/// Per-IP request counter over one accounting window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRecord {
    pub ip_address: String,
    pub request_count: u32,
    pub window_start: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RateLimitRecord {
    /// Record for the first request from an IP: a fresh window with one
    /// request consumed.
    pub fn first_request(ip_address: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            ip_address: ip_address.into(),
            request_count: 1,
            window_start: now,
            created_at: now,
        }
    }

    /// Whether the window anchored at `window_start` has elapsed.
    pub fn window_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.window_start >= Duration::seconds(WINDOW_SECS)
    }

    /// Reset to a fresh window with one request consumed.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.request_count = 1;
        self.window_start = now;
    }

    /// When the current window ends.
    pub fn reset_at(&self) -> DateTime<Utc> {
        self.window_start + Duration::seconds(WINDOW_SECS)
    }
}

/// Outcome of a check-and-consume call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
}

impl RateLimitDecision {
    pub fn allowed(remaining: u32) -> Self {
        Self {
            allowed: true,
            remaining,
        }
    }

    pub fn denied() -> Self {
        Self {
            allowed: false,
            remaining: 0,
        }
    }
}

/// Read-only projection of an IP's quota usage.
///
/// `seconds_until_reset` is clamped at zero for already-expired windows;
/// an IP with no record reports zero usage and no reset time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub requests_made: u32,
    pub reset_time: Option<DateTime<Utc>>,
    #[serde(rename = "time_until_reset")]
    pub seconds_until_reset: i64,
}

impl RateLimitStatus {
    /// Project a stored record (or its absence) into usage info.
    pub fn from_record(record: Option<&RateLimitRecord>, now: DateTime<Utc>) -> Self {
        match record {
            Some(record) => {
                let reset_at = record.reset_at();
                Self {
                    requests_made: record.request_count,
                    reset_time: Some(reset_at),
                    seconds_until_reset: (reset_at - now).num_seconds().max(0),
                }
            }
            None => Self {
                requests_made: 0,
                reset_time: None,
                seconds_until_reset: 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_first_request_consumes_one() {
        let record = RateLimitRecord::first_request("1.2.3.4", at(0));
        assert_eq!(record.request_count, 1);
        assert_eq!(record.window_start, at(0));
    }

    #[test]
    fn test_window_expiry_boundary() {
        let record = RateLimitRecord::first_request("1.2.3.4", at(0));
        assert!(!record.window_expired(at(WINDOW_SECS - 1)));
        assert!(record.window_expired(at(WINDOW_SECS)));
        assert!(record.window_expired(at(WINDOW_SECS + 1)));
    }

    #[test]
    fn test_reset_anchors_new_window() {
        let mut record = RateLimitRecord::first_request("1.2.3.4", at(0));
        record.request_count = 3;
        record.reset(at(4000));
        assert_eq!(record.request_count, 1);
        assert_eq!(record.window_start, at(4000));
        assert_eq!(record.reset_at(), at(4000 + WINDOW_SECS));
    }

    #[test]
    fn test_status_from_missing_record() {
        let status = RateLimitStatus::from_record(None, at(0));
        assert_eq!(status.requests_made, 0);
        assert!(status.reset_time.is_none());
        assert_eq!(status.seconds_until_reset, 0);
    }

    #[test]
    fn test_status_from_active_record() {
        let record = RateLimitRecord::first_request("1.2.3.4", at(0));
        let status = RateLimitStatus::from_record(Some(&record), at(600));
        assert_eq!(status.requests_made, 1);
        assert_eq!(status.reset_time, Some(at(WINDOW_SECS)));
        assert_eq!(status.seconds_until_reset, WINDOW_SECS - 600);
    }

    #[test]
    fn test_status_clamps_expired_window_to_zero() {
        let record = RateLimitRecord::first_request("1.2.3.4", at(0));
        let status = RateLimitStatus::from_record(Some(&record), at(WINDOW_SECS + 500));
        assert_eq!(status.seconds_until_reset, 0);
    }

    #[test]
    fn test_status_serde_renames_seconds_field() {
        let status = RateLimitStatus {
            requests_made: 2,
            reset_time: None,
            seconds_until_reset: 120,
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"time_until_reset\":120"));
    }
}
