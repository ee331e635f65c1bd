//! Exchange audit log entry type.
//!
//! The audit log is the append-only, untrimmed record of every exchange,
//! distinct from the trimmed working history used for AI context. Entries
//! are never updated; they leave the table only through the retention purge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One raw user/assistant exchange as it happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRecord {
    pub id: Uuid,
    pub ip_address: String,
    pub session_id: String,
    pub message: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

impl ExchangeRecord {
    pub fn new(
        ip_address: impl Into<String>,
        session_id: impl Into<String>,
        message: impl Into<String>,
        response: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            ip_address: ip_address.into(),
            session_id: session_id.into(),
            message: message.into(),
            response: response.into(),
            created_at: now,
        }
    }
}
