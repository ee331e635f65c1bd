//! Conversation turn and session types.
//!
//! A session is the bounded working history used to give the AI call
//! conversational context. It is keyed by (client IP, session id) and
//! trimmed to the most recent [`MAX_TURNS`] entries after every write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Maximum number of turns kept in a session's working history
/// (10 user/assistant pairs).
pub const MAX_TURNS: usize = 20;

/// Role of a single turn in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// One message in a conversation, tagged with a role and a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            timestamp,
        }
    }

    pub fn assistant(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp,
        }
    }
}

/// A conversation session: the size-bounded transcript for one
/// (client IP, session id) pair.
///
/// Turns are insertion-ordered and always appended in user-then-assistant
/// pairs. The invariant `turns.len() <= MAX_TURNS` holds after every write;
/// older turns are dropped first when the bound is exceeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub ip_address: String,
    pub session_id: String,
    pub turns: Vec<Turn>,
    pub last_activity: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ConversationSession {
    /// Start an empty session for a key pair.
    pub fn new(ip_address: impl Into<String>, session_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            ip_address: ip_address.into(),
            session_id: session_id.into(),
            turns: Vec::new(),
            last_activity: now,
            created_at: now,
        }
    }

    /// Append one user/assistant exchange, both turns stamped with the same
    /// timestamp, then trim to the newest [`MAX_TURNS`] entries and bump
    /// `last_activity`.
    pub fn append_exchange(
        &mut self,
        user_message: impl Into<String>,
        assistant_response: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        self.turns.push(Turn::user(user_message, now));
        self.turns.push(Turn::assistant(assistant_response, now));

        if self.turns.len() > MAX_TURNS {
            let excess = self.turns.len() - MAX_TURNS;
            self.turns.drain(..excess);
        }

        self.last_activity = now;
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
    fn test_message_role_roundtrip() {
        for role in [MessageRole::User, MessageRole::Assistant] {
            let s = role.to_string();
            let parsed: MessageRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_message_role_serde() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        let parsed: MessageRole = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, MessageRole::Assistant);
    }

    #[test]
    fn test_append_exchange_orders_pairs() {
        let mut session = ConversationSession::new("1.2.3.4", "s1", at(0));
        session.append_exchange("hello", "hi there", at(1));

        assert_eq!(session.turns.len(), 2);
        assert_eq!(session.turns[0].role, MessageRole::User);
        assert_eq!(session.turns[0].content, "hello");
        assert_eq!(session.turns[1].role, MessageRole::Assistant);
        assert_eq!(session.turns[1].content, "hi there");
        assert_eq!(session.turns[0].timestamp, session.turns[1].timestamp);
        assert_eq!(session.last_activity, at(1));
    }

    #[test]
    fn test_append_exchange_trims_oldest_first() {
        let mut session = ConversationSession::new("1.2.3.4", "s1", at(0));
        for i in 0..11 {
            session.append_exchange(format!("u{i}"), format!("a{i}"), at(i));
        }

        // 11 exchanges = 22 turns; the oldest pair is dropped.
        assert_eq!(session.turns.len(), MAX_TURNS);
        assert_eq!(session.turns[0].content, "u1");
        assert_eq!(session.turns[MAX_TURNS - 1].content, "a10");
        assert_eq!(session.turns[MAX_TURNS - 1].role, MessageRole::Assistant);
    }

    #[test]
    fn test_append_exchange_under_bound_keeps_everything() {
        let mut session = ConversationSession::new("1.2.3.4", "s1", at(0));
        for i in 0..10 {
            session.append_exchange(format!("u{i}"), format!("a{i}"), at(i));
        }

        assert_eq!(session.turns.len(), MAX_TURNS);
        assert_eq!(session.turns[0].content, "u0");
    }

    #[test]
    fn test_turn_serde_roundtrip() {
        let turn = Turn::user("what is freedom?", at(5));
        let json = serde_json::to_string(&turn).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        let parsed: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, turn);
    }
}
