//! Bounded conversation history and the exchange audit log.

pub mod service;
pub mod store;

pub use service::{ConversationService, PurgeReport};
pub use store::{ConversationStore, ExchangeLog};
