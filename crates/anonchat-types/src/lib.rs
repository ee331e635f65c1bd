//! Shared domain types for the anonchat relay service.
//!
//! This crate contains the core domain types used across the service:
//! conversation turns and sessions, rate-limit records, audit entries,
//! configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod audit;
pub mod chat;
pub mod config;
pub mod error;
pub mod rate_limit;
