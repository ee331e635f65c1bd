//! Custom axum extractors.

pub mod client_ip;
