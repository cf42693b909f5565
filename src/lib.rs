//! Authenticated edge service for a browser front-end that talks to a
//! model API.
//!
//! The edge guards everything behind a shared passkey and a signed session
//! cookie, relays `/proxy/*` to a configurable mock upstream, and either
//! serves canned `/v1` answers (mock mode) or relays `/v1/*` to the real API
//! with a server-held bearer token (proxy mode).

pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod mock;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::schema::EdgeConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
