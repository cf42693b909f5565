//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (preflight / origin policy)
//!     → session.rs (verify signed session cookie)
//!     → rate_limit.rs (per-IP login attempt limit, login only)
//!     → passkey.rs (constant-time passkey check, login only)
//!     → headers.rs (strip hop-by-hop headers before proxying)
//! ```
//!
//! # Design Decisions
//! - Session state lives only in a signed cookie
//! - Unverifiable cookies are treated as absent, never as errors
//! - No trust in client-supplied upstream credentials

pub mod cors;
pub mod headers;
pub mod passkey;
pub mod rate_limit;
pub mod session;
