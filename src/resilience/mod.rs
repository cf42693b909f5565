//! Resilience subsystem.
//!
//! The edge makes exactly one attempt per upstream call. Failures are
//! reported to the client at the boundary of the request that hit them;
//! nothing here retries or keeps state between requests.

pub mod timeouts;
