//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound every upstream call by a single deadline
//! - Buffered responses: the deadline covers connect + full transfer
//! - Streamed responses: the deadline covers connect + response head only
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other upstream errors
//! - Timed-out requests return 504 Gateway Timeout
//! - No retries: a failed upstream call is reported to the caller as-is

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::http::response::EdgeError;

/// Default budget for one upstream call.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// Run an upstream future, failing with `UpstreamTimeout` once `deadline`
/// has passed.
pub async fn before_deadline<T, F>(deadline: Instant, fut: F) -> Result<T, EdgeError>
where
    F: Future<Output = Result<T, reqwest::Error>>,
{
    match tokio::time::timeout_at(deadline, fut).await {
        Ok(result) => result.map_err(|err| {
            if err.is_timeout() {
                EdgeError::UpstreamTimeout
            } else {
                EdgeError::Upstream(err)
            }
        }),
        Err(_) => Err(EdgeError::UpstreamTimeout),
    }
}
