//! Local error responses.
//!
//! # Responsibilities
//! - Map local failures to HTTP status codes
//! - Render every local failure as `{"error": "..."}`
//!
//! # Design Decisions
//! - Upstream non-2xx responses are not errors: they are relayed unchanged
//! - Connection-level upstream failures become 502, timeouts 504
//! - Upstream error details are logged, never echoed to the client

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Request-level failures produced by the edge itself.
#[derive(Debug, Error)]
pub enum EdgeError {
    /// A required upstream or secret is missing from the configuration.
    #[error("{0} is not set")]
    NotConfigured(&'static str),

    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid passkey")]
    InvalidPasskey,

    #[error("too many attempts, try again later")]
    RateLimited,

    #[error("{0}")]
    BadRequest(&'static str),

    #[error("request body too large")]
    PayloadTooLarge,

    /// `GET /v1/models` could not read or parse its models file.
    #[error("models file unavailable")]
    ModelsFile,

    #[error("upstream request timed out")]
    UpstreamTimeout,

    #[error("upstream request failed")]
    Upstream(#[from] reqwest::Error),

    #[error("invalid upstream url")]
    InvalidUpstreamUrl(#[from] url::ParseError),
}

impl EdgeError {
    pub fn status(&self) -> StatusCode {
        match self {
            EdgeError::NotConfigured(_)
            | EdgeError::InvalidUpstreamUrl(_)
            | EdgeError::ModelsFile => StatusCode::INTERNAL_SERVER_ERROR,
            EdgeError::Unauthorized | EdgeError::InvalidPasskey => StatusCode::UNAUTHORIZED,
            EdgeError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            EdgeError::BadRequest(_) => StatusCode::BAD_REQUEST,
            EdgeError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            EdgeError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            EdgeError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        if let EdgeError::Upstream(ref source) = self {
            tracing::warn!(error = %source, "Upstream request failed");
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// `200 {"ok": true}`.
pub fn ok_json() -> Response {
    Json(json!({ "ok": true })).into_response()
}
