//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check addresses and upstream URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::schema::EdgeConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address {0:?}")]
    BindAddress(String),

    #[error("{field} must be an absolute http(s) URL, got {value:?}")]
    UpstreamUrl { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("invalid CORS origin {0:?}")]
    CorsOrigin(String),

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),
}

/// Validate a loaded configuration, collecting every problem.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    for (field, value) in [
        ("upstream.api_base", &config.upstream.api_base),
        ("upstream.mock_base", &config.upstream.mock_base),
    ] {
        if !value.is_empty() && !is_http_url(value) {
            errors.push(ValidationError::UpstreamUrl {
                field,
                value: value.clone(),
            });
        }
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::Zero("upstream.timeout_secs"));
    }
    if config.auth.login_max_per_minute == 0 {
        errors.push(ValidationError::Zero("auth.login_max_per_minute"));
    }
    if config.auth.session_max_age_secs == 0 {
        errors.push(ValidationError::Zero("auth.session_max_age_secs"));
    }
    if config.mock.max_lines == 0 {
        errors.push(ValidationError::Zero("mock.max_lines"));
    }

    for origin in &config.cors.allow_origins {
        if origin == "*" || HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::CorsOrigin(origin.clone()));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}
