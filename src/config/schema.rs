//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::resilience::timeouts::UPSTREAM_TIMEOUT;

/// Root configuration for the edge service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Whether `/v1` is served by the mock responder or proxied upstream.
    pub mode: Mode,

    /// Passkey login and session cookie settings.
    pub auth: AuthConfig,

    /// Upstream targets for `/v1` and `/proxy`.
    pub upstream: UpstreamConfig,

    /// Cross-origin settings.
    pub cors: CorsConfig,

    /// Mock responder settings.
    pub mock: MockConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5174").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5174".to_string(),
        }
    }
}

/// Serving mode for the `/v1` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Canned completions from the local mock responder.
    #[default]
    Mock,
    /// Forward `/v1/*` to the API-compatible upstream.
    Proxy,
}

impl Mode {
    /// Parse a mode name the way the `MODE` variable is read: anything that
    /// is not `proxy` (case-insensitive) means mock.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("proxy") {
            Mode::Proxy
        } else {
            Mode::Mock
        }
    }
}

/// Passkey authentication configuration.
///
/// WARNING: an empty `passkey` disables authentication entirely. Every
/// protected route is then reachable without logging in.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared passkey. Empty = auth disabled (fail-open).
    pub passkey: String,

    /// Cookie signing secret. Falls back to the passkey when unset.
    pub session_secret: Option<String>,

    /// Mark the session cookie `Secure`.
    pub https_only: bool,

    /// Login attempts allowed per client IP per 60 second window.
    pub login_max_per_minute: u32,

    /// Session cookie lifetime in seconds.
    pub session_max_age_secs: u64,
}

impl AuthConfig {
    /// Whether a passkey is configured.
    pub fn enabled(&self) -> bool {
        !self.passkey.is_empty()
    }

    /// The secret used to sign session cookies.
    pub fn signing_secret(&self) -> &str {
        match self.session_secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret,
            _ => &self.passkey,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            passkey: String::new(),
            session_secret: None,
            https_only: false,
            login_max_per_minute: 12,
            session_max_age_secs: 14 * 24 * 60 * 60,
        }
    }
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the API-compatible upstream (proxy mode).
    pub api_base: String,

    /// Bearer credential injected into `/v1` requests. Empty = none.
    pub api_key: String,

    /// Base URL for `/proxy`. Empty = unconfigured.
    pub mock_base: String,

    /// Upstream request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com".to_string(),
            api_key: String::new(),
            mock_base: String::new(),
            timeout_secs: UPSTREAM_TIMEOUT.as_secs(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. Empty = any origin.
    pub allow_origins: Vec<String>,

    /// Allow credentials (only applied with an explicit origin list).
    pub allow_credentials: bool,
}

/// Mock responder configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MockConfig {
    /// JSON file returned by `GET /v1/models`.
    pub models_file: Option<String>,

    /// Upper bound on the `d<N>` delay directive.
    pub max_delay_secs: u64,

    /// Upper bound on the `l<N>` line directive.
    pub max_lines: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            models_file: None,
            max_delay_secs: 120,
            max_lines: 1000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
