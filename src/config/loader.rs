//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{EdgeConfig, Mode};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {name}: {value:?}")]
    Env { name: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the effective configuration: defaults, then the optional TOML
/// file, then environment overrides. The result is validated.
pub fn load(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<EdgeConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => EdgeConfig::default(),
    };

    apply_env_overrides(&mut config, lookup)?;
    normalize(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Parse a TOML configuration file without applying overrides.
pub fn read_file(path: &Path) -> Result<EdgeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load using the process environment.
pub fn load_from_env(path: Option<&Path>) -> Result<EdgeConfig, ConfigError> {
    load(path, |key| std::env::var(key).ok())
}

/// Apply the service's environment variables on top of `config`.
///
/// Variables that are unset leave the current value alone. Runs before
/// logging is installed, so a bad value is an error rather than a warning.
pub fn apply_env_overrides(
    config: &mut EdgeConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(addr) = lookup("BIND_ADDRESS").filter(|v| !v.trim().is_empty()) {
        config.listener.bind_address = addr.trim().to_string();
    }
    if let Some(mode) = lookup("MODE") {
        config.mode = Mode::from_name(&mode);
    }

    if let Some(passkey) = lookup("APP_PASSKEY") {
        config.auth.passkey = passkey;
    }
    if let Some(secret) = lookup("SESSION_SECRET") {
        let secret = secret.trim();
        config.auth.session_secret = (!secret.is_empty()).then(|| secret.to_string());
    }
    if let Some(flag) = lookup("HTTPS_ONLY") {
        config.auth.https_only = is_truthy(&flag);
    }
    if let Some(max) = lookup("LOGIN_MAX_PER_MIN") {
        config.auth.login_max_per_minute = max.trim().parse().map_err(|_| ConfigError::Env {
            name: "LOGIN_MAX_PER_MIN",
            value: max.clone(),
        })?;
    }

    if let Some(base) = lookup("UPSTREAM_BASE") {
        config.upstream.api_base = base;
    }
    let api_key = lookup("OPENAI_API_KEY")
        .filter(|key| !key.is_empty())
        .or_else(|| lookup("VITE_OPENAI_API_KEY"));
    if let Some(key) = api_key {
        config.upstream.api_key = key.trim().to_string();
    }
    if let Some(base) = lookup("MOCK_API_UPSTREAM") {
        config.upstream.mock_base = base;
    }

    if let Some(origins) = lookup("CORS_ALLOW_ORIGINS") {
        config.cors.allow_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(flag) = lookup("CORS_ALLOW_CREDENTIALS") {
        config.cors.allow_credentials = is_truthy(&flag);
    }

    if let Some(file) = lookup("MODELS_FILE").filter(|v| !v.trim().is_empty()) {
        config.mock.models_file = Some(file.trim().to_string());
    }
    Ok(())
}

/// Strip trailing slashes from upstream bases so paths join cleanly.
fn normalize(config: &mut EdgeConfig) {
    let api_base = config.upstream.api_base.trim().trim_end_matches('/').to_string();
    config.upstream.api_base = api_base;
    let mock_base = config.upstream.mock_base.trim().trim_end_matches('/').to_string();
    config.upstream.mock_base = mock_base;
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
