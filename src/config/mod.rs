//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, then environment overrides)
//!     → validation.rs (semantic checks)
//!     → EdgeConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Environment variables keep the names operators already use
//!   (`APP_PASSKEY`, `MOCK_API_UPSTREAM`, ...)
//! - An empty passkey disables authentication. This is fail-open on
//!   purpose and is logged loudly at start-up.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load, load_from_env, read_file, ConfigError};
pub use schema::{
    AuthConfig, CorsConfig, EdgeConfig, ListenerConfig, LogFormat, MockConfig, Mode,
    ObservabilityConfig, UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
