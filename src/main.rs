//! api2web edge
//!
//! Serves a browser front-end behind a passkey login and relays its model
//! API calls, either to a mock upstream or to the real API.
//!
//! Configuration comes from an optional TOML file overlaid with the
//! environment (`APP_PASSKEY`, `SESSION_SECRET`, `MODE`, `UPSTREAM_BASE`,
//! `OPENAI_API_KEY`, `MOCK_API_UPSTREAM`, ...).

use std::path::PathBuf;

use clap::Parser;

use api2web_edge::config;
use api2web_edge::lifecycle;
use api2web_edge::observability::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "api2web-edge", version, about = "Passkey-guarded edge for model API front-ends")]
struct Cli {
    /// Optional TOML configuration file
    #[arg(short, long, env = "EDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = config::load_from_env(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        config::validate_config(&config).map_err(config::ConfigError::Validation)?;
    }

    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        mode = ?config.mode,
        upstream_timeout_secs = config.upstream.timeout_secs,
        "Configuration loaded"
    );

    lifecycle::run(config).await?;
    Ok(())
}
