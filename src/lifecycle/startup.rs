//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the metrics exporter when enabled
//! - Build the server state and bind the listener
//! - Run until a termination signal, then drain
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener binds last (traffic only when ready)
//! - Draining is bounded: open streams are cut after `SHUTDOWN_GRACE`

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::EdgeConfig;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::wait_for_signal;
use crate::observability::metrics::init_metrics;

/// How long open connections may keep the process alive after shutdown.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid metrics address {0}")]
    MetricsAddress(String),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("server error: {0}")]
    Server(#[from] io::Error),

    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Bind the configured listen address.
pub async fn bind(config: &EdgeConfig) -> Result<TcpListener, StartupError> {
    let address = config.listener.bind_address.clone();
    TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })
}

/// Start every subsystem and serve until SIGINT/SIGTERM.
pub async fn run(config: EdgeConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        init_metrics(addr);
    }

    let server = HttpServer::new(config)?;
    let listener = bind(&server.state().config).await?;

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    match wait_for_signal().await {
        Ok(name) => tracing::info!(signal = name, "Termination signal received"),
        Err(e) => tracing::error!(error = %e, "Signal handling failed, shutting down"),
    }
    shutdown.trigger();

    drain(handle, SHUTDOWN_GRACE).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for the server task to finish draining, aborting it after `grace`.
async fn drain(
    mut handle: JoinHandle<io::Result<()>>,
    grace: Duration,
) -> Result<(), StartupError> {
    match tokio::time::timeout(grace, &mut handle).await {
        Ok(joined) => Ok(joined??),
        Err(_) => {
            tracing::warn!(
                grace_secs = grace.as_secs_f64(),
                "Connections still open after grace period, closing them"
            );
            handle.abort();
            Ok(())
        }
    }
}
