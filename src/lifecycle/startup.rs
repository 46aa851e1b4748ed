//! Startup orchestration.
//!
//! # Responsibilities
//! - Report the loaded configuration
//! - Initialize metrics, the relay pipeline, and the listener in order
//! - Serve until a shutdown signal arrives
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - A missing or empty API key is only a warning; the relay then rejects
//!   every call

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::RelayConfig;
use crate::forward::ForwardError;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::net::{load_tls_config, TlsError};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] ForwardError),

    #[error("invalid bind address '{0}'")]
    InvalidAddress(String),

    #[error("failed to bind listener: {0}")]
    Bind(#[source] std::io::Error),

    #[error("failed to load TLS material: {0}")]
    Tls(#[from] TlsError),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Start the relay and serve until shutdown.
pub async fn start(config: RelayConfig) -> Result<(), StartupError> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        allowed_hosts = config.targets.allowed_hosts.len(),
        upstream_timeout_secs = ?config.upstream.timeout_secs,
        request_timeout_secs = ?config.limits.request_timeout_secs,
        "Configuration loaded"
    );

    if config.auth.api_key.as_deref().map_or(true, str::is_empty) {
        tracing::warn!("No API key configured; every request will be rejected");
    }
    if config.targets.allowed_hosts.is_empty() {
        tracing::warn!("Allowed hosts list is empty; every target will be rejected");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let addr: SocketAddr = config
        .listener
        .bind_address
        .parse()
        .map_err(|_| StartupError::InvalidAddress(config.listener.bind_address.clone()))?;
    let tls = config.listener.tls.clone();

    let server = HttpServer::new(config)?;
    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    let watcher = shutdown.trigger_on_signal();

    let served = match tls {
        Some(tls) => {
            let rustls = load_tls_config(&tls).await?;
            server.run_tls(addr, rustls, stop).await
        }
        None => {
            let listener = TcpListener::bind(addr).await.map_err(StartupError::Bind)?;
            let local_addr = listener.local_addr().map_err(StartupError::Bind)?;
            tracing::info!(address = %local_addr, "Listening for connections");
            server.run(listener, stop).await
        }
    };

    watcher.abort();
    served.map_err(StartupError::Serve)
}
