//! CORS relay (v1)
//!
//! Lets browser code reach third-party APIs that do not send CORS headers,
//! without handing upstream credentials to the browser.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────────┐
//!                       │                      CORS RELAY                      │
//!                       │                                                      │
//!   Browser request     │  ┌────────┐   ┌────────┐   ┌─────────┐   ┌────────┐ │
//!   ────────────────────┼─▶│  cors  │──▶│  auth  │──▶│ target  │──▶│headers │ │
//!                       │  │ layer  │   │x-api-key│  │whitelist│   │x-target│ │
//!                       │  └────────┘   └────────┘   └─────────┘   └───┬────┘ │
//!                       │                                              │      │
//!                       │                                              ▼      │
//!   {status, data}      │  ┌────────┐                            ┌─────────┐  │
//!   ◀───────────────────┼──│envelope│◀───────────────────────────│forwarder│◀─┼── Upstream
//!                       │  └────────┘                            └─────────┘  │    API
//!                       └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use cors_relay::config::{load_with_env, validation::validate_config, ConfigError};
use cors_relay::lifecycle::start;
use cors_relay::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "cors-relay")]
#[command(about = "Authenticated CORS relay for whitelisted upstream APIs", long_about = None)]
struct Cli {
    /// TOML configuration file. API_KEY and ALLOWED_DOMAINS override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address, overriding the configuration.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_with_env(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    init_logging(&config.observability.log_level);
    tracing::info!("cors-relay v{} starting", env!("CARGO_PKG_VERSION"));

    start(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
