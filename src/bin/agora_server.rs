//! Runs the Agora agent-to-agent server.
//!
//! Usage:
//!
//! ```text
//! agora-server [--config <path>]
//! ```
//!
//! Without `--config` the file named by `A2A_CONFIG_PATH` is used, then
//! `agora.toml` in the working directory, then built-in defaults.

use agora::config::{ConfigError, LoggingSection, ServerConfig};
use agora::server::{BoundServer, ServerContext, TransportError};
use agora::telemetry::{self, TelemetryError};
use camino::Utf8PathBuf;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "agora-server", version, about = "Agent-to-agent JSON-RPC routing server")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<Utf8PathBuf>,
}

/// Fatal startup and runtime failures.
#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

async fn shutdown_requested() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("interrupt received"),
        Err(err) => {
            tracing::warn!(error = %err, "cannot listen for interrupts; stop the process externally");
            std::future::pending::<()>().await;
        }
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let (config, source) = match ServerConfig::load(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(err) => {
            let _fallback_logging = telemetry::init(&LoggingSection::default());
            return Err(err.into());
        }
    };
    telemetry::init(&config.logging)?;
    tracing::info!(source = ?source, "configuration loaded");

    let context = Arc::new(ServerContext::from_config(config)?);
    let server = BoundServer::bind(context).await?;
    tracing::info!(
        agents = %server.agent_addr()?,
        health = %server.health_addr()?,
        "listeners bound"
    );
    server.run(shutdown_requested()).await?;
    tracing::info!("server stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "server failed");
            ExitCode::FAILURE
        }
    }
}
