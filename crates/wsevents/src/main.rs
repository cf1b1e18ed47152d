//! # wsevents
//!
//! Broadcast server binary: loads configuration, starts the hub and serves
//! `/ws` until Ctrl-C.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use wsevents_server::config::{ServerConfig, load_config};
use wsevents_server::handlers::HandlerRegistry;
use wsevents_server::metrics::install_recorder;
use wsevents_server::server::WseventsServer;

/// How long in-flight tasks get to finish after Ctrl-C.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// WebSocket event broadcast server.
#[derive(Parser, Debug)]
#[command(name = "wsevents", about = "WebSocket event broadcast server")]
struct Cli {
    /// Host to bind (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides config).
    #[arg(long)]
    port: Option<u16>,

    /// Path to a JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to serve static files from (overrides config).
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Default log level when `RUST_LOG` is unset (overrides config).
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Apply flags on top of the loaded config.
    fn apply(self, config: &mut ServerConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(dir) = self.static_dir {
            config.static_dir = Some(dir);
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    let mut config = load_config(cli.config.take().as_deref()).context("Failed to load config")?;
    cli.apply(&mut config);
    config.validate().context("Invalid config")?;

    wsevents_core::logging::init_subscriber(&config.log_level);

    let metrics = install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics recorder: {e}"))?;
    let server = WseventsServer::new(config, HandlerRegistry::new()).with_metrics(metrics);

    let (addr, serve) = server
        .listen()
        .await
        .context("Failed to bind server")?;
    tracing::info!("wsevents listening on ws://{addr}/ws");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    let _stopped = serve.shutdown_and_wait(SHUTDOWN_TIMEOUT).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
