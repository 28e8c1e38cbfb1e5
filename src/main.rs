//! Audited authorization gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!   client ──▶ http transport ──▶ admission ──▶ authz ──────────▶ handler ──▶ client
//!              (request id,       (token        (audit write,      (prompt stub
//!               source ip,         bucket)       then verify)       or upstream)
//!               received_at)          │               │
//!                                     ▼               ▼
//!                                    429      401 / 403 / 500
//!                                                     │
//!                                                 audit store
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use audit_gateway::config::loader::apply_env_overrides;
use audit_gateway::config::watcher::ConfigWatcher;
use audit_gateway::config::{load_config, GatewayConfig};
use audit_gateway::observability::{logging, metrics};
use audit_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "audit-gateway")]
#[command(about = "Authorization gateway that audits every request", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Watched for changes.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            let mut config = GatewayConfig::default();
            apply_env_overrides(&mut config, |key| std::env::var(key).ok());
            config
        }
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("audit-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        burst_capacity = config.admission.burst_capacity,
        sustained_rate = config.admission.sustained_rate,
        audit_backend = ?config.audit.backend,
        audit_table = %config.audit.table,
        verifier = ?config.authz.strategy,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // The watcher must stay alive for the life of the server.
    let (admission_updates, _watcher) = match &args.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path, config.clone());
            (rx, Some(watcher.run()?))
        }
        None => {
            let (_, rx) = mpsc::unbounded_channel();
            (rx, None)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_ctrl_c();

    let server = HttpServer::new(config).await?;
    server.run(listener, admission_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
