//! Route host
//!
//! Serves JSON APIs discovered from a directory of route manifests.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────────┐
//!                          │                    ROUTE HOST                    │
//!                          │                                                  │
//!  startup                 │  ┌──────────┐   ┌──────────┐   ┌─────────────┐   │
//!  routes/ ────────────────┼─▶│  loader  │──▶│ registry │──▶│ axum Router │   │
//!                          │  └──────────┘   └────┬─────┘   └──────┬──────┘   │
//!                          │                      │                │          │
//!  request                 │                      ▼                ▼          │
//!  ────────────────────────┼──▶ request id ─▶ introspection   dispatch        │
//!                          │                 (docs/status/   (deadline,       │
//!                          │                  health/stats)   errors)         │
//!                          │                      │                │          │
//!  response                │                      ▼                ▼          │
//!  ◀───────────────────────┼────────────────── envelope ◀──────────┘          │
//!                          └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use route_host::config::load_config;
use route_host::observability::{logging, metrics};
use route_host::{bootstrap, HandlerCatalog, Shutdown};

#[derive(Parser)]
#[command(name = "route-host")]
#[command(about = "Serve JSON APIs discovered from a routes directory", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    logging::init_logging(&config);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "route-host starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        prefix = %config.api.prefix,
        routes_dir = %config.api.routes_dir,
        environment = ?config.environment,
        handler_timeout_ms = config.api.handler_timeout_ms,
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = bootstrap(config, &HandlerCatalog::with_builtins());

    let shutdown = Shutdown::new();
    server.run(listener, shutdown.subscribe()).await?;
    shutdown.trigger();

    tracing::info!("Shutdown complete");
    Ok(())
}
