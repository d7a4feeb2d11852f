//! Bolt Gateway
//!
//! Exposes a graph database over a small HTTP/JSON surface.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────────┐
//!                         │                     GATEWAY                          │
//!                         │                                                      │
//!     Client Request      │  ┌──────────┐   ┌──────────┐   ┌─────────────────┐   │
//!     ────────────────────┼─▶│ security │──▶│   http   │──▶│ driver (trait)  │───┼──▶ Bolt server
//!                         │  │ origin + │   │ query /  │   │  bolt client +  │   │
//!                         │  │ limits   │   │ debug    │   │  pool           │   │
//!                         │  └──────────┘   └────┬─────┘   └─────────────────┘   │
//!                         │                      │                               │
//!     Client Response     │  ┌──────────┐        │         ┌─────────────────┐   │
//!     ◀───────────────────┼──│serializer│◀───────┴────────▶│     probes      │───┼──▶ TCP / TLS
//!                         │  └──────────┘                  └─────────────────┘   │
//!                         │                                                      │
//!                         │  config · lifecycle · observability                  │
//!                         └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use bolt_gateway::http::HttpServer;
use bolt_gateway::lifecycle::{signals, startup, Shutdown};
use bolt_gateway::observability;

#[derive(Parser)]
#[command(name = "bolt-gateway", version, about = "HTTP gateway for a Bolt graph database")]
struct Args {
    /// TOML configuration file. Environment variables override it.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = startup::resolve_config(args.config.as_deref())?;
    observability::logging::init(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "bolt-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        database = %config.database.database,
        allowed_origins = config.cors.allowed_origins.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );
    startup::check_credentials(&config.database);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let client = startup::build_client(&config.database)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config, client)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
