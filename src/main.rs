//! Forwarding HTTP Proxy
//!
//! # Architecture Overview
//!
//! ```text
//!     Client                          FORWARD PROXY                         Origin
//!   ──────────▶ ┌──────────┐   ┌─────────────────────────────┐   ┌───────────┐ ──────────▶
//!   GET http:// │ listener │──▶│ handler: request line,      │──▶│ connector │  GET /path
//!   host/path   │ (bounded)│   │ method, target, headers     │   │ forwarder │  HTTP/1.0
//!               └──────────┘   └─────────────────────────────┘   └─────┬─────┘
//!   ◀──────────────────────────────── relay (headers, then raw bytes) ◀┘ ◀──────────
//! ```
//!
//! One task per accepted connection. Tasks share nothing but the read-only
//! configuration; a failure in one never reaches another or the accept loop.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use forward_proxy::config::{load_config, ProxyConfig};
use forward_proxy::lifecycle::{signals, Shutdown};
use forward_proxy::net::Listener;
use forward_proxy::observability::{logging, metrics};
use forward_proxy::ProxyServer;

#[derive(Parser)]
#[command(name = "forward-proxy", version)]
#[command(about = "Forwarding HTTP/1.0 proxy", long_about = None)]
struct Cli {
    /// Port to listen on
    port: u16,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn parse_cli() -> Cli {
    Cli::try_parse().unwrap_or_else(|e| {
        // Help and version go to stdout with status 0; everything else is a
        // usage error with status 1.
        let code = if e.use_stderr() { 1 } else { 0 };
        let _ = e.print();
        std::process::exit(code);
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = parse_cli();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    config.listener.port = cli.port;

    logging::init(&config.observability);

    tracing::info!("forward-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        max_connections = config.listener.max_connections,
        config_file = ?cli.config,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(&shutdown);

    ProxyServer::new(config).run(listener, shutdown).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
