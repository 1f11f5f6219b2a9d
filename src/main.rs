//! Lights HTTP control service.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────────┐
//!                          │                  LIGHTS-HTTP                      │
//!                          │                                                   │
//!   Client Request         │  ┌────────────┐   ┌──────┐   ┌─────────┐          │
//!   ───────────────────────┼─▶│correlation │──▶│ auth │──▶│ metrics │──┐       │
//!                          │  │ request id │   │ gate │   │in-flight│  │       │
//!                          │  └────────────┘   └──┬───┘   └─────────┘  │       │
//!                          │        ▲      reject │ 302                 ▼       │
//!                          │        │             ▼            ┌─────────────┐ │
//!   Client Response        │        │      fallback URL        │ fan-out     │─┼──▶ Devices
//!   ◀──────────────────────┼────────┴──────────────────────────│ / health    │ │
//!                          │                                   └─────────────┘ │
//!                          └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use lights_http::config::load_config;
use lights_http::health::ProcessStart;
use lights_http::lifecycle::{wait_for_signal, Shutdown};
use lights_http::observability::{logging::init_logging, PrometheusSink};
use lights_http::registry::SimulatedRegistry;
use lights_http::{AppState, HttpServer};

#[derive(Parser)]
#[command(name = "lights-http", version, about = "HTTP control surface for networked lights")]
struct Args {
    /// Optional TOML configuration file
    #[arg(short, long, env = "LIGHTS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let started = ProcessStart::now();
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "lights-http starting");
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        metrics_port = config.observability.metrics_port,
        device_delay_ms = config.fanout.device_delay_ms,
        devices = config.registry.devices.len(),
        "Configuration loaded"
    );

    let registry = Arc::new(SimulatedRegistry::new());
    for id in &config.registry.devices {
        registry.add_device(lights_http::registry::SimulatedDevice::new(id.clone()));
    }
    {
        let registry = registry.clone();
        tokio::spawn(async move { registry.start().await });
    }

    let state = AppState::new(&config, registry, Arc::new(PrometheusSink), started)?;

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let server = HttpServer::new(config, state);
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
