//! Reachability monitor (v1)
//!
//! Polls HTTP and WebSocket targets and alerts on sustained state changes.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                          MONITOR                             │
//!   │                                                              │
//!   │  ┌───────────┐   ┌──────────────┐   ┌─────────────────────┐  │
//!   │  │ directory │──▶│ health       │──▶│ probe (http / ws)   │──┼──▶ Targets
//!   │  │ snapshot  │   │ active tick  │   │ under deadline      │  │
//!   │  └───────────┘   └──────┬───────┘   └─────────────────────┘  │
//!   │                         │ results                            │
//!   │                         ▼                                    │
//!   │                  ┌──────────────┐   ┌─────────────────────┐  │
//!   │                  │ health store │──▶│ notify (log/slack)  │──┼──▶ Alerts
//!   │                  │ hysteresis   │   └─────────────────────┘  │
//!   │                  └──────┬───────┘                            │
//!   │                         ▼                                    │
//!   │                  ┌──────────────┐                            │
//!   │                  │ admin API    │◀───────────────────────────┼─── Operators
//!   │                  └──────────────┘                            │
//!   └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use health_check::config::{load_config, MonitorConfig};
use health_check::lifecycle::{signals, startup};
use health_check::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "health-check")]
#[command(about = "Reachability monitor for HTTP and WebSocket targets", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => MonitorConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "health-check starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let running = startup::start(&config).await?;

    signals::wait_for_shutdown_signal().await;
    running.stop().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
