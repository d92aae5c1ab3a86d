use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use port_scan_rs::config::{ScanSettings, ServerConfig};
use port_scan_rs::{server, JobRegistry};

/// port-scan-rs — async TCP port scan service with a polling JSON API and a tiny web UI.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "port-scan-rs",
    version,
    about = "Async TCP port scan service with a polling JSON API and a tiny web UI.",
    long_about = None
)]
struct Cli {
    /// Address the HTTP service listens on.
    #[arg(long, default_value = "0.0.0.0:5000")]
    bind: String,

    /// Directory with the static UI served at `/`.
    #[arg(long = "ui-dir", default_value = "ui")]
    ui_dir: PathBuf,

    /// Seconds a completed scan stays available for polling.
    #[arg(long = "retention-secs", default_value_t = 3600)]
    retention_secs: u64,

    /// Seconds between eviction sweeps.
    #[arg(long = "sweep-interval-secs", default_value_t = 60)]
    sweep_interval_secs: u64,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long = "log-level", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let config = ServerConfig {
        bind: cli.bind,
        ui_dir: cli.ui_dir,
        retention: Duration::from_secs(cli.retention_secs),
        sweep_interval: Duration::from_secs(cli.sweep_interval_secs.max(1)),
    };
    info!(
        bind = %config.bind,
        retention_secs = cli.retention_secs,
        sweep_interval_secs = config.sweep_interval.as_secs(),
        "port-scan-rs starting"
    );

    let registry = Arc::new(JobRegistry::new(ScanSettings::default()));
    let served = server::spawn_server(config, Arc::clone(&registry), async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown requested");
    })
    .await;

    // Stop runners even if the server failed.
    registry.shutdown().await;
    served
}
