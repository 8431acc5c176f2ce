//! pox-monitor: poll a Stacks node and print consensus transitions.
//!
//! Usage:
//!
//!   pox-monitor --node-url http://127.0.0.1:20443 --api-url http://127.0.0.1:3999
//!
//! Every flag also reads an environment variable (`MONITOR_INTERVAL`, `EXIT_FROM_MONITOR`,
//! `EPOCH_30_START`, ...); see `--help`. SIGINT and SIGTERM exit immediately with status 0.

use anyhow::Context;
use clap::Parser;
use pox_monitor::{Monitor, MonitorConfig, MonitorError, Reporter, StacksClient};
use tracing_subscriber::EnvFilter;

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(reason = %e, "SIGTERM handler unavailable");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let config = MonitorConfig::parse();

    let client = StacksClient::new(&config.node_url, &config.api_url, config.request_timeout())
        .context("build HTTP client")?;
    let reporter = Reporter::stdout(config.output);
    let mut monitor = Monitor::new(config, client, reporter).context("invalid configuration")?;

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(async {
        tokio::select! {
            res = monitor.run() => res,
            _ = shutdown_signal() => {
                tracing::info!("shutdown signal received");
                Ok(())
            }
        }
    });

    match result {
        Ok(()) => std::process::exit(0),
        Err(MonitorError::Fatal(_)) => std::process::exit(1),
        Err(e) => Err(e).context("monitor stopped"),
    }
}
