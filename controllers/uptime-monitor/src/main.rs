//! UptimeMonitor Controller
//!
//! Keeps Uptime Kuma monitors in line with UptimeMonitor resources: every
//! declared endpoint gets an HTTP monitor named `namespace/resource/endpoint`,
//! tagged with the cluster name, its tags and the resource's `crd_uid`.

mod backoff;
mod config;
mod controller;
mod error;
mod metrics;
mod probes;
mod reconciler;
#[cfg(test)]
mod test_utils;
mod watcher;

use crate::config::ControllerConfig;
use crate::controller::Controller;
use crate::error::ControllerError;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    if let Err(e) = rustls::crypto::ring::default_provider().install_default() {
        return Err(ControllerError::InvalidConfig(format!(
            "failed to install rustls crypto provider: {e:?}"
        )));
    }

    let config = ControllerConfig::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!("Starting UptimeMonitor Controller");
    info!("Configuration:");
    info!("  Uptime Kuma URL: {}", config.uptime_kuma_url);
    info!("  API token: {}", if config.uptime_kuma_token.is_some() { "set" } else { "not set" });
    info!("  Cluster tag: {}", config.cluster_tag().unwrap_or("(none)"));
    info!("  Namespace: {}", config.watch_namespace.as_deref().unwrap_or("all namespaces"));
    info!(
        "  Monitor interval: {}s, retry interval: {}s, max retries: {}",
        config.monitor.interval, config.monitor.retry_interval, config.monitor.max_retries
    );
    info!("  Resync interval: {}s", config.resync_interval.as_secs());
    info!("  Probe address: {}", config.probe_addr);

    let controller = Controller::new(&config).await?;
    controller.run().await?;

    Ok(())
}
