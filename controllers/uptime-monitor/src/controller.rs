//! Main controller implementation.
//!
//! Wires the Kubernetes client, the Uptime Kuma client, the reconciler and
//! the probe server together, then runs the watcher and the server side by
//! side until either stops.

use crate::backoff::BackoffTracker;
use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::metrics::Metrics;
use crate::probes::{self, ProbeState};
use crate::reconciler::Reconciler;
use crate::watcher::{self, Context};
use crds::UptimeMonitor;
use kube::{Api, Client};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uptime_kuma_client::{UptimeKumaClient, UptimeKumaClientTrait};

/// Main controller for UptimeMonitor resources.
#[derive(Debug)]
pub struct Controller {
    monitor_watcher: JoinHandle<Result<(), ControllerError>>,
    probe_server: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance and starts its background tasks.
    pub async fn new(config: &ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing UptimeMonitor Controller");

        let kube_client = Client::try_default().await?;

        let uptime_kuma_client = UptimeKumaClient::new(
            config.uptime_kuma_url.clone(),
            config.uptime_kuma_token.clone(),
        )?;

        // Unreachable is reported per resource, so only warn here
        match uptime_kuma_client.health_check().await {
            Ok(()) => info!("Uptime Kuma reachable at {}", uptime_kuma_client.base_url()),
            Err(e) => warn!(
                "Uptime Kuma at {} is not reachable yet: {}",
                uptime_kuma_client.base_url(),
                e
            ),
        }

        let api: Api<UptimeMonitor> = match &config.watch_namespace {
            Some(ns) => Api::namespaced(kube_client.clone(), ns),
            None => Api::all(kube_client.clone()),
        };

        let metrics = Arc::new(Metrics::new().map_err(|e| ControllerError::Probe(e.to_string()))?);
        let probe_state = ProbeState::new(Arc::clone(&metrics));

        let reconciler = Reconciler::new(
            uptime_kuma_client,
            config.cluster_tag().map(str::to_string),
            config.monitor,
        );
        let ctx = Arc::new(Context {
            client: kube_client,
            reconciler,
            metrics,
            backoff: BackoffTracker::default(),
            resync_interval: config.resync_interval,
        });

        let probe_server = tokio::spawn(probes::serve(config.probe_addr, probe_state.clone()));
        let monitor_watcher = tokio::spawn(watcher::watch_uptime_monitors(api, ctx));
        probe_state.mark_ready();

        Ok(Self {
            monitor_watcher,
            probe_server,
        })
    }

    /// Runs the controller until shutdown.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("UptimeMonitor Controller running");

        tokio::select! {
            result = &mut self.monitor_watcher => {
                result.map_err(|e| {
                    ControllerError::Watch(format!("UptimeMonitor watcher panicked: {e}"))
                })??;
            }
            result = &mut self.probe_server => {
                result.map_err(|e| ControllerError::Probe(format!("Probe server panicked: {e}")))??;
            }
        }

        self.monitor_watcher.abort();
        self.probe_server.abort();
        Ok(())
    }
}
