//! Kubernetes resource watcher.
//!
//! Drives `kube_runtime::Controller` over UptimeMonitor objects. Each event
//! goes through the finalizer helper: `Apply` runs a reconciliation pass and
//! persists its status, `Cleanup` removes the resource's monitors before the
//! object is allowed to go away.

use crate::backoff::BackoffTracker;
use crate::error::ControllerError;
use crate::metrics::Metrics;
use crate::reconciler::identity::ResourceIdentity;
use crate::reconciler::status::status_needs_update;
use crate::reconciler::Reconciler;
use crds::UptimeMonitor;
use futures::StreamExt;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use kube_runtime::controller::{Action, Config as RuntimeConfig};
use kube_runtime::finalizer::{finalizer, Event};
use kube_runtime::{watcher, Controller};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Finalizer guarding monitor cleanup.
pub const FINALIZER_NAME: &str = "uptime-operator.dev/cleanup";

/// Shared state handed to every reconciliation
pub struct Context {
    pub client: Client,
    pub reconciler: Reconciler,
    pub metrics: Arc<Metrics>,
    pub backoff: BackoffTracker,
    pub resync_interval: Duration,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("reconciler", &self.reconciler)
            .field("backoff", &self.backoff)
            .field("resync_interval", &self.resync_interval)
            .finish_non_exhaustive()
    }
}

/// Watch UptimeMonitor resources until the controller stream ends.
///
/// Events are debounced for 5 seconds and at most 3 objects reconcile at once.
pub async fn watch_uptime_monitors(
    api: Api<UptimeMonitor>,
    ctx: Arc<Context>,
) -> Result<(), ControllerError> {
    info!("Starting UptimeMonitor watcher");

    let runtime_config = RuntimeConfig::default()
        .debounce(Duration::from_secs(5))
        .concurrency(3);

    Controller::new(api, watcher::Config::default())
        .with_config(runtime_config)
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj, _)) => debug!("Reconciled UptimeMonitor {}", obj.name),
                Err(e) => error!("Controller error for UptimeMonitor: {}", e),
            }
        })
        .await;

    info!("UptimeMonitor watcher stopped");
    Ok(())
}

async fn reconcile(obj: Arc<UptimeMonitor>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());
    let api: Api<UptimeMonitor> = Api::namespaced(ctx.client.clone(), &namespace);
    let ctx = ctx.as_ref();
    let status_api = &api;

    finalizer(&api, FINALIZER_NAME, obj, |event| async move {
        match event {
            Event::Apply(obj) => apply(&obj, status_api, ctx).await,
            Event::Cleanup(obj) => cleanup(&obj, ctx).await,
        }
    })
    .await
    .map_err(|e| ControllerError::Finalizer(Box::new(e)))
}

/// Run a pass and persist the resulting status.
async fn apply(
    obj: &UptimeMonitor,
    api: &Api<UptimeMonitor>,
    ctx: &Context,
) -> Result<Action, ControllerError> {
    let identity = ResourceIdentity::from_object(obj)?;
    debug!("Reconciling UptimeMonitor {}", identity.key());

    let prior = obj.status.as_ref();
    let mut status = ctx.reconciler.reconcile(&identity, &obj.spec, prior).await;
    status.observed_generation = obj.metadata.generation;
    ctx.metrics.record_pass(&status);

    if status_needs_update(prior, &status) {
        let patch = serde_json::json!({ "status": status });
        api.patch_status(&identity.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        if let Some(ready) = status.ready_condition() {
            info!(
                "UptimeMonitor {} is {} ({}): {}",
                identity.key(),
                ready.reason,
                status.monitors.len(),
                ready.message
            );
        }
    } else {
        debug!("Status of UptimeMonitor {} unchanged, skipping patch", identity.key());
    }

    ctx.backoff.on_success(&identity.key());
    Ok(Action::requeue(ctx.resync_interval))
}

/// Remove the resource's monitors so the finalizer can be released.
async fn cleanup(obj: &UptimeMonitor, ctx: &Context) -> Result<Action, ControllerError> {
    let identity = ResourceIdentity::from_object(obj)?;
    info!("Deleting UptimeMonitor {}, removing its monitors", identity.key());

    let summary = ctx.reconciler.cleanup(&identity.uid).await?;
    info!(
        "Cleanup of UptimeMonitor {} finished: {} found, {} deleted, {} failed",
        identity.key(),
        summary.found,
        summary.deleted,
        summary.failed
    );
    ctx.metrics.record_cleanup();
    ctx.backoff.on_success(&identity.key());
    Ok(Action::await_change())
}

fn error_policy(obj: Arc<UptimeMonitor>, error: &ControllerError, ctx: Arc<Context>) -> Action {
    let key = format!(
        "{}/{}",
        obj.namespace().unwrap_or_else(|| "default".to_string()),
        obj.name_any()
    );
    let delay = ctx.backoff.on_error(&key);
    error!(
        "Reconciliation error for UptimeMonitor {}: {} (retrying in {}s)",
        key,
        error,
        delay.as_secs()
    );
    Action::requeue(delay)
}
