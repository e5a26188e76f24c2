//! Reconciliation of UptimeMonitor resources against Uptime Kuma.
//!
//! One pass re-derives everything from the declared spec and a fresh listing
//! of the monitors carrying the resource's `crd_uid:<uid>` tag:
//! - `validation`: turn the spec into a `DesiredState`
//! - `identity`: monitor names and expected tag sets
//! - `index`: the owned monitors, by name
//! - `sync`: create / update / no-op per endpoint, then sweep the rest
//! - `status`: the Ready condition and the persisted status
//!
//! A pass never returns an error. Every failure ends up in the status.

pub mod identity;
pub mod index;
pub mod status;
pub mod sync;
pub mod validation;

#[cfg(test)]
mod reconcile_test;

use chrono::{DateTime, Utc};
use crds::{Condition, MonitorStatus, UptimeMonitorSpec, UptimeMonitorStatus};
use identity::{endpoint_tags, expected_tags, ResourceIdentity};
use index::MonitorIndex;
use sync::SyncEngine;
use tracing::{error, info, warn};
use uptime_kuma_client::{MonitorSettings, UptimeKumaClientTrait, UptimeKumaError};

/// Outcome of tearing down the monitors of one resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub found: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Reconciles UptimeMonitor resources.
pub struct Reconciler {
    pub(crate) uptime_kuma_client: Box<dyn UptimeKumaClientTrait + Send + Sync>,
    cluster_tag: Option<String>,
    settings: MonitorSettings,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("uptime_kuma_url", &self.uptime_kuma_client.base_url())
            .field("cluster_tag", &self.cluster_tag)
            .field("settings", &self.settings)
            .finish()
    }
}

impl Reconciler {
    /// Creates a new reconciler.
    ///
    /// `cluster_tag` is added to every monitor unless it is blank.
    pub fn new(
        uptime_kuma_client: impl UptimeKumaClientTrait + Send + Sync + 'static,
        cluster_tag: Option<String>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            uptime_kuma_client: Box::new(uptime_kuma_client),
            cluster_tag: cluster_tag.filter(|t| !t.trim().is_empty()),
            settings,
        }
    }

    fn client(&self) -> &dyn UptimeKumaClientTrait {
        self.uptime_kuma_client.as_ref()
    }

    /// Run one pass and return the status to persist.
    pub async fn reconcile(
        &self,
        identity: &ResourceIdentity,
        spec: &UptimeMonitorSpec,
        prior: Option<&UptimeMonitorStatus>,
    ) -> UptimeMonitorStatus {
        let now = Utc::now();
        let (ready, monitors) = self.run_pass(identity, spec, now).await;
        status::assemble(prior, ready, monitors, now)
    }

    async fn run_pass(
        &self,
        identity: &ResourceIdentity,
        spec: &UptimeMonitorSpec,
        now: DateTime<Utc>,
    ) -> (Condition, Vec<MonitorStatus>) {
        let desired = match validation::validate(spec) {
            Ok(desired) => desired,
            Err(e) => {
                error!("Invalid spec for UptimeMonitor {}: {}", identity.key(), e);
                return (
                    status::reconciliation_error(format!("Invalid spec: {e}"), now),
                    Vec::new(),
                );
            }
        };

        if let Err(e) = self.client().health_check().await {
            error!("Uptime Kuma connection failed while reconciling {}: {}", identity.key(), e);
            return (
                status::reconciliation_error(format!("Uptime Kuma connection failed: {e}"), now),
                Vec::new(),
            );
        }

        if !desired.enabled {
            info!("UptimeMonitor {} is disabled, removing all monitors", identity.key());
            if let Err(e) = self.cleanup(&identity.uid).await {
                warn!(
                    "Could not list monitors of disabled UptimeMonitor {}: {}",
                    identity.key(),
                    e
                );
            }
            return (status::disabled(now), Vec::new());
        }

        let mut index = MonitorIndex::fetch_or_empty(self.client(), &identity.uid).await;
        let mut engine = SyncEngine::new(self.client(), &self.settings);
        let mut monitors = Vec::with_capacity(desired.endpoints.len());

        for endpoint in &desired.endpoints {
            let name = identity.monitor_name(&endpoint.name);
            let resolved = endpoint_tags(
                endpoint.tag_override.as_deref(),
                desired.default_tags.as_deref(),
            );
            let expected = expected_tags(self.cluster_tag.as_deref(), &resolved, &identity.uid);
            let existing = index.take(&name);

            let outcome = engine.sync(&name, &endpoint.url, &expected, existing.as_ref()).await;
            monitors.push(MonitorStatus {
                name: endpoint.name.clone(),
                url: endpoint.url.clone(),
                uptime_kuma_id: outcome.id,
                status: outcome.state,
                last_sync: now,
            });
        }

        if !index.is_empty() {
            let total = index.len();
            let deleted = engine.sweep(index.into_unclaimed()).await;
            info!("Removed {}/{} undeclared monitor(s) of {}", deleted, total, identity.key());
        }

        (status::aggregate(&monitors, now), monitors)
    }

    /// Delete every monitor tagged `crd_uid:<uid>`.
    ///
    /// Safe to repeat. Only a failure to list monitors is an error; individual
    /// delete failures are counted in the summary.
    pub async fn cleanup(&self, uid: &str) -> Result<CleanupSummary, UptimeKumaError> {
        let owned = MonitorIndex::fetch(self.client(), uid).await?.into_unclaimed();
        let mut summary = CleanupSummary { found: owned.len(), ..CleanupSummary::default() };
        for monitor in &owned {
            info!("Deleting monitor '{}' (id {})", monitor.name, monitor.id);
            if sync::delete_monitor(self.client(), monitor).await {
                summary.deleted += 1;
            } else {
                summary.failed += 1;
            }
        }
        Ok(summary)
    }
}
