//! Prometheus metrics for the controller.

use crds::UptimeMonitorStatus;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Controller counters, registered in their own registry
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    reconciliations: IntCounterVec,
    monitor_outcomes: IntCounterVec,
    cleanups: IntCounter,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let reconciliations = IntCounterVec::new(
            Opts::new(
                "uptime_operator_reconciliations_total",
                "Reconciliation passes by Ready condition reason",
            ),
            &["reason"],
        )?;
        let monitor_outcomes = IntCounterVec::new(
            Opts::new(
                "uptime_operator_monitor_outcomes_total",
                "Per-endpoint sync outcomes by status",
            ),
            &["status"],
        )?;
        let cleanups = IntCounter::new(
            "uptime_operator_cleanups_total",
            "Finalizer cleanups of deleted UptimeMonitors",
        )?;

        registry.register(Box::new(reconciliations.clone()))?;
        registry.register(Box::new(monitor_outcomes.clone()))?;
        registry.register(Box::new(cleanups.clone()))?;

        Ok(Self {
            registry,
            reconciliations,
            monitor_outcomes,
            cleanups,
        })
    }

    /// Count a finished pass and each of its endpoint outcomes
    pub fn record_pass(&self, status: &UptimeMonitorStatus) {
        if let Some(ready) = status.ready_condition() {
            self.reconciliations
                .with_label_values(&[ready.reason.as_str()])
                .inc();
        }
        for monitor in &status.monitors {
            self.monitor_outcomes
                .with_label_values(&[monitor.status.as_str()])
                .inc();
        }
    }

    pub fn record_cleanup(&self) {
        self.cleanups.inc();
    }

    /// Text exposition format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
