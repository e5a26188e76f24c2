//! Controller-specific error types.
//!
//! Errors raised inside a reconciliation pass never reach this type: the
//! pass turns them into status. These are the failures of the surrounding
//! machinery (Kubernetes API, finalizer bookkeeping, startup).

use kube::Error as KubeError;
use kube_runtime::finalizer;
use thiserror::Error;
use uptime_kuma_client::UptimeKumaError;

/// Errors that can occur in the UptimeMonitor Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Uptime Kuma API error
    #[error("Uptime Kuma error: {0}")]
    UptimeKuma(#[from] UptimeKumaError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),

    /// Finalizer add/remove or the wrapped apply/cleanup failed
    #[error("Finalizer error: {0}")]
    Finalizer(#[source] Box<finalizer::Error<ControllerError>>),

    /// Probe/metrics server failed
    #[error("Probe server error: {0}")]
    Probe(String),
}
