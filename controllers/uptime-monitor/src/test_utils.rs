//! Test utilities for unit testing the reconciler
//!
//! Builders for UptimeMonitor specs and objects, plus a reconciler wired to
//! an in-memory Uptime Kuma.

use crate::reconciler::identity::ResourceIdentity;
use crate::reconciler::Reconciler;
use crds::{EndpointSpec, UptimeMonitor, UptimeMonitorSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use uptime_kuma_client::{MockUptimeKumaClient, MonitorSettings};

pub const TEST_NAMESPACE: &str = "production";
pub const TEST_NAME: &str = "app-monitors";
pub const TEST_UID: &str = "6a1f7c2e-0000-4000-8000-000000000001";
pub const TEST_CLUSTER: &str = "test-cluster";

/// Identity of the resource most tests reconcile
pub fn test_identity() -> ResourceIdentity {
    ResourceIdentity::new(TEST_NAMESPACE, TEST_NAME, TEST_UID)
}

/// Endpoint without a tag override
pub fn endpoint(name: &str, url: &str) -> EndpointSpec {
    EndpointSpec {
        name: name.to_string(),
        url: url.to_string(),
        tags_overwrite: None,
    }
}

/// Endpoint with a tag override
pub fn endpoint_with_tags(name: &str, url: &str, tags: &str) -> EndpointSpec {
    EndpointSpec {
        tags_overwrite: Some(tags.to_string()),
        ..endpoint(name, url)
    }
}

/// Enabled spec
pub fn create_test_spec(tags: Option<&str>, endpoints: Vec<EndpointSpec>) -> UptimeMonitorSpec {
    UptimeMonitorSpec {
        enabled: true,
        tags: tags.map(str::to_string),
        endpoints,
    }
}

/// UptimeMonitor object as the API server would hand it out
pub fn create_test_uptime_monitor(
    name: &str,
    namespace: &str,
    uid: &str,
    spec: UptimeMonitorSpec,
) -> UptimeMonitor {
    UptimeMonitor {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: Some(uid.to_string()),
            generation: Some(1),
            ..Default::default()
        },
        spec,
        status: None,
    }
}

/// Reconciler backed by a clone of `mock`, tagging with `TEST_CLUSTER`
pub fn create_test_reconciler(mock: &MockUptimeKumaClient) -> Reconciler {
    Reconciler::new(mock.clone(), Some(TEST_CLUSTER.to_string()), MonitorSettings::default())
}
