//! UptimeMonitor CRD
//!
//! Declares a set of HTTP endpoints that should be watched by Uptime Kuma,
//! grouped under one Kubernetes resource.

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Condition type reported for overall readiness.
pub const READY_CONDITION: &str = "Ready";

/// UptimeMonitorSpec defines the desired monitors for one resource
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[kube(
    group = "uptime-operator.dev",
    version = "v1alpha1",
    kind = "UptimeMonitor",
    namespaced,
    status = "UptimeMonitorStatus",
    shortname = "um",
    printcolumn = r#"{"name":"Enabled","type":"boolean","jsonPath":".spec.enabled"}"#,
    printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Reason","type":"string","jsonPath":".status.conditions[?(@.type==\"Ready\")].reason"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct UptimeMonitorSpec {
    /// Master switch. When false every monitor owned by this resource is removed.
    pub enabled: bool,

    /// Comma-separated default tags applied to every endpoint without an override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,

    /// Endpoints to monitor
    pub endpoints: Vec<EndpointSpec>,
}

/// A single endpoint to monitor
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSpec {
    /// Unique name for the endpoint within this resource
    pub name: String,

    /// Full URL to monitor (http:// or https://)
    pub url: String,

    /// Comma-separated tags that replace the default tags for this endpoint
    #[serde(default, alias = "tags_overwrite", skip_serializing_if = "Option::is_none")]
    pub tags_overwrite: Option<String>,
}

/// UptimeMonitorStatus defines the observed state of an UptimeMonitor
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UptimeMonitorStatus {
    /// Current conditions
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Per-endpoint monitor outcomes from the last pass
    #[serde(default)]
    pub monitors: Vec<MonitorStatus>,

    /// Last synchronization time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,

    /// Generation of the spec this status was computed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl UptimeMonitorStatus {
    /// Returns the Ready condition if present.
    #[must_use]
    pub fn ready_condition(&self) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.r#type == READY_CONDITION)
    }

    /// True when the Ready condition exists and is `True`.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready_condition()
            .is_some_and(|c| c.status == ConditionStatus::True)
    }

    /// Monitors whose last sync did not fully succeed.
    #[must_use]
    pub fn failed_monitors(&self) -> Vec<&MonitorStatus> {
        self.monitors.iter().filter(|m| m.status.is_failure()).collect()
    }
}

/// Outcome of one endpoint in a reconciliation pass
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    /// Endpoint name as declared in the spec
    pub name: String,

    /// URL being monitored
    pub url: String,

    /// Monitor ID in Uptime Kuma (absent when creation failed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_kuma_id: Option<u64>,

    /// Result of the last pass for this endpoint
    pub status: MonitorState,

    /// Time this outcome was recorded
    pub last_sync: DateTime<Utc>,
}

/// Per-endpoint sync state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "PascalCase")]
pub enum MonitorState {
    /// Monitor was created in this pass
    Created,
    /// Monitor existed and was brought in line with the spec
    Updated,
    /// Monitor already matched the spec
    Ready,
    /// Monitor creation failed
    CreateFailed,
    /// Monitor update failed
    UpdateFailed,
    /// Monitor exists but at least one expected tag could not be attached
    TagsIncomplete,
}

impl MonitorState {
    /// States counted as a failed sync.
    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            MonitorState::CreateFailed | MonitorState::UpdateFailed | MonitorState::TagsIncomplete
        )
    }

    /// Stable string form, used for metric labels.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MonitorState::Created => "Created",
            MonitorState::Updated => "Updated",
            MonitorState::Ready => "Ready",
            MonitorState::CreateFailed => "CreateFailed",
            MonitorState::UpdateFailed => "UpdateFailed",
            MonitorState::TagsIncomplete => "TagsIncomplete",
        }
    }
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition represents an observation of the resource's state
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition (always "Ready" for conditions written by the operator)
    pub r#type: String,

    /// Status of the condition
    pub status: ConditionStatus,

    /// Machine-readable reason. The operator writes `ConditionReason` values,
    /// conditions added by other writers may carry any string.
    pub reason: String,

    /// Human-readable message
    #[serde(default)]
    pub message: String,

    /// Last time the condition status changed
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    /// Builds a Ready condition.
    #[must_use]
    pub fn ready(
        status: ConditionStatus,
        reason: ConditionReason,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            r#type: READY_CONDITION.to_string(),
            status,
            reason: reason.as_str().to_string(),
            message: message.into(),
            last_transition_time: now,
        }
    }

    /// True when this condition carries the given reason.
    #[must_use]
    pub fn has_reason(&self, reason: ConditionReason) -> bool {
        self.reason == reason.as_str()
    }
}

/// Condition status values
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum ConditionStatus {
    /// Condition holds
    True,
    /// Condition does not hold
    False,
    /// Not yet determined
    #[default]
    Unknown,
}

/// Reasons for the Ready condition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "PascalCase")]
pub enum ConditionReason {
    /// Every monitor synced
    SyncSuccessful,
    /// At least one monitor failed to sync
    SyncFailed,
    /// The resource is disabled and its monitors were removed
    Disabled,
    /// The pass aborted (invalid spec or Uptime Kuma unreachable)
    ReconciliationError,
}

impl ConditionReason {
    /// Stable string form, used for metric labels.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionReason::SyncSuccessful => "SyncSuccessful",
            ConditionReason::SyncFailed => "SyncFailed",
            ConditionReason::Disabled => "Disabled",
            ConditionReason::ReconciliationError => "ReconciliationError",
        }
    }
}

impl fmt::Display for ConditionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
