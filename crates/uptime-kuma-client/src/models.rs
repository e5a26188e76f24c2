//! Uptime Kuma API models
//!
//! These models follow the monitor and tag objects returned by the
//! Uptime Kuma REST gateway. Decoding is lenient: gateways differ in
//! whether list endpoints are wrapped in an envelope and in how the id of
//! a freshly created object is named.

use serde::{Deserialize, Deserializer, Serialize};

/// Monitor type sent for every monitor the operator creates.
pub const HTTP_MONITOR_TYPE: &str = "http";

/// Monitor as returned by `GET /monitors`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Monitor {
    pub id: u64,
    pub name: String,
    /// Group and push monitors report `null` here
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(rename = "type", default)]
    pub monitor_type: Option<String>,
    #[serde(default)]
    pub interval: Option<u64>,
    #[serde(default)]
    pub tags: Vec<MonitorTag>,
}

impl Monitor {
    /// Names of the tags attached to this monitor.
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|t| t.name.as_str())
    }

    /// True when a tag with exactly this name is attached.
    #[must_use]
    pub fn has_tag(&self, name: &str) -> bool {
        self.tag_names().any(|t| t == name)
    }
}

/// Tag attachment embedded in a monitor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonitorTag {
    pub tag_id: u64,
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Tag as returned by `GET /tags`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    #[serde(alias = "tag_id")]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Per-monitor probing settings applied on create and edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Seconds between checks
    pub interval: u64,
    /// Seconds between retries after a failed check
    pub retry_interval: u64,
    /// Retries before the monitor is marked down
    pub max_retries: u32,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: 60,
            retry_interval: 60,
            max_retries: 3,
        }
    }
}

/// Request body for creating or editing a monitor
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonitorRequest {
    #[serde(rename = "type")]
    pub monitor_type: String,
    pub name: String,
    pub url: String,
    pub interval: u64,
    #[serde(rename = "retryInterval")]
    pub retry_interval: u64,
    #[serde(rename = "maxretries")]
    pub max_retries: u32,
}

impl MonitorRequest {
    /// Builds an HTTP monitor request.
    #[must_use]
    pub fn http(
        name: impl Into<String>,
        url: impl Into<String>,
        settings: &MonitorSettings,
    ) -> Self {
        Self {
            monitor_type: HTTP_MONITOR_TYPE.to_string(),
            name: name.into(),
            url: url.into(),
            interval: settings.interval,
            retry_interval: settings.retry_interval,
            max_retries: settings.max_retries,
        }
    }
}

/// Request body for creating a tag
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateTagRequest<'a> {
    pub name: &'a str,
    pub color: &'a str,
}

/// Request body for attaching or detaching a tag
#[derive(Debug, Clone, Serialize)]
pub(crate) struct MonitorTagRequest {
    pub tag_id: u64,
    pub value: String,
}

/// List response, either enveloped or a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Monitors { monitors: Vec<T> },
    Tags { tags: Vec<T> },
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    pub(crate) fn into_items(self) -> Vec<T> {
        match self {
            Listing::Monitors { monitors } => monitors,
            Listing::Tags { tags } => tags,
            Listing::Bare(items) => items,
        }
    }
}

/// Response of `POST /monitors`
#[derive(Debug, Deserialize)]
pub(crate) struct MonitorCreated {
    #[serde(rename = "monitorID", alias = "monitorId", alias = "id")]
    pub monitor_id: u64,
}

/// Response of `POST /tags`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum TagCreated {
    Wrapped { tag: Tag },
    Full(Tag),
    IdOnly {
        #[serde(rename = "tagID", alias = "tag_id", alias = "id")]
        id: u64,
    },
}

impl TagCreated {
    pub(crate) fn into_tag(self, name: &str, color: &str) -> Tag {
        match self {
            TagCreated::Wrapped { tag } | TagCreated::Full(tag) => tag,
            TagCreated::IdOnly { id } => Tag {
                id,
                name: name.to_string(),
                color: Some(color.to_string()),
            },
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
