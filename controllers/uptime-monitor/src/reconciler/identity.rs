//! Monitor naming and tag-set computation.
//!
//! Pure functions: nothing in here talks to Kubernetes or Uptime Kuma.

use crate::error::ControllerError;
use crds::UptimeMonitor;
use kube::ResourceExt;
use std::collections::BTreeSet;

/// Prefix of the tag that marks a monitor as owned by one resource.
pub const UID_TAG_PREFIX: &str = "crd_uid:";

/// Identity of the owning resource for one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceIdentity {
    pub namespace: String,
    pub name: String,
    pub uid: String,
}

impl ResourceIdentity {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        uid: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            uid: uid.into(),
        }
    }

    /// Read the identity from object metadata. The namespace defaults to `default`.
    pub fn from_object(obj: &UptimeMonitor) -> Result<Self, ControllerError> {
        let name = obj.metadata.name.clone().ok_or_else(|| {
            ControllerError::InvalidConfig("UptimeMonitor has no metadata.name".to_string())
        })?;
        let uid = obj.uid().ok_or_else(|| {
            ControllerError::InvalidConfig(format!("UptimeMonitor {name} has no metadata.uid"))
        })?;
        let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());
        Ok(Self::new(namespace, name, uid))
    }

    /// `namespace/name`, used as the key for logs and backoff state
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// The identity tag, `crd_uid:<uid>`
    #[must_use]
    pub fn uid_tag(&self) -> String {
        uid_tag(&self.uid)
    }

    /// Monitor name for one of this resource's endpoints
    #[must_use]
    pub fn monitor_name(&self, endpoint: &str) -> String {
        monitor_name(&self.namespace, &self.name, endpoint)
    }
}

/// `crd_uid:<uid>`
#[must_use]
pub fn uid_tag(uid: &str) -> String {
    format!("{UID_TAG_PREFIX}{uid}")
}

/// `{namespace}/{resource}/{endpoint}`
#[must_use]
pub fn monitor_name(namespace: &str, resource: &str, endpoint: &str) -> String {
    format!("{namespace}/{resource}/{endpoint}")
}

/// Split a comma-separated tag list. Tokens are trimmed, empty tokens dropped,
/// and repeats collapsed keeping the first occurrence.
#[must_use]
pub fn parse_tags(raw: Option<&str>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.unwrap_or_default().split(',').map(str::trim) {
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Tags an endpoint carries from the spec: its override when that parses to
/// at least one tag, the resource defaults otherwise. Never a merge of both.
#[must_use]
pub fn endpoint_tags(tag_override: Option<&str>, default_tags: Option<&str>) -> Vec<String> {
    let overridden = parse_tags(tag_override);
    if overridden.is_empty() {
        parse_tags(default_tags)
    } else {
        overridden
    }
}

/// Full tag list a monitor must carry: cluster tag, resolved tags, identity tag.
#[must_use]
pub fn expected_tags(cluster_tag: Option<&str>, resolved: &[String], uid: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::with_capacity(resolved.len() + 2);
    let cluster = cluster_tag.map(str::trim).filter(|c| !c.is_empty());
    let uid_tag = uid_tag(uid);
    let candidates = cluster
        .into_iter()
        .chain(resolved.iter().map(String::as_str))
        .chain([uid_tag.as_str()]);
    for tag in candidates {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Order-insensitive view of a tag list, for comparisons.
pub fn tag_set<'a>(tags: impl IntoIterator<Item = &'a str>) -> BTreeSet<&'a str> {
    tags.into_iter().collect()
}
