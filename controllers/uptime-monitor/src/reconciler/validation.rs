//! Spec validation.
//!
//! Turns a raw `UptimeMonitorSpec` into a `DesiredState` or reports the
//! first rule it breaks. Never contacts Uptime Kuma.

use crds::UptimeMonitorSpec;
use std::collections::HashSet;
use thiserror::Error;

/// A rule the declared spec violates
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("at least one endpoint must be specified")]
    NoEndpoints,

    #[error("endpoint #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("endpoint {name:?} has url {url:?}, which must start with http:// or https://")]
    InvalidUrl { name: String, url: String },

    #[error("endpoint name {name:?} is used more than once")]
    DuplicateName { name: String },
}

/// One validated endpoint. The name is trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredEndpoint {
    pub name: String,
    pub url: String,
    pub tag_override: Option<String>,
}

/// A validated spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredState {
    pub enabled: bool,
    pub default_tags: Option<String>,
    pub endpoints: Vec<DesiredEndpoint>,
}

/// Validate a spec. Checks run in endpoint order and stop at the first violation.
pub fn validate(spec: &UptimeMonitorSpec) -> Result<DesiredState, ValidationError> {
    if spec.endpoints.is_empty() {
        return Err(ValidationError::NoEndpoints);
    }

    let mut seen = HashSet::new();
    let mut endpoints = Vec::with_capacity(spec.endpoints.len());
    for (index, endpoint) in spec.endpoints.iter().enumerate() {
        let name = endpoint.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName { index });
        }
        if !(endpoint.url.starts_with("http://") || endpoint.url.starts_with("https://")) {
            return Err(ValidationError::InvalidUrl {
                name: name.to_string(),
                url: endpoint.url.clone(),
            });
        }
        if !seen.insert(name) {
            return Err(ValidationError::DuplicateName { name: name.to_string() });
        }
        endpoints.push(DesiredEndpoint {
            name: name.to_string(),
            url: endpoint.url.clone(),
            tag_override: endpoint.tags_overwrite.clone(),
        });
    }

    Ok(DesiredState {
        enabled: spec.enabled,
        default_tags: spec.tags.clone(),
        endpoints,
    })
}
