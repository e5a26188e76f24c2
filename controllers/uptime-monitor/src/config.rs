//! Controller configuration.
//!
//! Loaded once at startup from environment variables. Unset variables take
//! their default; a variable that is set but cannot be parsed is an error.

use crate::error::ControllerError;
use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use uptime_kuma_client::MonitorSettings;

const DEFAULT_UPTIME_KUMA_URL: &str = "http://localhost:3001";
const DEFAULT_CLUSTER_NAME: &str = "default";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_RESYNC_SECONDS: u64 = 300;
const DEFAULT_PROBE_ADDR: &str = "0.0.0.0:8080";

/// Process-wide configuration, read-only after startup.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Base URL of the Uptime Kuma REST gateway
    pub uptime_kuma_url: String,
    /// Optional bearer token for the gateway
    pub uptime_kuma_token: Option<String>,
    /// Tag added to every monitor to identify this cluster; blank disables it
    pub cluster_name: String,
    /// Namespace to watch; `None` watches all namespaces
    pub watch_namespace: Option<String>,
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
    /// Interval, retry interval and retry count for created monitors
    pub monitor: MonitorSettings,
    /// How often a healthy resource is reconciled again to correct drift
    pub resync_interval: Duration,
    /// Listen address of the probe/metrics server
    pub probe_addr: SocketAddr,
}

impl ControllerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = MonitorSettings::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            uptime_kuma_url: non_empty("UPTIME_KUMA_URL")
                .unwrap_or_else(|| DEFAULT_UPTIME_KUMA_URL.to_string()),
            uptime_kuma_token: non_empty("UPTIME_KUMA_TOKEN"),
            // An explicitly empty CLUSTER_NAME turns the cluster tag off
            cluster_name: lookup("CLUSTER_NAME")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| DEFAULT_CLUSTER_NAME.to_string()),
            watch_namespace: non_empty("WATCH_NAMESPACE"),
            log_level: non_empty("LOG_LEVEL")
                .map(|v| v.to_lowercase())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            monitor: MonitorSettings {
                interval: parse_var(&lookup, "MONITOR_INTERVAL", defaults.interval)?,
                retry_interval: parse_var(&lookup, "RETRY_INTERVAL", defaults.retry_interval)?,
                max_retries: parse_var(&lookup, "MAX_RETRIES", defaults.max_retries)?,
            },
            resync_interval: Duration::from_secs(parse_var(
                &lookup,
                "RESYNC_INTERVAL",
                DEFAULT_RESYNC_SECONDS,
            )?),
            probe_addr: match non_empty("PROBE_ADDR") {
                Some(raw) => parse_value("PROBE_ADDR", &raw)?,
                None => parse_value("PROBE_ADDR", DEFAULT_PROBE_ADDR)?,
            },
        })
    }

    /// Cluster tag to attach, if any.
    #[must_use]
    pub fn cluster_tag(&self) -> Option<&str> {
        Some(self.cluster_name.as_str()).filter(|name| !name.is_empty())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ControllerError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ControllerError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse()
        .map_err(|e| ControllerError::InvalidConfig(format!("{key}={raw:?}: {e}")))
}
