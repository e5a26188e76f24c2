//! Index of the Uptime Kuma monitors owned by one resource.

use super::identity::uid_tag;
use std::collections::HashMap;
use tracing::warn;
use uptime_kuma_client::{Monitor, UptimeKumaClientTrait, UptimeKumaError};

/// Monitors tagged `crd_uid:<uid>`, looked up by name.
///
/// Entries taken during the diff are consumed; whatever remains afterwards
/// is no longer declared and gets swept.
#[derive(Debug, Default)]
pub struct MonitorIndex {
    records: Vec<Option<Monitor>>,
    by_name: HashMap<String, usize>,
}

impl MonitorIndex {
    /// Fetch and filter the owned monitors.
    pub async fn fetch(
        client: &dyn UptimeKumaClientTrait,
        uid: &str,
    ) -> Result<Self, UptimeKumaError> {
        let tag = uid_tag(uid);
        let owned = client
            .list_monitors()
            .await?
            .into_iter()
            .filter(|m| m.has_tag(&tag));
        Ok(Self::from_monitors(owned))
    }

    /// Like `fetch`, but a listing failure is logged and yields an empty index.
    pub async fn fetch_or_empty(client: &dyn UptimeKumaClientTrait, uid: &str) -> Self {
        match Self::fetch(client, uid).await {
            Ok(index) => index,
            Err(e) => {
                warn!("Failed to list monitors for crd_uid {}, continuing with none: {}", uid, e);
                Self::default()
            }
        }
    }

    /// Build from an already filtered set of monitors. On a name clash the
    /// first monitor is the match; later ones stay unconsumed.
    pub fn from_monitors(monitors: impl IntoIterator<Item = Monitor>) -> Self {
        let mut index = Self::default();
        for monitor in monitors {
            let slot = index.records.len();
            index.by_name.entry(monitor.name.clone()).or_insert(slot);
            index.records.push(Some(monitor));
        }
        index
    }

    /// Consume the monitor with exactly this name.
    pub fn take(&mut self, name: &str) -> Option<Monitor> {
        let slot = self.by_name.remove(name)?;
        self.records.get_mut(slot).and_then(Option::take)
    }

    /// Number of monitors not yet consumed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.iter().flatten().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain the monitors not consumed by `take`.
    pub fn into_unclaimed(self) -> Vec<Monitor> {
        self.records.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uptime_kuma_client::{MockUptimeKumaClient, Operation};

    #[tokio::test]
    async fn test_fetch_filters_by_uid_tag() {
        let client = MockUptimeKumaClient::default();
        client.add_monitor("ns/a/one", "https://one", &["crd_uid:a"]);
        client.add_monitor("ns/b/one", "https://one", &["crd_uid:b"]);
        client.add_monitor("manual", "https://manual", &["prod"]);

        let mut index = MonitorIndex::fetch(&client, "a").await.unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.take("ns/b/one").is_none());
        assert_eq!(index.take("ns/a/one").map(|m| m.url), Some("https://one".to_string()));
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_or_empty_degrades_on_list_failure() {
        let client = MockUptimeKumaClient::default();
        client.add_monitor("ns/a/one", "https://one", &["crd_uid:a"]);
        client.fail(Operation::ListMonitors);

        assert!(MonitorIndex::fetch(&client, "a").await.is_err());
        assert!(MonitorIndex::fetch_or_empty(&client, "a").await.is_empty());
    }

    #[test]
    fn test_duplicate_names_leave_extras_unclaimed() {
        let monitor = |id: u64| Monitor {
            id,
            name: "ns/a/one".to_string(),
            url: "https://one".to_string(),
            monitor_type: None,
            interval: None,
            tags: Vec::new(),
        };
        let mut index = MonitorIndex::from_monitors([monitor(1), monitor(2)]);

        assert_eq!(index.take("ns/a/one").map(|m| m.id), Some(1));
        assert!(index.take("ns/a/one").is_none());
        let rest: Vec<u64> = index.into_unclaimed().into_iter().map(|m| m.id).collect();
        assert_eq!(rest, vec![2]);
    }
}
