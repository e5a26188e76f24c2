//! Diff and apply.
//!
//! For one endpoint, decide between create, update and no-op against the
//! indexed monitor of the same name, then carry out that decision. Tags are
//! attached one at a time and every attachment reports its own result.

use super::identity::tag_set;
use crds::MonitorState;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uptime_kuma_client::{
    Monitor, MonitorRequest, MonitorSettings, UptimeKumaClientTrait, UptimeKumaError,
};

/// Colour given to tags created by the operator.
pub const TAG_COLOR: &str = "#007acc";

/// What a pass has to do for one endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// No monitor with this name exists
    Create,
    /// The monitor exists but its url or tag set differs
    Update { id: u64, current_tag_ids: Vec<u64> },
    /// The monitor already matches
    Noop { id: u64 },
}

impl Plan {
    /// Compare the indexed monitor (if any) with the desired url and tags.
    #[must_use]
    pub fn for_endpoint(existing: Option<&Monitor>, url: &str, expected_tags: &[String]) -> Self {
        let Some(monitor) = existing else {
            return Plan::Create;
        };
        let tags_match =
            tag_set(monitor.tag_names()) == tag_set(expected_tags.iter().map(String::as_str));
        if monitor.url == url && tags_match {
            Plan::Noop { id: monitor.id }
        } else {
            let mut current_tag_ids: Vec<u64> = monitor.tags.iter().map(|t| t.tag_id).collect();
            current_tag_ids.sort_unstable();
            current_tag_ids.dedup();
            Plan::Update { id: monitor.id, current_tag_ids }
        }
    }
}

/// Result of one endpoint's sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointOutcome {
    pub state: MonitorState,
    pub id: Option<u64>,
}

/// Result of resolving and attaching one tag
#[derive(Debug)]
pub struct TagAttachment {
    pub tag: String,
    pub result: Result<u64, UptimeKumaError>,
}

impl TagAttachment {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Tag name to id lookup, listed lazily at most once per pass.
///
/// Tags created during the pass are added as they are made.
pub struct TagCatalog<'a> {
    client: &'a dyn UptimeKumaClientTrait,
    tags: Option<HashMap<String, u64>>,
}

impl<'a> TagCatalog<'a> {
    pub fn new(client: &'a dyn UptimeKumaClientTrait) -> Self {
        Self { client, tags: None }
    }

    /// Id of the tag with exactly this name, creating it when missing.
    pub async fn resolve(&mut self, name: &str) -> Result<u64, UptimeKumaError> {
        if self.tags.is_none() {
            let listed = self.client.list_tags().await?;
            let mut tags = HashMap::with_capacity(listed.len());
            for tag in listed {
                tags.entry(tag.name).or_insert(tag.id);
            }
            self.tags = Some(tags);
        }
        let tags = self.tags.get_or_insert_with(HashMap::new);
        if let Some(id) = tags.get(name) {
            return Ok(*id);
        }

        let tag = self.client.create_tag(name, TAG_COLOR).await?;
        debug!("Created tag {} (id {})", name, tag.id);
        tags.insert(name.to_string(), tag.id);
        Ok(tag.id)
    }
}

impl std::fmt::Debug for TagCatalog<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagCatalog")
            .field("base_url", &self.client.base_url())
            .field("tags", &self.tags)
            .finish()
    }
}

/// Applies plans for one pass. Calls are issued sequentially.
pub struct SyncEngine<'a> {
    client: &'a dyn UptimeKumaClientTrait,
    settings: &'a MonitorSettings,
    catalog: TagCatalog<'a>,
}

impl std::fmt::Debug for SyncEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("settings", self.settings)
            .field("catalog", &self.catalog)
            .finish()
    }
}

impl<'a> SyncEngine<'a> {
    pub fn new(client: &'a dyn UptimeKumaClientTrait, settings: &'a MonitorSettings) -> Self {
        Self {
            client,
            settings,
            catalog: TagCatalog::new(client),
        }
    }

    /// Converge one monitor onto `name`, `url` and `expected_tags`.
    pub async fn sync(
        &mut self,
        name: &str,
        url: &str,
        expected_tags: &[String],
        existing: Option<&Monitor>,
    ) -> EndpointOutcome {
        match Plan::for_endpoint(existing, url, expected_tags) {
            Plan::Noop { id } => {
                debug!("Monitor '{}' (id {}) is up to date", name, id);
                EndpointOutcome { state: MonitorState::Ready, id: Some(id) }
            }
            Plan::Create => self.create(name, url, expected_tags).await,
            Plan::Update { id, current_tag_ids } => {
                self.update(id, name, url, expected_tags, &current_tag_ids).await
            }
        }
    }

    async fn create(&mut self, name: &str, url: &str, expected_tags: &[String]) -> EndpointOutcome {
        info!("Creating monitor '{}' -> {}", name, url);
        let request = MonitorRequest::http(name, url, self.settings);
        let id = match self.client.create_monitor(&request).await {
            Ok(id) => id,
            Err(e) => {
                warn!("Failed to create monitor '{}': {}", name, e);
                return EndpointOutcome { state: MonitorState::CreateFailed, id: None };
            }
        };

        let state = if self.attach_all(id, expected_tags).await {
            MonitorState::Created
        } else {
            MonitorState::TagsIncomplete
        };
        EndpointOutcome { state, id: Some(id) }
    }

    async fn update(
        &mut self,
        id: u64,
        name: &str,
        url: &str,
        expected_tags: &[String],
        current_tag_ids: &[u64],
    ) -> EndpointOutcome {
        info!("Updating monitor '{}' (id {}) -> {}", name, id, url);
        let request = MonitorRequest::http(name, url, self.settings);
        if let Err(e) = self.client.edit_monitor(id, &request).await {
            warn!("Failed to update monitor '{}' (id {}): {}", name, id, e);
            return EndpointOutcome { state: MonitorState::UpdateFailed, id: Some(id) };
        }

        // Full replace: strip everything, then attach the expected set
        let mut complete = true;
        for tag_id in current_tag_ids {
            if let Err(e) = self.client.delete_monitor_tag(id, *tag_id).await {
                warn!("Failed to detach tag {} from monitor '{}': {}", tag_id, name, e);
                complete = false;
            }
        }
        complete &= self.attach_all(id, expected_tags).await;

        let state = if complete {
            MonitorState::Updated
        } else {
            MonitorState::TagsIncomplete
        };
        EndpointOutcome { state, id: Some(id) }
    }

    /// Attach every tag; true when all of them made it.
    async fn attach_all(&mut self, monitor_id: u64, tags: &[String]) -> bool {
        let mut attachments = Vec::with_capacity(tags.len());
        for tag in tags {
            attachments.push(self.attach(monitor_id, tag).await);
        }
        for failed in attachments.iter().filter(|a| !a.is_ok()) {
            if let Err(e) = &failed.result {
                warn!("Failed to attach tag '{}' to monitor {}: {}", failed.tag, monitor_id, e);
            }
        }
        attachments.iter().all(TagAttachment::is_ok)
    }

    async fn attach(&mut self, monitor_id: u64, tag: &str) -> TagAttachment {
        let result = match self.catalog.resolve(tag).await {
            Ok(tag_id) => self
                .client
                .add_monitor_tag(monitor_id, tag_id)
                .await
                .map(|()| tag_id),
            Err(e) => Err(e),
        };
        TagAttachment { tag: tag.to_string(), result }
    }

    /// Delete monitors no endpoint claimed. Returns how many are gone.
    pub async fn sweep(&self, unclaimed: Vec<Monitor>) -> usize {
        let mut deleted = 0;
        for monitor in unclaimed {
            info!("Deleting monitor '{}' (id {}): no longer declared", monitor.name, monitor.id);
            if delete_monitor(self.client, &monitor).await {
                deleted += 1;
            }
        }
        deleted
    }
}

/// Delete one monitor, treating "already gone" as success. Failures are logged.
pub async fn delete_monitor(client: &dyn UptimeKumaClientTrait, monitor: &Monitor) -> bool {
    match client.delete_monitor(monitor.id).await {
        Ok(()) => true,
        Err(UptimeKumaError::NotFound(_)) => {
            debug!("Monitor '{}' (id {}) was already deleted", monitor.name, monitor.id);
            true
        }
        Err(e) => {
            warn!("Failed to delete monitor '{}' (id {}): {}", monitor.name, monitor.id, e);
            false
        }
    }
}
