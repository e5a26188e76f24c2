//! Mock UptimeKumaClient for unit testing
//!
//! This module provides an in-memory implementation of `UptimeKumaClientTrait`
//! that can be used in unit tests without a running Uptime Kuma instance.
//! Individual operations can be made to fail, and every call is counted.

use crate::error::UptimeKumaError;
use crate::kuma_trait::UptimeKumaClientTrait;
use crate::models::{Monitor, MonitorRequest, MonitorTag, Tag, HTTP_MONITOR_TYPE};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Client operations, used for failure injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListMonitors,
    CreateMonitor,
    EditMonitor,
    DeleteMonitor,
    ListTags,
    CreateTag,
    AddMonitorTag,
    DeleteMonitorTag,
}

impl Operation {
    /// True for operations that change state in Uptime Kuma.
    #[must_use]
    pub fn is_mutation(self) -> bool {
        !matches!(self, Operation::ListMonitors | Operation::ListTags)
    }
}

#[derive(Debug, Default)]
struct MockState {
    monitors: BTreeMap<u64, Monitor>,
    tags: BTreeMap<u64, Tag>,
    next_id: u64,
    failing: HashSet<Operation>,
    failing_tags: HashSet<String>,
    calls: HashMap<Operation, usize>,
    created: Vec<MonitorRequest>,
}

impl MockState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Count the call and fail it if the operation is marked as failing
    fn enter(&mut self, op: Operation) -> Result<(), UptimeKumaError> {
        *self.calls.entry(op).or_default() += 1;
        if self.failing.contains(&op) {
            return Err(UptimeKumaError::Api(format!("injected failure for {op:?}")));
        }
        Ok(())
    }

    fn tag_by_name(&mut self, name: &str) -> Tag {
        if let Some(tag) = self.tags.values().find(|t| t.name == name) {
            return tag.clone();
        }
        let id = self.next_id();
        let tag = Tag { id, name: name.to_string(), color: None };
        self.tags.insert(id, tag.clone());
        tag
    }
}

/// Mock UptimeKumaClient for testing
///
/// Clones share the same in-memory store.
#[derive(Debug, Clone)]
pub struct MockUptimeKumaClient {
    base_url: String,
    state: Arc<Mutex<MockState>>,
}

impl Default for MockUptimeKumaClient {
    fn default() -> Self {
        Self::new("http://uptime-kuma.mock")
    }
}

impl MockUptimeKumaClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every subsequent call of `op` fail
    pub fn fail(&self, op: Operation) {
        self.state().failing.insert(op);
    }

    /// Undo `fail` for `op`
    pub fn recover(&self, op: Operation) {
        self.state().failing.remove(&op);
    }

    /// Make attaching the tag with this name fail
    pub fn fail_tag(&self, name: impl Into<String>) {
        self.state().failing_tags.insert(name.into());
    }

    /// Simulate the service being down: every operation fails
    pub fn set_unreachable(&self, unreachable: bool) {
        let ops = [
            Operation::ListMonitors,
            Operation::CreateMonitor,
            Operation::EditMonitor,
            Operation::DeleteMonitor,
            Operation::ListTags,
            Operation::CreateTag,
            Operation::AddMonitorTag,
            Operation::DeleteMonitorTag,
        ];
        let mut state = self.state();
        for op in ops {
            if unreachable {
                state.failing.insert(op);
            } else {
                state.failing.remove(&op);
            }
        }
    }

    /// Add a tag to the mock store (for test setup)
    pub fn add_tag(&self, name: &str) -> Tag {
        self.state().tag_by_name(name)
    }

    /// Add a monitor to the mock store (for test setup), creating tags as needed
    pub fn add_monitor(&self, name: &str, url: &str, tags: &[&str]) -> u64 {
        let mut state = self.state();
        let tags = tags
            .iter()
            .map(|t| {
                let tag = state.tag_by_name(t);
                MonitorTag { tag_id: tag.id, name: tag.name, value: Some(String::new()) }
            })
            .collect();
        let id = state.next_id();
        state.monitors.insert(
            id,
            Monitor {
                id,
                name: name.to_string(),
                url: url.to_string(),
                monitor_type: Some(HTTP_MONITOR_TYPE.to_string()),
                interval: Some(60),
                tags,
            },
        );
        id
    }

    /// Snapshot of every stored monitor, ordered by id
    pub fn monitors(&self) -> Vec<Monitor> {
        self.state().monitors.values().cloned().collect()
    }

    /// Snapshot of every stored tag, ordered by id
    pub fn tags(&self) -> Vec<Tag> {
        self.state().tags.values().cloned().collect()
    }

    /// First monitor with this exact name
    pub fn monitor_by_name(&self, name: &str) -> Option<Monitor> {
        self.state().monitors.values().find(|m| m.name == name).cloned()
    }

    /// Requests passed to `create_monitor`, in call order
    pub fn created_requests(&self) -> Vec<MonitorRequest> {
        self.state().created.clone()
    }

    /// Number of calls made for `op`
    pub fn calls(&self, op: Operation) -> usize {
        self.state().calls.get(&op).copied().unwrap_or_default()
    }

    /// Number of calls that change state in Uptime Kuma
    pub fn mutation_calls(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|(op, _)| op.is_mutation())
            .map(|(_, n)| n)
            .sum()
    }

    /// Clear the call counters and recorded requests
    pub fn reset_calls(&self) {
        let mut state = self.state();
        state.calls.clear();
        state.created.clear();
    }
}

#[async_trait::async_trait]
impl UptimeKumaClientTrait for MockUptimeKumaClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn list_monitors(&self) -> Result<Vec<Monitor>, UptimeKumaError> {
        let mut state = self.state();
        state.enter(Operation::ListMonitors)?;
        Ok(state.monitors.values().cloned().collect())
    }

    async fn create_monitor(&self, request: &MonitorRequest) -> Result<u64, UptimeKumaError> {
        let mut state = self.state();
        state.enter(Operation::CreateMonitor)?;
        let id = state.next_id();
        state.monitors.insert(
            id,
            Monitor {
                id,
                name: request.name.clone(),
                url: request.url.clone(),
                monitor_type: Some(request.monitor_type.clone()),
                interval: Some(request.interval),
                tags: Vec::new(),
            },
        );
        state.created.push(request.clone());
        Ok(id)
    }

    async fn edit_monitor(&self, id: u64, request: &MonitorRequest) -> Result<(), UptimeKumaError> {
        let mut state = self.state();
        state.enter(Operation::EditMonitor)?;
        let monitor = state
            .monitors
            .get_mut(&id)
            .ok_or_else(|| UptimeKumaError::NotFound(format!("Monitor {id} not found")))?;
        monitor.name.clone_from(&request.name);
        monitor.url.clone_from(&request.url);
        monitor.monitor_type = Some(request.monitor_type.clone());
        monitor.interval = Some(request.interval);
        Ok(())
    }

    async fn delete_monitor(&self, id: u64) -> Result<(), UptimeKumaError> {
        let mut state = self.state();
        state.enter(Operation::DeleteMonitor)?;
        state
            .monitors
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| UptimeKumaError::NotFound(format!("Monitor {id} not found")))
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, UptimeKumaError> {
        let mut state = self.state();
        state.enter(Operation::ListTags)?;
        Ok(state.tags.values().cloned().collect())
    }

    async fn create_tag(&self, name: &str, color: &str) -> Result<Tag, UptimeKumaError> {
        let mut state = self.state();
        state.enter(Operation::CreateTag)?;
        let id = state.next_id();
        let tag = Tag { id, name: name.to_string(), color: Some(color.to_string()) };
        state.tags.insert(id, tag.clone());
        Ok(tag)
    }

    async fn add_monitor_tag(&self, monitor_id: u64, tag_id: u64) -> Result<(), UptimeKumaError> {
        let mut state = self.state();
        state.enter(Operation::AddMonitorTag)?;
        let tag = state
            .tags
            .get(&tag_id)
            .cloned()
            .ok_or_else(|| UptimeKumaError::NotFound(format!("Tag {tag_id} not found")))?;
        if state.failing_tags.contains(&tag.name) {
            return Err(UptimeKumaError::Api(format!(
                "injected failure attaching tag {}",
                tag.name
            )));
        }
        let monitor = state
            .monitors
            .get_mut(&monitor_id)
            .ok_or_else(|| UptimeKumaError::NotFound(format!("Monitor {monitor_id} not found")))?;
        if !monitor.tags.iter().any(|t| t.tag_id == tag_id) {
            monitor.tags.push(MonitorTag { tag_id, name: tag.name, value: Some(String::new()) });
        }
        Ok(())
    }

    async fn delete_monitor_tag(
        &self,
        monitor_id: u64,
        tag_id: u64,
    ) -> Result<(), UptimeKumaError> {
        let mut state = self.state();
        state.enter(Operation::DeleteMonitorTag)?;
        let monitor = state
            .monitors
            .get_mut(&monitor_id)
            .ok_or_else(|| UptimeKumaError::NotFound(format!("Monitor {monitor_id} not found")))?;
        monitor.tags.retain(|t| t.tag_id != tag_id);
        Ok(())
    }
}
