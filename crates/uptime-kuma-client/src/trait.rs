//! UptimeKumaClient trait for mocking
//!
//! The reconciler only talks to Uptime Kuma through this trait, so unit tests
//! can swap in `MockUptimeKumaClient`.

use crate::error::UptimeKumaError;
use crate::models::{Monitor, MonitorRequest, Tag};

/// Trait for Uptime Kuma API client operations
///
/// Every call is a single attempt; retries are left to the caller.
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait UptimeKumaClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    // Monitor Operations
    async fn list_monitors(&self) -> Result<Vec<Monitor>, UptimeKumaError>;
    async fn create_monitor(&self, request: &MonitorRequest) -> Result<u64, UptimeKumaError>;
    async fn edit_monitor(&self, id: u64, request: &MonitorRequest) -> Result<(), UptimeKumaError>;
    async fn delete_monitor(&self, id: u64) -> Result<(), UptimeKumaError>;

    // Tag Operations
    async fn list_tags(&self) -> Result<Vec<Tag>, UptimeKumaError>;
    async fn create_tag(&self, name: &str, color: &str) -> Result<Tag, UptimeKumaError>;
    async fn add_monitor_tag(&self, monitor_id: u64, tag_id: u64) -> Result<(), UptimeKumaError>;
    async fn delete_monitor_tag(&self, monitor_id: u64, tag_id: u64) -> Result<(), UptimeKumaError>;

    /// Liveness probe: the service is considered reachable when listing monitors succeeds.
    async fn health_check(&self) -> Result<(), UptimeKumaError> {
        self.list_monitors().await.map(|_| ())
    }
}
