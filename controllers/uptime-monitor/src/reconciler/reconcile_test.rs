//! Unit tests for a full reconciliation pass

#[cfg(test)]
mod tests {
    use super::super::identity::ResourceIdentity;
    use super::super::{CleanupSummary, Reconciler};
    use crate::test_utils::*;
    use crds::{
        ConditionReason, ConditionStatus, MonitorState, UptimeMonitorSpec, UptimeMonitorStatus,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uptime_kuma_client::{
        MockUptimeKumaClient, Monitor, MonitorRequest, MonitorSettings, Operation, Tag,
        UptimeKumaClientTrait, UptimeKumaError,
    };

    fn uid_tag() -> String {
        format!("crd_uid:{TEST_UID}")
    }

    fn tag_names(mock: &MockUptimeKumaClient, name: &str) -> Vec<String> {
        mock.monitor_by_name(name)
            .map(|m| m.tag_names().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn main_api_spec(url: &str) -> UptimeMonitorSpec {
        create_test_spec(Some("prod,api"), vec![endpoint("main-api", url)])
    }

    #[tokio::test]
    async fn test_create_against_empty_service() {
        let mock = MockUptimeKumaClient::default();
        let reconciler = create_test_reconciler(&mock);

        let status = reconciler
            .reconcile(&test_identity(), &main_api_spec("https://api.example.com/health"), None)
            .await;

        assert_eq!(status.monitors.len(), 1);
        let outcome = &status.monitors[0];
        assert_eq!(outcome.name, "main-api");
        assert_eq!(outcome.url, "https://api.example.com/health");
        assert_eq!(outcome.status, MonitorState::Created);
        assert!(outcome.uptime_kuma_id.is_some());

        let ready = status.ready_condition().unwrap();
        assert_eq!(ready.status, ConditionStatus::True);
        assert!(ready.has_reason(ConditionReason::SyncSuccessful));
        assert_eq!(ready.message, "All 1 monitor(s) synced successfully");
        assert!(status.last_sync.is_some());

        assert_eq!(
            tag_names(&mock, "production/app-monitors/main-api"),
            vec![TEST_CLUSTER.to_string(), "prod".to_string(), "api".to_string(), uid_tag()]
        );
        let created = mock.created_requests();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].monitor_type, "http");
        assert_eq!(created[0].interval, MonitorSettings::default().interval);
    }

    #[tokio::test]
    async fn test_second_pass_is_idempotent() {
        let mock = MockUptimeKumaClient::default();
        let reconciler = create_test_reconciler(&mock);
        let spec = create_test_spec(
            Some("prod"),
            vec![
                endpoint("main-api", "https://api.example.com/health"),
                endpoint_with_tags("admin", "https://admin.example.com", "critical"),
            ],
        );

        let first = reconciler.reconcile(&test_identity(), &spec, None).await;
        mock.reset_calls();
        let second = reconciler.reconcile(&test_identity(), &spec, Some(&first)).await;

        assert!(second.monitors.iter().all(|m| m.status == MonitorState::Ready));
        assert_eq!(mock.mutation_calls(), 0);
        assert_eq!(mock.calls(Operation::ListTags), 0);
        let ids = |s: &UptimeMonitorStatus| {
            s.monitors.iter().map(|m| m.uptime_kuma_id).collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(
            first.conditions[0].last_transition_time,
            second.conditions[0].last_transition_time
        );
    }

    #[tokio::test]
    async fn test_url_change_updates_in_place() {
        let mock = MockUptimeKumaClient::default();
        let id = mock.add_monitor(
            "production/app-monitors/main-api",
            "https://api.example.com/health",
            &[TEST_CLUSTER, "prod", "api", &uid_tag()],
        );
        let reconciler = create_test_reconciler(&mock);

        let status = reconciler
            .reconcile(&test_identity(), &main_api_spec("https://api.example.com/v2/health"), None)
            .await;

        assert_eq!(mock.calls(Operation::EditMonitor), 1);
        assert_eq!(mock.calls(Operation::CreateMonitor), 0);
        assert_eq!(mock.calls(Operation::DeleteMonitor), 0);
        assert_eq!(status.monitors[0].status, MonitorState::Updated);
        assert_eq!(status.monitors[0].url, "https://api.example.com/v2/health");
        assert_eq!(status.monitors[0].uptime_kuma_id, Some(id));
        assert_eq!(
            mock.monitor_by_name("production/app-monitors/main-api").map(|m| m.url),
            Some("https://api.example.com/v2/health".to_string())
        );
    }

    #[tokio::test]
    async fn test_tag_change_alone_triggers_update() {
        let mock = MockUptimeKumaClient::default();
        mock.add_monitor(
            "production/app-monitors/main-api",
            "https://api.example.com/health",
            &[TEST_CLUSTER, "staging", &uid_tag()],
        );
        let reconciler = create_test_reconciler(&mock);

        let status = reconciler
            .reconcile(&test_identity(), &main_api_spec("https://api.example.com/health"), None)
            .await;

        assert_eq!(status.monitors[0].status, MonitorState::Updated);
        let mut tags = tag_names(&mock, "production/app-monitors/main-api");
        tags.sort();
        let mut expected =
            vec![TEST_CLUSTER.to_string(), "prod".to_string(), "api".to_string(), uid_tag()];
        expected.sort();
        assert_eq!(tags, expected);
    }

    #[tokio::test]
    async fn test_override_replaces_default_tags() {
        let mock = MockUptimeKumaClient::default();
        let reconciler = create_test_reconciler(&mock);
        let spec = create_test_spec(
            Some("default,tag"),
            vec![
                endpoint("plain", "https://plain.example.com"),
                endpoint_with_tags(
                    "special",
                    "https://special.example.com",
                    "critical, high-priority",
                ),
            ],
        );

        reconciler.reconcile(&test_identity(), &spec, None).await;

        assert_eq!(mock.calls(Operation::CreateMonitor), 2);
        assert_eq!(
            tag_names(&mock, "production/app-monitors/plain"),
            vec![TEST_CLUSTER.to_string(), "default".to_string(), "tag".to_string(), uid_tag()]
        );
        assert_eq!(
            tag_names(&mock, "production/app-monitors/special"),
            vec![
                TEST_CLUSTER.to_string(),
                "critical".to_string(),
                "high-priority".to_string(),
                uid_tag()
            ]
        );
    }

    #[tokio::test]
    async fn test_undeclared_monitor_is_swept() {
        let mock = MockUptimeKumaClient::default();
        mock.add_monitor("production/app-monitors/old", "https://old.example.com", &[&uid_tag()]);
        mock.add_monitor(
            "production/other/old",
            "https://old.example.com",
            &["crd_uid:someone-else"],
        );
        let reconciler = create_test_reconciler(&mock);
        let spec = create_test_spec(None, vec![endpoint("new", "https://new.example.com")]);

        let status = reconciler.reconcile(&test_identity(), &spec, None).await;

        assert_eq!(status.monitors.len(), 1);
        assert_eq!(status.monitors[0].status, MonitorState::Created);
        assert!(mock.monitor_by_name("production/app-monitors/new").is_some());
        assert!(mock.monitor_by_name("production/app-monitors/old").is_none());
        assert!(mock.monitor_by_name("production/other/old").is_some());
    }

    #[tokio::test]
    async fn test_failed_sweep_delete_keeps_outcomes_and_continues() {
        let mock = MockUptimeKumaClient::default();
        mock.add_monitor("production/app-monitors/old-a", "https://a.example.com", &[&uid_tag()]);
        mock.add_monitor("production/app-monitors/old-b", "https://b.example.com", &[&uid_tag()]);
        mock.fail(Operation::DeleteMonitor);
        let reconciler = create_test_reconciler(&mock);
        let spec = create_test_spec(None, vec![endpoint("new", "https://new.example.com")]);

        let status = reconciler.reconcile(&test_identity(), &spec, None).await;

        assert_eq!(mock.calls(Operation::DeleteMonitor), 2);
        assert_eq!(status.monitors.len(), 1);
        assert_eq!(status.monitors[0].status, MonitorState::Created);
        let ready = status.ready_condition().unwrap();
        assert_eq!(ready.status, ConditionStatus::True);
        assert!(ready.has_reason(ConditionReason::SyncSuccessful));
        assert!(mock.monitor_by_name("production/app-monitors/old-a").is_some());
        assert!(mock.monitor_by_name("production/app-monitors/old-b").is_some());
    }

    #[tokio::test]
    async fn test_rename_is_delete_plus_create() {
        let mock = MockUptimeKumaClient::default();
        let old_id = mock.add_monitor(
            "production/app-monitors/api",
            "https://api.example.com",
            &[TEST_CLUSTER, &uid_tag()],
        );
        let reconciler = create_test_reconciler(&mock);
        let spec = create_test_spec(None, vec![endpoint("api-v2", "https://api.example.com")]);

        let status = reconciler.reconcile(&test_identity(), &spec, None).await;

        assert_eq!(mock.calls(Operation::CreateMonitor), 1);
        assert_eq!(mock.calls(Operation::DeleteMonitor), 1);
        assert_eq!(mock.calls(Operation::EditMonitor), 0);
        assert_eq!(status.monitors[0].status, MonitorState::Created);
        assert_ne!(status.monitors[0].uptime_kuma_id, Some(old_id));
    }

    #[tokio::test]
    async fn test_monitor_without_uid_tag_is_not_matched() {
        let mock = MockUptimeKumaClient::default();
        mock.add_monitor(
            "production/app-monitors/main-api",
            "https://api.example.com/health",
            &["prod"],
        );
        let reconciler = create_test_reconciler(&mock);

        reconciler
            .reconcile(&test_identity(), &main_api_spec("https://api.example.com/health"), None)
            .await;

        // Ownership comes from the tag, never from the name
        assert_eq!(mock.calls(Operation::CreateMonitor), 1);
        assert_eq!(mock.calls(Operation::DeleteMonitor), 0);
        assert_eq!(mock.monitors().len(), 2);
    }

    #[tokio::test]
    async fn test_disabled_removes_every_owned_monitor() {
        let mock = MockUptimeKumaClient::default();
        mock.add_monitor("production/app-monitors/a", "https://a", &[&uid_tag()]);
        mock.add_monitor("production/app-monitors/b", "https://b", &[&uid_tag()]);
        mock.add_monitor("elsewhere", "https://c", &["crd_uid:other"]);
        let reconciler = create_test_reconciler(&mock);
        let spec = UptimeMonitorSpec { enabled: false, ..main_api_spec("https://a") };

        let status = reconciler.reconcile(&test_identity(), &spec, None).await;

        assert!(status.monitors.is_empty());
        assert_eq!(status.conditions[0].reason, ConditionReason::Disabled.as_str());
        assert_eq!(status.conditions[0].status, ConditionStatus::False);
        assert_eq!(mock.calls(Operation::CreateMonitor), 0);
        assert_eq!(mock.calls(Operation::EditMonitor), 0);
        let remaining: Vec<String> = mock.monitors().into_iter().map(|m| m.name).collect();
        assert_eq!(remaining, vec!["elsewhere".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_spec_makes_no_external_calls() {
        let mock = MockUptimeKumaClient::default();
        let reconciler = create_test_reconciler(&mock);
        let specs = [
            create_test_spec(None, vec![]),
            create_test_spec(None, vec![endpoint("a", "https://a"), endpoint("a", "https://b")]),
            create_test_spec(None, vec![endpoint("a", "api.example.com")]),
        ];

        for spec in &specs {
            let status = reconciler.reconcile(&test_identity(), spec, None).await;
            assert!(status.monitors.is_empty());
            assert_eq!(status.conditions[0].reason, ConditionReason::ReconciliationError.as_str());
            assert!(status.conditions[0].message.starts_with("Invalid spec: "));
        }
        assert_eq!(mock.calls(Operation::ListMonitors), 0);
        assert_eq!(mock.mutation_calls(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_service_aborts_pass() {
        let mock = MockUptimeKumaClient::default();
        mock.add_monitor("production/app-monitors/old", "https://old", &[&uid_tag()]);
        mock.set_unreachable(true);
        let reconciler = create_test_reconciler(&mock);

        let status = reconciler
            .reconcile(&test_identity(), &main_api_spec("https://api.example.com/health"), None)
            .await;

        assert!(status.monitors.is_empty());
        assert_eq!(status.conditions[0].reason, ConditionReason::ReconciliationError.as_str());
        assert!(status.conditions[0].message.starts_with("Uptime Kuma connection failed"));
        assert_eq!(mock.mutation_calls(), 0);
    }

    #[tokio::test]
    async fn test_per_endpoint_failure_does_not_abort_pass() {
        let mock = MockUptimeKumaClient::default();
        mock.add_monitor("production/app-monitors/old", "https://old", &[&uid_tag()]);
        mock.fail(Operation::CreateMonitor);
        let reconciler = create_test_reconciler(&mock);
        let spec =
            create_test_spec(None, vec![endpoint("a", "https://a"), endpoint("b", "https://b")]);

        let status = reconciler.reconcile(&test_identity(), &spec, None).await;

        assert_eq!(status.monitors.len(), 2);
        assert!(status.monitors.iter().all(|m| m.status == MonitorState::CreateFailed));
        assert!(status.monitors.iter().all(|m| m.uptime_kuma_id.is_none()));
        assert_eq!(mock.calls(Operation::DeleteMonitor), 1);
        let ready = status.ready_condition().unwrap();
        assert_eq!(ready.status, ConditionStatus::False);
        assert!(ready.has_reason(ConditionReason::SyncFailed));
        assert_eq!(ready.message, "2 monitor(s) failed to sync");
    }

    #[tokio::test]
    async fn test_failed_tag_reports_tags_incomplete() {
        let mock = MockUptimeKumaClient::default();
        mock.add_tag("api");
        mock.fail_tag("api");
        let reconciler = create_test_reconciler(&mock);

        let status = reconciler
            .reconcile(&test_identity(), &main_api_spec("https://api.example.com/health"), None)
            .await;

        assert_eq!(status.monitors[0].status, MonitorState::TagsIncomplete);
        assert!(status.monitors[0].uptime_kuma_id.is_some());
        assert_eq!(status.conditions[0].reason, ConditionReason::SyncFailed.as_str());

        // Next pass sees the missing tag and retries with a full update
        mock.reset_calls();
        let status = reconciler
            .reconcile(
                &test_identity(),
                &main_api_spec("https://api.example.com/health"),
                Some(&status),
            )
            .await;
        assert_eq!(mock.calls(Operation::EditMonitor), 1);
        assert_eq!(status.monitors[0].status, MonitorState::TagsIncomplete);
    }

    #[tokio::test]
    async fn test_listing_failure_degrades_to_create() {
        let mock = MockUptimeKumaClient::default();
        let reconciler = create_test_reconciler(&mock);
        let spec = main_api_spec("https://api.example.com/health");
        reconciler.reconcile(&test_identity(), &spec, None).await;

        // Health check passes, index listing fails: nothing is deleted
        mock.reset_calls();
        let flaky = FlakyList::new(mock.clone());
        let reconciler =
            Reconciler::new(flaky, Some(TEST_CLUSTER.to_string()), MonitorSettings::default());
        let status = reconciler.reconcile(&test_identity(), &spec, None).await;

        assert_eq!(mock.calls(Operation::DeleteMonitor), 0);
        assert_eq!(mock.calls(Operation::CreateMonitor), 1);
        assert_eq!(status.monitors[0].status, MonitorState::Created);
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let mock = MockUptimeKumaClient::default();
        mock.add_monitor("production/app-monitors/a", "https://a", &[&uid_tag()]);
        mock.add_monitor("production/app-monitors/b", "https://b", &[&uid_tag()]);
        let reconciler = create_test_reconciler(&mock);

        let first = reconciler.cleanup(TEST_UID).await.unwrap();
        assert_eq!(first, CleanupSummary { found: 2, deleted: 2, failed: 0 });

        let second = reconciler.cleanup(TEST_UID).await.unwrap();
        assert_eq!(second, CleanupSummary::default());
        assert!(mock.monitors().is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_counts_delete_failures() {
        let mock = MockUptimeKumaClient::default();
        mock.add_monitor("production/app-monitors/a", "https://a", &[&uid_tag()]);
        mock.fail(Operation::DeleteMonitor);
        let reconciler = create_test_reconciler(&mock);

        let summary = reconciler.cleanup(TEST_UID).await.unwrap();
        assert_eq!(summary, CleanupSummary { found: 1, deleted: 0, failed: 1 });

        mock.fail(Operation::ListMonitors);
        assert!(reconciler.cleanup(TEST_UID).await.is_err());
    }

    #[tokio::test]
    async fn test_blank_cluster_tag_is_omitted() {
        let mock = MockUptimeKumaClient::default();
        let reconciler =
            Reconciler::new(mock.clone(), Some("  ".to_string()), MonitorSettings::default());
        let identity = ResourceIdentity::new("ns", "cr", "u1");

        reconciler
            .reconcile(&identity, &create_test_spec(None, vec![endpoint("x", "http://x")]), None)
            .await;

        assert_eq!(tag_names(&mock, "ns/cr/x"), vec!["crd_uid:u1".to_string()]);
    }

    #[tokio::test]
    async fn test_identity_comes_from_object_metadata() {
        let mock = MockUptimeKumaClient::default();
        let reconciler = create_test_reconciler(&mock);
        let obj = create_test_uptime_monitor(
            TEST_NAME,
            TEST_NAMESPACE,
            TEST_UID,
            main_api_spec("https://api.example.com/health"),
        );

        let identity = ResourceIdentity::from_object(&obj).unwrap();
        assert_eq!(identity, test_identity());
        reconciler.reconcile(&identity, &obj.spec, obj.status.as_ref()).await;
        assert!(mock.monitor_by_name("production/app-monitors/main-api").is_some());

        let mut anonymous = obj.clone();
        anonymous.metadata.uid = None;
        assert!(ResourceIdentity::from_object(&anonymous).is_err());

        let mut unnamespaced = obj;
        unnamespaced.metadata.namespace = None;
        assert_eq!(ResourceIdentity::from_object(&unnamespaced).unwrap().namespace, "default");
    }

    /// Client whose second and later monitor listings fail
    struct FlakyList {
        inner: MockUptimeKumaClient,
        lists: AtomicUsize,
    }

    impl FlakyList {
        fn new(inner: MockUptimeKumaClient) -> Self {
            Self { inner, lists: AtomicUsize::new(0) }
        }
    }

    #[async_trait::async_trait]
    impl UptimeKumaClientTrait for FlakyList {
        fn base_url(&self) -> &str {
            self.inner.base_url()
        }

        async fn list_monitors(&self) -> Result<Vec<Monitor>, UptimeKumaError> {
            if self.lists.fetch_add(1, Ordering::SeqCst) == 0 {
                self.inner.list_monitors().await
            } else {
                Err(UptimeKumaError::Api("listing timed out".to_string()))
            }
        }

        async fn create_monitor(&self, request: &MonitorRequest) -> Result<u64, UptimeKumaError> {
            self.inner.create_monitor(request).await
        }

        async fn edit_monitor(
            &self,
            id: u64,
            request: &MonitorRequest,
        ) -> Result<(), UptimeKumaError> {
            self.inner.edit_monitor(id, request).await
        }

        async fn delete_monitor(&self, id: u64) -> Result<(), UptimeKumaError> {
            self.inner.delete_monitor(id).await
        }

        async fn list_tags(&self) -> Result<Vec<Tag>, UptimeKumaError> {
            self.inner.list_tags().await
        }

        async fn create_tag(&self, name: &str, color: &str) -> Result<Tag, UptimeKumaError> {
            self.inner.create_tag(name, color).await
        }

        async fn add_monitor_tag(
            &self,
            monitor_id: u64,
            tag_id: u64,
        ) -> Result<(), UptimeKumaError> {
            self.inner.add_monitor_tag(monitor_id, tag_id).await
        }

        async fn delete_monitor_tag(
            &self,
            monitor_id: u64,
            tag_id: u64,
        ) -> Result<(), UptimeKumaError> {
            self.inner.delete_monitor_tag(monitor_id, tag_id).await
        }
    }
}
