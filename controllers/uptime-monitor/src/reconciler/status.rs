//! Status aggregation and persistence decisions.

use chrono::{DateTime, Utc};
use crds::{
    Condition, ConditionReason, ConditionStatus, MonitorStatus, READY_CONDITION,
    UptimeMonitorStatus,
};

/// Ready condition for a completed enabled pass.
#[must_use]
pub fn aggregate(monitors: &[MonitorStatus], now: DateTime<Utc>) -> Condition {
    let failed = monitors.iter().filter(|m| m.status.is_failure()).count();
    if failed > 0 {
        Condition::ready(
            ConditionStatus::False,
            ConditionReason::SyncFailed,
            format!("{failed} monitor(s) failed to sync"),
            now,
        )
    } else {
        Condition::ready(
            ConditionStatus::True,
            ConditionReason::SyncSuccessful,
            format!("All {} monitor(s) synced successfully", monitors.len()),
            now,
        )
    }
}

#[must_use]
pub fn disabled(now: DateTime<Utc>) -> Condition {
    Condition::ready(
        ConditionStatus::False,
        ConditionReason::Disabled,
        "UptimeMonitor is disabled",
        now,
    )
}

/// Terminal condition for a pass that aborted before touching any monitor.
#[must_use]
pub fn reconciliation_error(message: impl Into<String>, now: DateTime<Utc>) -> Condition {
    Condition::ready(
        ConditionStatus::False,
        ConditionReason::ReconciliationError,
        message,
        now,
    )
}

/// Build the status to persist.
///
/// The Ready condition keeps the prior `lastTransitionTime` when its status
/// value did not change. Conditions of any other type are carried over.
#[must_use]
pub fn assemble(
    prior: Option<&UptimeMonitorStatus>,
    mut ready: Condition,
    monitors: Vec<MonitorStatus>,
    now: DateTime<Utc>,
) -> UptimeMonitorStatus {
    let mut conditions = Vec::new();
    if let Some(prior) = prior {
        if let Some(previous) = prior.ready_condition() {
            if previous.status == ready.status {
                ready.last_transition_time = previous.last_transition_time;
            }
        }
        conditions.extend(
            prior
                .conditions
                .iter()
                .filter(|c| c.r#type != READY_CONDITION)
                .cloned(),
        );
    }
    conditions.insert(0, ready);

    UptimeMonitorStatus {
        conditions,
        monitors,
        last_sync: Some(now),
        observed_generation: prior.and_then(|p| p.observed_generation),
    }
}

/// True when `next` differs from `prior` in anything other than timestamps.
#[must_use]
pub fn status_needs_update(
    prior: Option<&UptimeMonitorStatus>,
    next: &UptimeMonitorStatus,
) -> bool {
    let Some(prior) = prior else {
        return true;
    };

    let condition_key = |c: &Condition| {
        (c.r#type.clone(), c.status, c.reason.clone(), c.message.clone())
    };
    let monitor_key =
        |m: &MonitorStatus| (m.name.clone(), m.url.clone(), m.uptime_kuma_id, m.status);

    prior.observed_generation != next.observed_generation
        || !prior.conditions.iter().map(condition_key).eq(next.conditions.iter().map(condition_key))
        || !prior.monitors.iter().map(monitor_key).eq(next.monitors.iter().map(monitor_key))
}
