//! Create / Read / Update / Delete / Import for one monitor.

use std::fmt;
use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::defaults::with_defaults;
use crate::error::{Error, Result};
use crate::model::MonitorData;
use crate::projection::{overlay, project, to_remote};
use crate::transport::MonitorTransport;
use crate::types::Monitor;
use crate::validation::{validate_payload, validate_plan, ValidationMode};

/// Where a monitor is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    Absent,
    Planned,
    Created,
    Synced,
    Updated,
    Deleted,
}

impl ResourceState {
    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: ResourceState) -> bool {
        use ResourceState::*;
        matches!(
            (self, next),
            (Absent, Planned)
                | (Planned, Created)
                | (Planned, Absent)
                | (Created, Synced)
                | (Synced, Updated)
                | (Synced, Synced)
                | (Synced, Absent)
                | (Synced, Deleted)
                | (Updated, Synced)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == ResourceState::Deleted
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceState::Absent => "absent",
            ResourceState::Planned => "planned",
            ResourceState::Created => "created",
            ResourceState::Synced => "synced",
            ResourceState::Updated => "updated",
            ResourceState::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

/// Result of refreshing a monitor.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// The monitor exists; here is its current state.
    Synced(MonitorData),
    /// The service no longer has the monitor. The caller should drop its
    /// state so the next apply creates it again.
    Absent,
}

impl ReadOutcome {
    pub fn state(&self) -> ResourceState {
        match self {
            ReadOutcome::Synced(_) => ResourceState::Synced,
            ReadOutcome::Absent => ResourceState::Absent,
        }
    }

    pub fn into_state(self) -> Option<MonitorData> {
        match self {
            ReadOutcome::Synced(data) => Some(data),
            ReadOutcome::Absent => None,
        }
    }
}

/// Drives monitor lifecycle operations against a transport.
pub struct MonitorReconciler<T> {
    transport: T,
}

impl<T: MonitorTransport> MonitorReconciler<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Create a monitor from a plan.
    ///
    /// Defaults form the base layer, the plan is projected on top, and the
    /// service's answer becomes the new state.
    pub async fn create(&self, plan: &MonitorData, cancel: &CancellationToken) -> Result<MonitorData> {
        validate_plan(plan, ValidationMode::Create)?;

        let payload = to_remote(plan, with_defaults(Monitor::default()))?;
        validate_payload(&payload)?;
        debug!("Creating monitor '{}'", payload.name);

        let (id, created) = guarded(cancel, self.transport.create(&payload)).await?;
        let state = project(&created)?;
        if state.remote_id() != Some(id.to_string().as_str()) {
            return Err(Error::Decode(format!(
                "create returned id {} but the monitor payload disagrees",
                id
            )));
        }

        info!("Created monitor {} ('{}')", id, created.name);
        Ok(state)
    }

    /// Refresh a state from the service.
    pub async fn read(&self, state: &MonitorData, cancel: &CancellationToken) -> Result<ReadOutcome> {
        let id = state_id(state)?;

        let Some(remote) = guarded(cancel, self.transport.fetch(id)).await? else {
            warn!("Monitor {} no longer exists", id);
            return Ok(ReadOutcome::Absent);
        };

        let mut refreshed = state.clone();
        overlay(&remote, &mut refreshed)?;
        debug!("Refreshed monitor {}", id);
        Ok(ReadOutcome::Synced(refreshed))
    }

    /// Apply a plan to an existing monitor.
    ///
    /// The monitor as the service has it now is the base; defaults are not
    /// applied again.
    pub async fn update(
        &self,
        plan: &MonitorData,
        state: &MonitorData,
        cancel: &CancellationToken,
    ) -> Result<MonitorData> {
        validate_plan(plan, ValidationMode::Update { state })?;
        let id = state_id(state)?;

        let current = guarded(cancel, self.transport.fetch(id))
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let payload = to_remote(plan, current)?;
        validate_payload(&payload)?;

        let updated = guarded(cancel, self.transport.update(id, &payload)).await?;
        let next = project(&updated)?;

        info!("Updated monitor {}", id);
        Ok(next)
    }

    /// Delete the monitor behind a state. A monitor that is already gone
    /// counts as deleted.
    pub async fn delete(&self, state: &MonitorData, cancel: &CancellationToken) -> Result<()> {
        let id = state_id(state)?;

        match guarded(cancel, self.transport.delete(id)).await {
            Ok(()) => {
                info!("Deleted monitor {}", id);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!("Monitor {} was already deleted", id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Adopt an existing monitor by its id. No plan is involved.
    pub async fn import(&self, id: &str, cancel: &CancellationToken) -> Result<MonitorData> {
        let state = self.lookup(id, cancel).await?;
        info!("Imported monitor {}", id);
        Ok(state)
    }

    /// Read-only view of a monitor by id.
    pub async fn lookup(&self, id: &str, cancel: &CancellationToken) -> Result<MonitorData> {
        let id = parse_id(id)?;
        let remote = guarded(cancel, self.transport.fetch(id))
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let mut state = MonitorData::default();
        overlay(&remote, &mut state)?;
        Ok(state)
    }

    /// Every monitor of the project.
    pub async fn list(&self, cancel: &CancellationToken) -> Result<Vec<MonitorData>> {
        let monitors = guarded(cancel, self.transport.list()).await?;
        monitors.iter().map(project).collect()
    }
}

/// Run a transport call unless `cancel` fires first.
async fn guarded<F, R>(cancel: &CancellationToken, call: F) -> Result<R>
where
    F: Future<Output = Result<R>>,
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = call => result,
    }
}

fn parse_id(id: &str) -> Result<u64> {
    id.trim()
        .parse()
        .map_err(|_| Error::validation(format!("monitor id must be a number, got '{}'", id)))
}

fn state_id(state: &MonitorData) -> Result<u64> {
    let id = state
        .remote_id()
        .ok_or_else(|| Error::validation("state has no monitor id"))?;
    parse_id(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::MetricData;
    use crate::transport::InMemoryTransport;
    use crate::types::{MonitorStatus, MonitorType, Tolerance};
    use crate::value::Value;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn plan() -> MonitorData {
        MonitorData {
            name: Value::Known("tts_p90".into()),
            monitor_type: Value::Known(MonitorType::Metric),
            query: Value::Known("p90($spans) as p90 | where _name = 'stt:finalize'".into()),
            metrics: Value::Known(vec![Value::Known(MetricData::new(
                "uptrace_tracing_spans",
                "$spans",
            ))]),
            min_allowed_value: Value::Null,
            max_allowed_value: Value::Known(10000.0),
            ..Default::default()
        }
    }

    fn reconciler() -> MonitorReconciler<InMemoryTransport> {
        MonitorReconciler::new(InMemoryTransport::starting_at(3255, 3592))
    }

    #[tokio::test]
    async fn test_create_end_to_end() {
        let r = reconciler();
        let cancel = CancellationToken::new();

        let state = r.create(&plan(), &cancel).await.unwrap();

        assert_eq!(state.id, Value::Known("3592".into()));
        assert_eq!(state.status, Value::Known(MonitorStatus::Active));
        assert_eq!(state.project_id, Value::Known(3255));
        assert_eq!(state.max_allowed_value, Value::Known(10000.0));
        assert_eq!(state.min_allowed_value, Value::Null);
        assert_eq!(state.tolerance, Value::Known(Tolerance::Medium));
        assert_eq!(state.metrics, plan().metrics);
    }

    #[tokio::test]
    async fn test_validation_failure_makes_no_call() {
        let r = reconciler();
        let mut p = plan();
        p.max_allowed_value = Value::Null;

        let err = r.create(&p, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        assert_eq!(r.transport().calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_threshold_conflicts_with_default() {
        let r = reconciler();
        let mut p = plan();
        // min would come from the default (0.0) while max is set.
        p.min_allowed_value = Value::Unknown;

        let err = r.create(&p, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        assert_eq!(r.transport().calls(), 0);
    }

    #[tokio::test]
    async fn test_create_transport_failure() {
        let r = reconciler();
        r.transport().fail_next_with_status(500);

        let err = r.create(&plan(), &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
        assert!(r.transport().stored(3592).is_none());
    }

    #[tokio::test]
    async fn test_read_is_idempotent() {
        let r = reconciler();
        let cancel = CancellationToken::new();
        let state = r.create(&plan(), &cancel).await.unwrap();

        let first = r.read(&state, &cancel).await.unwrap().into_state().unwrap();
        let second = r.read(&first, &cancel).await.unwrap().into_state().unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_read_missing_monitor_is_absent() {
        let r = reconciler();
        let cancel = CancellationToken::new();
        let state = r.create(&plan(), &cancel).await.unwrap();
        r.transport().forget(3592);

        let outcome = r.read(&state, &cancel).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Absent);
        assert_eq!(outcome.state(), ResourceState::Absent);
    }

    #[tokio::test]
    async fn test_update_uses_current_monitor_as_base() {
        let r = reconciler();
        let cancel = CancellationToken::new();
        let mut create_plan = plan();
        create_plan.tolerance = Value::Known(Tolerance::High);
        let state = r.create(&create_plan, &cancel).await.unwrap();

        // Tolerance is left Unknown: the current High survives, no reset to Medium.
        let mut next = plan();
        next.max_allowed_value = Value::Known(20000.0);
        let updated = r.update(&next, &state, &cancel).await.unwrap();

        assert_eq!(updated.id, state.id);
        assert_eq!(updated.max_allowed_value, Value::Known(20000.0));
        assert_eq!(updated.tolerance, Value::Known(Tolerance::High));
        assert_eq!(updated.created_at, state.created_at);
    }

    #[tokio::test]
    async fn test_update_rejects_type_change_before_network() {
        let r = reconciler();
        let cancel = CancellationToken::new();
        let state = r.create(&plan(), &cancel).await.unwrap();
        let calls = r.transport().calls();

        let next = MonitorData {
            monitor_type: Value::Known(MonitorType::Error),
            min_allowed_value: Value::Unknown,
            max_allowed_value: Value::Unknown,
            ..plan()
        };
        let err = r.update(&next, &state, &cancel).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        assert_eq!(r.transport().calls(), calls);
    }

    #[tokio::test]
    async fn test_update_failure_keeps_remote_unchanged() {
        let r = reconciler();
        let cancel = CancellationToken::new();
        let state = r.create(&plan(), &cancel).await.unwrap();
        let before = r.transport().stored(3592);

        let mut next = plan();
        next.name = Value::Known("renamed".into());
        let transport = r.transport();
        transport.fail_next_with_transport_error("connection reset");
        let err = r.update(&next, &state, &cancel).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TransportFailure);
        assert_eq!(transport.stored(3592), before);
    }

    #[tokio::test]
    async fn test_delete_and_delete_again() {
        let r = reconciler();
        let cancel = CancellationToken::new();
        let state = r.create(&plan(), &cancel).await.unwrap();

        r.delete(&state, &cancel).await.unwrap();
        assert!(r.transport().stored(3592).is_none());
        r.delete(&state, &cancel).await.unwrap();
    }

    #[tokio::test]
    async fn test_import_builds_state_without_plan() {
        let r = reconciler();
        let cancel = CancellationToken::new();
        let created = r.create(&plan(), &cancel).await.unwrap();

        let imported = r.import("3592", &cancel).await.unwrap();
        assert_eq!(imported, created);

        let err = r.import("9999", &cancel).await.unwrap_err();
        assert!(err.is_not_found());
        let err = r.import("tts_p90", &cancel).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    }

    #[tokio::test]
    async fn test_cancelled_operation_is_transport_failure() {
        let r = reconciler();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = r.create(&plan(), &cancel).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
        assert_eq!(r.transport().calls(), 0);
    }

    /// Delegates to an in-memory store, but `create` and `update` never
    /// finish once `stall` is set.
    struct StallingTransport {
        inner: InMemoryTransport,
        stall: std::sync::atomic::AtomicBool,
        entered: Notify,
    }

    impl StallingTransport {
        fn new() -> Self {
            Self {
                inner: InMemoryTransport::starting_at(3255, 3592),
                stall: std::sync::atomic::AtomicBool::new(false),
                entered: Notify::new(),
            }
        }

        async fn hang_if_stalled(&self) {
            if self.stall.load(std::sync::atomic::Ordering::SeqCst) {
                self.entered.notify_one();
                std::future::pending::<()>().await;
            }
        }
    }

    #[async_trait]
    impl MonitorTransport for StallingTransport {
        async fn fetch(&self, id: u64) -> Result<Option<Monitor>> {
            self.inner.fetch(id).await
        }

        async fn create(&self, monitor: &Monitor) -> Result<(u64, Monitor)> {
            self.hang_if_stalled().await;
            self.inner.create(monitor).await
        }

        async fn update(&self, id: u64, monitor: &Monitor) -> Result<Monitor> {
            self.hang_if_stalled().await;
            self.inner.update(id, monitor).await
        }

        async fn delete(&self, id: u64) -> Result<()> {
            self.inner.delete(id).await
        }

        async fn list(&self) -> Result<Vec<Monitor>> {
            self.inner.list().await
        }
    }

    fn cancel_once_entered(transport: &Arc<StallingTransport>, cancel: &CancellationToken) {
        let transport = Arc::clone(transport);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            transport.entered.notified().await;
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
        });
    }

    #[tokio::test]
    async fn test_cancel_during_update_keeps_state() {
        let transport = Arc::new(StallingTransport::new());
        let r = MonitorReconciler::new(Arc::clone(&transport));
        let cancel = CancellationToken::new();
        let state = r.create(&plan(), &cancel).await.unwrap();
        let snapshot = state.clone();
        let before = transport.inner.stored(3592);

        let mut next = plan();
        next.name = Value::Known("renamed".into());
        transport.stall.store(true, std::sync::atomic::Ordering::SeqCst);
        cancel_once_entered(&transport, &cancel);

        let err = tokio::time::timeout(Duration::from_secs(5), r.update(&next, &state, &cancel))
            .await
            .expect("update should return once cancelled")
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
        assert_eq!(state, snapshot);
        assert_eq!(transport.inner.stored(3592), before);
    }

    #[tokio::test]
    async fn test_cancel_during_create_stores_nothing() {
        let transport = Arc::new(StallingTransport::new());
        transport.stall.store(true, std::sync::atomic::Ordering::SeqCst);
        let r = MonitorReconciler::new(Arc::clone(&transport));
        let cancel = CancellationToken::new();
        cancel_once_entered(&transport, &cancel);

        let err = tokio::time::timeout(Duration::from_secs(5), r.create(&plan(), &cancel))
            .await
            .expect("create should return once cancelled")
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert!(transport.inner.stored(3592).is_none());
    }

    #[tokio::test]
    async fn test_list_projects_every_monitor() {
        let r = reconciler();
        let cancel = CancellationToken::new();
        r.create(&plan(), &cancel).await.unwrap();
        let mut other = plan();
        other.name = Value::Known("other".into());
        r.create(&other, &cancel).await.unwrap();

        let all = r.list(&cancel).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].id, Value::Known("3593".into()));
    }

    #[test]
    fn test_state_transitions() {
        use ResourceState::*;
        assert!(Absent.can_transition_to(Planned));
        assert!(Synced.can_transition_to(Absent));
        assert!(Updated.can_transition_to(Synced));
        assert!(!Deleted.can_transition_to(Synced));
        assert!(!Absent.can_transition_to(Synced));
        assert!(Deleted.is_terminal());
    }
}
