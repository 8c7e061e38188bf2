use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::MonitorTransport;
use crate::error::{Error, Result};
use crate::types::{Monitor, MonitorStatus};

/// Transport that keeps monitors in memory and behaves like the service:
/// it assigns ids, stamps server-owned fields and drops anything a request
/// body cannot carry.
pub struct InMemoryTransport {
    inner: Mutex<Inner>,
}

struct Inner {
    project_id: u64,
    next_id: u64,
    clock: u64,
    monitors: BTreeMap<u64, Monitor>,
    fail_next: Option<Failure>,
    calls: usize,
}

enum Failure {
    Status(u16),
    Transport(String),
}

impl InMemoryTransport {
    pub fn new(project_id: u64) -> Self {
        Self::starting_at(project_id, 1)
    }

    /// Ids are handed out from `first_id` upward.
    pub fn starting_at(project_id: u64, first_id: u64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                project_id,
                next_id: first_id,
                clock: 1_700_000_000_000,
                monitors: BTreeMap::new(),
                fail_next: None,
                calls: 0,
            }),
        }
    }

    /// Make the next call fail with an HTTP status.
    pub fn fail_next_with_status(&self, status: u16) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_next = Some(Failure::Status(status));
        }
    }

    /// Make the next call fail as if the connection dropped.
    pub fn fail_next_with_transport_error(&self, message: impl Into<String>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_next = Some(Failure::Transport(message.into()));
        }
    }

    /// Remove a monitor behind the caller's back.
    pub fn forget(&self, id: u64) -> bool {
        self.inner
            .lock()
            .map(|mut inner| inner.monitors.remove(&id).is_some())
            .unwrap_or(false)
    }

    /// Number of transport calls made so far.
    pub fn calls(&self) -> usize {
        self.inner.lock().map(|inner| inner.calls).unwrap_or(0)
    }

    pub fn stored(&self, id: u64) -> Option<Monitor> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.monitors.get(&id).cloned())
    }

    fn begin(&self) -> Result<MutexGuard<'_, Inner>> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| Error::Transport("in-memory store lock poisoned".into()))?;
        inner.calls += 1;
        match inner.fail_next.take() {
            Some(Failure::Status(404)) => Err(Error::NotFound("injected".into())),
            Some(Failure::Status(status)) => Err(Error::Status {
                status,
                body: "injected failure".into(),
            }),
            Some(Failure::Transport(message)) => Err(Error::Transport(message)),
            None => Ok(inner),
        }
    }
}

impl Inner {
    fn tick(&mut self) -> u64 {
        self.clock += 1_000;
        self.clock
    }
}

/// What survives a trip through a request body.
fn as_written(monitor: &Monitor) -> Result<Monitor> {
    let body = serde_json::to_value(monitor)?;
    Ok(serde_json::from_value(body)?)
}

#[async_trait]
impl MonitorTransport for InMemoryTransport {
    async fn fetch(&self, id: u64) -> Result<Option<Monitor>> {
        let inner = self.begin()?;
        Ok(inner.monitors.get(&id).cloned())
    }

    async fn create(&self, monitor: &Monitor) -> Result<(u64, Monitor)> {
        let mut stored = as_written(monitor)?;
        let mut inner = self.begin()?;

        let id = inner.next_id;
        inner.next_id += 1;
        let now = inner.tick();

        stored.id = Some(id);
        stored.project_id = Some(inner.project_id);
        stored.status = Some(MonitorStatus::Active);
        stored.error = Some(String::new());
        stored.created_at = Some(now);
        stored.updated_at = Some(now);

        inner.monitors.insert(id, stored.clone());
        Ok((id, stored))
    }

    async fn update(&self, id: u64, monitor: &Monitor) -> Result<Monitor> {
        let mut stored = as_written(monitor)?;
        let mut inner = self.begin()?;
        let now = inner.tick();

        let existing = inner
            .monitors
            .get(&id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        stored.id = Some(id);
        stored.project_id = existing.project_id;
        stored.status = existing.status;
        stored.error = existing.error.clone();
        stored.created_at = existing.created_at;
        stored.checked_at = existing.checked_at;
        stored.updated_at = Some(now);

        inner.monitors.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: u64) -> Result<()> {
        let mut inner = self.begin()?;
        inner
            .monitors
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<Monitor>> {
        let inner = self.begin()?;
        Ok(inner.monitors.values().cloned().collect())
    }
}
