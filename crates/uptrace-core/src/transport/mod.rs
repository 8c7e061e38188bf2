//! Transport collaborator interface.
//!
//! The reconciler only talks to Uptrace through this trait. The HTTP
//! implementation lives in [`crate::client`]; [`InMemoryTransport`] keeps
//! monitors in a map and is used by tests and dry runs.

mod memory;

pub use memory::InMemoryTransport;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Monitor;

/// Remote monitor CRUD.
///
/// Implementations report a missing monitor as `Ok(None)` from `fetch` and
/// as [`crate::Error::NotFound`] everywhere else.
#[async_trait]
pub trait MonitorTransport: Send + Sync {
    /// Fetch one monitor.
    async fn fetch(&self, id: u64) -> Result<Option<Monitor>>;

    /// Create a monitor and return its assigned id with the stored monitor.
    async fn create(&self, monitor: &Monitor) -> Result<(u64, Monitor)>;

    /// Replace a monitor's settings.
    async fn update(&self, id: u64, monitor: &Monitor) -> Result<Monitor>;

    async fn delete(&self, id: u64) -> Result<()>;

    /// All monitors of the project.
    async fn list(&self) -> Result<Vec<Monitor>>;
}

#[async_trait]
impl<T: MonitorTransport + ?Sized> MonitorTransport for std::sync::Arc<T> {
    async fn fetch(&self, id: u64) -> Result<Option<Monitor>> {
        (**self).fetch(id).await
    }

    async fn create(&self, monitor: &Monitor) -> Result<(u64, Monitor)> {
        (**self).create(monitor).await
    }

    async fn update(&self, id: u64, monitor: &Monitor) -> Result<Monitor> {
        (**self).update(id, monitor).await
    }

    async fn delete(&self, id: u64) -> Result<()> {
        (**self).delete(id).await
    }

    async fn list(&self) -> Result<Vec<Monitor>> {
        (**self).list().await
    }
}
