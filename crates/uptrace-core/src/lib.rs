//! uptrace-core - Core library for Uptrace monitor reconciliation
//!
//! Keeps a declarative monitor description and the monitor stored by Uptrace
//! in agreement:
//!
//! - **value**: Known / Null / Unknown field values
//! - **types**: Remote monitor model as the Uptrace API speaks it
//! - **model**: Declarative monitor model
//! - **defaults**: Service defaults for new monitors
//! - **projection**: Declarative -> remote and remote -> declarative
//! - **validation**: Pre-flight plan and payload checks
//! - **transport**: Monitor CRUD interface plus an in-memory implementation
//! - **client**: HTTP transport (feature `client`)
//! - **reconcile**: Create / Read / Update / Delete / Import

#[cfg(feature = "client")]
pub mod client;
pub mod defaults;
pub mod error;
pub mod model;
pub mod projection;
pub mod reconcile;
pub mod transport;
pub mod types;
pub mod validation;
pub mod value;

// Re-export commonly used types
pub use error::{Diagnostic, Diagnostics, Error, ErrorKind, Result};
pub use model::{MetricData, MonitorData};
pub use reconcile::{MonitorReconciler, ReadOutcome, ResourceState};
pub use transport::{InMemoryTransport, MonitorTransport};
pub use types::Monitor;
pub use value::Value;
