//! Monitor reconciliation.
//!
//! ## Lifecycle
//!
//! ```text
//! Absent ──plan──► Planned ──create──► Created ──overlay──► Synced
//!                                                            │  ▲
//!                                                    update  │  │ overlay
//!                                                            ▼  │
//!                                                          Updated
//!
//! Synced ──delete──► Deleted
//! Synced ──read (not found)──► Absent
//! ```
//!
//! Every operation is one request/response cycle against a
//! [`MonitorTransport`](crate::transport::MonitorTransport). Failures never
//! produce a partially updated model: callers keep their previous state.

mod lifecycle;

pub use lifecycle::*;
