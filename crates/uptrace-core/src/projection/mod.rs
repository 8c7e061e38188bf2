//! Projections between the declarative and the remote monitor models.
//!
//! ```text
//!  plan (MonitorData) ──to_remote──► Monitor ──transport──► Uptrace
//!                                                              │
//!  state (MonitorData) ◄──overlay── Monitor ◄─────────────────┘
//! ```
//!
//! Both directions are pure. `to_remote` consumes its base and `overlay`
//! builds a fresh model before swapping it in, so a failed projection is
//! never observable by the caller.

mod overlay;
mod to_remote;

pub use overlay::{overlay, project};
pub use to_remote::to_remote;
