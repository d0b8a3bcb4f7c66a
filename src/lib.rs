// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod dedup;
pub mod feed;
pub mod format;
pub mod metrics;
pub mod notify;
pub mod poller;
pub mod stats;
pub mod status;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::config::{Subject, TrackerConfig};
pub use crate::poller::{CycleReport, Poller, PollerBuilder};
pub use crate::status::{CyclePhase, CycleStatus, StatusBoard};
