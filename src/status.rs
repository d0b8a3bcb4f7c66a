//! status.rs: last-cycle status shared between the poller and the HTTP surface.
//!
//! The poller is the only writer. Every update builds a fresh [`CycleStatus`]
//! and swaps the `Arc` in one short write; readers clone the `Arc` and never
//! see a partially updated value.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Mode;

/// Where the poller currently is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CyclePhase {
    #[default]
    Idle,
    Fetching,
    Filtering,
    Enriching,
    Formatting,
    Publishing,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleStatus {
    pub mode: Mode,
    pub subject: String,
    pub phase: CyclePhase,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_outcome: String,
    /// Event keys ever marked processed.
    pub processed_total: usize,
    pub published_total: u64,
    pub publish_failures_total: u64,
}

impl CycleStatus {
    fn initial(mode: Mode, subject: String) -> Self {
        Self {
            mode,
            subject,
            phase: CyclePhase::Idle,
            last_checked_at: None,
            last_outcome: "Initializing...".to_string(),
            processed_total: 0,
            published_total: 0,
            publish_failures_total: 0,
        }
    }

    /// One-line human readable status, as shown on the index page.
    pub fn summary(&self) -> String {
        match self.last_checked_at {
            None => "Initializing...".to_string(),
            Some(ts) => format!(
                "Last check: {} - {}",
                ts.format("%Y-%m-%d %H:%M:%S"),
                self.last_outcome
            ),
        }
    }
}

#[derive(Debug)]
pub struct StatusBoard {
    current: RwLock<Arc<CycleStatus>>,
}

impl StatusBoard {
    pub fn new(mode: Mode, subject: impl Into<String>) -> Self {
        Self {
            current: RwLock::new(Arc::new(CycleStatus::initial(mode, subject.into()))),
        }
    }

    /// Consistent view of the latest status.
    pub fn snapshot(&self) -> Arc<CycleStatus> {
        let guard = self.current.read().unwrap_or_else(|p| p.into_inner());
        Arc::clone(&guard)
    }

    /// Copy the current status, let `f` edit the copy, publish it.
    pub fn update(&self, f: impl FnOnce(&mut CycleStatus)) {
        let mut next = (*self.snapshot()).clone();
        f(&mut next);
        let mut guard = self.current.write().unwrap_or_else(|p| p.into_inner());
        *guard = Arc::new(next);
    }

    pub fn set_phase(&self, phase: CyclePhase) {
        self.update(|s| s.phase = phase);
    }
}
