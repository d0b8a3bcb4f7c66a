// src/stats/mod.rs
//! Season-to-date aggregate statistics and their time-bounded cache.

pub mod cache;
pub mod statsapi;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Subject;

pub use cache::AggregateCache;

/// Flat season line for one batter.
///
/// Missing values are already defaulted when a snapshot is built: counters to
/// `0`, rate stats to `""`. `captured_at` is `None` only for the empty
/// snapshot, which is what callers get before any refresh has succeeded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub avg: String,
    pub obp: String,
    pub slg: String,
    pub ops: String,
    pub babip: String,
    pub iso: String,
    pub home_runs: u32,
    pub rbi: u32,
    pub hits: u32,
    pub walks: u32,
    pub strikeouts: u32,
    pub plate_appearances: u32,
    pub captured_at: Option<DateTime<Utc>>,
}

impl AggregateSnapshot {
    /// The one presence test the formatter needs.
    pub fn has_data(&self) -> bool {
        self.captured_at.is_some()
    }

    /// "avg/obp/slg"
    pub fn slash_line(&self) -> String {
        format!("{}/{}/{}", self.avg, self.obp, self.slg)
    }
}

#[async_trait::async_trait]
pub trait StatsProvider: Send + Sync {
    /// Season-to-date hitting line. The returned snapshot's `captured_at` is
    /// overwritten by the cache.
    async fn season_stats(&self, subject: &Subject, season: i32) -> Result<AggregateSnapshot>;
    fn name(&self) -> &'static str;
}
