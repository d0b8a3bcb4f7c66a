// src/stats/cache.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration as ChronoDuration, Utc};
use metrics::counter;

use super::{AggregateSnapshot, StatsProvider};
use crate::config::Subject;

/// Per-subject season stats with a fixed freshness window.
///
/// - Missing or expired snapshot → one refresh attempt.
/// - Refresh success replaces the snapshot (timestamp included) in one write.
/// - Refresh failure keeps serving whatever is cached, possibly the empty
///   default. Errors never reach the caller.
pub struct AggregateCache {
    provider: Arc<dyn StatsProvider>,
    freshness: ChronoDuration,
    entries: HashMap<u32, AggregateSnapshot>,
}

impl AggregateCache {
    /// `freshness_secs` of 0 is treated as 1 (always-refresh would hammer the API).
    pub fn new(provider: Arc<dyn StatsProvider>, freshness_secs: u64) -> Self {
        let secs = i64::try_from(freshness_secs.max(1)).unwrap_or(i64::MAX);
        Self {
            provider,
            freshness: ChronoDuration::seconds(secs),
            entries: HashMap::new(),
        }
    }

    pub fn freshness_secs(&self) -> i64 {
        self.freshness.num_seconds()
    }

    /// Snapshot for `subject` as of `now`, refreshing if needed.
    pub async fn get(&mut self, subject: &Subject, now: DateTime<Utc>) -> AggregateSnapshot {
        if let Some(snap) = self.fresh_entry(subject.player_id, now) {
            return snap.clone();
        }

        counter!("tracker_stats_refresh_total").increment(1);
        match self.provider.season_stats(subject, now.year()).await {
            Ok(mut snap) => {
                snap.captured_at = Some(now);
                tracing::debug!(
                    target: "stats",
                    player_id = subject.player_id,
                    provider = self.provider.name(),
                    "season stats refreshed"
                );
                self.entries.insert(subject.player_id, snap.clone());
                snap
            }
            Err(e) => {
                counter!("tracker_stats_refresh_failures_total").increment(1);
                tracing::warn!(
                    target: "stats",
                    error = ?e,
                    player_id = subject.player_id,
                    provider = self.provider.name(),
                    "season stats refresh failed; serving cached value"
                );
                self.entries
                    .get(&subject.player_id)
                    .cloned()
                    .unwrap_or_default()
            }
        }
    }

    /// Cached snapshot regardless of age; no refresh.
    pub fn peek(&self, player_id: u32) -> Option<&AggregateSnapshot> {
        self.entries.get(&player_id)
    }

    fn fresh_entry(&self, player_id: u32, now: DateTime<Utc>) -> Option<&AggregateSnapshot> {
        let snap = self.entries.get(&player_id)?;
        let captured = snap.captured_at?;
        (now.signed_duration_since(captured) < self.freshness).then_some(snap)
    }
}
