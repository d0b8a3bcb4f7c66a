//! # Poller
//! The only active component: fetch → filter → enrich → format → publish,
//! once per fixed interval, forever.
//!
//! Delivery is at-most-once. An event key is claimed in the [`ProcessedSet`]
//! right after its message is formatted and before the publish attempt, so a
//! failed publish is never retried on a later cycle.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::{Mode, Subject, TrackerConfig};
use crate::dedup::ProcessedSet;
use crate::feed::providers::{statsapi::StatsApiFeed, synthetic::SyntheticFeed};
use crate::feed::{Event, FeedProvider};
use crate::format::NotificationFormatter;
use crate::notify::{build_publisher, PublishOutcome, Publisher};
use crate::stats::statsapi::StatsApiStats;
use crate::stats::{AggregateCache, StatsProvider};
use crate::status::{CyclePhase, StatusBoard};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("tracker_cycles_total", "Poll cycles started.");
        describe_counter!(
            "tracker_events_new_total",
            "Events seen for the first time."
        );
        describe_counter!(
            "tracker_events_duplicate_total",
            "Events skipped because their key was already processed."
        );
        describe_counter!("tracker_published_total", "Messages accepted by the sink.");
        describe_counter!(
            "tracker_publish_failures_total",
            "Messages the sink did not accept (never retried)."
        );
        describe_counter!(
            "tracker_feed_errors_total",
            "Feed fetch/parse errors."
        );
        describe_counter!(
            "tracker_stats_refresh_total",
            "Season stats refresh attempts."
        );
        describe_counter!(
            "tracker_stats_refresh_failures_total",
            "Season stats refresh failures (stale value served)."
        );
        describe_gauge!(
            "tracker_last_cycle_ts",
            "Unix ts when the last poll cycle finished."
        );
    });
}

/// What one cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub candidates: usize,
    pub duplicates: usize,
    pub published: usize,
    pub failed: usize,
    pub outcome: String,
}

pub struct Poller {
    subject: Subject,
    feed: Arc<dyn FeedProvider>,
    cache: AggregateCache,
    processed: Arc<ProcessedSet>,
    formatter: NotificationFormatter,
    publisher: Arc<dyn Publisher>,
    status: Arc<StatusBoard>,
    interval: Duration,
    game_day_offset: FixedOffset,
    late_game_cutoff_hour: u32,
}

impl Poller {
    pub fn builder(subject: Subject) -> PollerBuilder {
        PollerBuilder::new(subject)
    }

    /// Production wiring: feed by mode, MLB Stats API for season stats,
    /// publisher by `[publisher].kind`.
    pub fn from_config(cfg: &TrackerConfig, status: Arc<StatusBoard>) -> Result<Self> {
        let feed: Arc<dyn FeedProvider> = match cfg.mode {
            Mode::Synthetic => Arc::new(match cfg.feed.synthetic_seed {
                Some(seed) => SyntheticFeed::with_seed(seed),
                None => SyntheticFeed::new(),
            }),
            Mode::Live => Arc::new(
                StatsApiFeed::new(cfg.feed.base_url.clone())
                    .with_timeout(cfg.feed.request_timeout_secs),
            ),
        };
        let stats = Arc::new(
            StatsApiStats::new(cfg.feed.base_url.clone()).with_timeout(cfg.feed.request_timeout_secs),
        );
        let publisher = build_publisher(&cfg.publisher)?;

        Poller::builder(cfg.subject.clone())
            .feed(feed)
            .stats(stats)
            .publisher(publisher)
            .status(status)
            .poll_interval_secs(cfg.poll_interval_secs)
            .stats_freshness_secs(cfg.stats_freshness_secs)
            .game_day_utc_offset_hours(cfg.feed.game_day_utc_offset_hours)
            // One synthetic plate appearance per cycle, whatever the hour.
            .late_game_cutoff_hour(match cfg.mode {
                Mode::Live => cfg.feed.late_game_cutoff_hour,
                Mode::Synthetic => 0,
            })
            .mode(cfg.mode)
            .build()
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn processed(&self) -> &ProcessedSet {
        &self.processed
    }

    pub fn status(&self) -> &Arc<StatusBoard> {
        &self.status
    }

    /// Calendar date of the game day that contains `now`.
    pub fn game_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.game_day_offset).date_naive()
    }

    /// Game days to poll at `now`, oldest first. Before the cutoff hour the
    /// previous day is included so a game running past midnight is still read.
    pub fn game_dates(&self, now: DateTime<Utc>) -> Vec<NaiveDate> {
        let local = now.with_timezone(&self.game_day_offset);
        let today = local.date_naive();
        match today.pred_opt() {
            Some(yesterday) if local.hour() < self.late_game_cutoff_hour => vec![yesterday, today],
            _ => vec![today],
        }
    }

    /// One full cycle. Feed errors are returned; everything past the fetch
    /// (stats outage, publish failure) is absorbed and reported.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> Result<CycleReport> {
        ensure_metrics_described();

        self.status.set_phase(CyclePhase::Fetching);
        let mut candidates = Vec::new();
        for date in self.game_dates(now) {
            let mut events = self
                .feed
                .fetch_events(&self.subject, date)
                .await
                .with_context(|| format!("{} feed fetch for {date}", self.feed.name()))?;
            candidates.append(&mut events);
        }

        self.status.set_phase(CyclePhase::Filtering);
        let mut report = CycleReport {
            candidates: candidates.len(),
            ..Default::default()
        };
        let fresh = self.filter_new(candidates, &mut report);

        let mut found = Vec::with_capacity(fresh.len());
        for event in fresh {
            self.status.set_phase(CyclePhase::Enriching);
            let snap = self.cache.get(&self.subject, now).await;

            self.status.set_phase(CyclePhase::Formatting);
            let msg = self.formatter.format(&event, &snap);

            // Claim before publishing: at most one attempt per key, ever.
            if !self.processed.insert(event.key) {
                report.duplicates += 1;
                continue;
            }
            counter!("tracker_events_new_total").increment(1);

            self.status.set_phase(CyclePhase::Publishing);
            let outcome = self.publisher.publish(&msg).await;
            if outcome.success {
                report.published += 1;
                counter!("tracker_published_total").increment(1);
            } else {
                report.failed += 1;
                counter!("tracker_publish_failures_total").increment(1);
            }
            tracing::info!(
                target: "poller",
                key = %event.key,
                play = %event.play.describe(),
                published = outcome.success,
                processed_total = self.processed.len(),
                "at-bat processed"
            );
            found.push(match event.play.situation() {
                Some(s) => format!("{} {s}", event.play.describe()),
                None => event.play.describe(),
            });
        }

        report.outcome = if found.is_empty() {
            "No new at-bats found".to_string()
        } else {
            let mut s = format!("Found {} new at-bat(s): {}", found.len(), found.join(", "));
            if report.failed > 0 {
                s.push_str(&format!(" ({} not published)", report.failed));
            }
            s
        };

        counter!("tracker_events_duplicate_total").increment(report.duplicates as u64);

        let processed_total = self.processed.len();
        let (published, failed) = (report.published as u64, report.failed as u64);
        let outcome = report.outcome.clone();
        self.status.update(|s| {
            s.phase = CyclePhase::Idle;
            s.last_checked_at = Some(now);
            s.last_outcome = outcome;
            s.processed_total = processed_total;
            s.published_total += published;
            s.publish_failures_total += failed;
        });
        gauge!("tracker_last_cycle_ts").set(now.timestamp() as f64);

        Ok(report)
    }

    /// `run_cycle` with errors logged into the status instead of returned.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Option<CycleReport> {
        counter!("tracker_cycles_total").increment(1);
        match self.run_cycle(now).await {
            Ok(report) => {
                tracing::info!(
                    target: "poller",
                    candidates = report.candidates,
                    duplicates = report.duplicates,
                    published = report.published,
                    failed = report.failed,
                    "check completed: {}",
                    report.outcome
                );
                Some(report)
            }
            Err(e) => {
                counter!("tracker_feed_errors_total").increment(1);
                tracing::error!(target: "poller", error = ?e, "poll cycle failed");
                let outcome = format!("Error occurred: {e:#}");
                self.status.update(|s| {
                    s.phase = CyclePhase::Error;
                    s.last_checked_at = Some(now);
                    s.last_outcome = outcome;
                });
                self.status.set_phase(CyclePhase::Idle);
                None
            }
        }
    }

    /// Publish the one-off deployment message.
    pub async fn announce(&self, now: DateTime<Utc>) -> PublishOutcome {
        let msg = self.formatter.announcement(now);
        self.publisher.publish(&msg).await
    }

    /// Loop forever on the fixed interval. The first cycle runs immediately.
    pub async fn run_forever(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            target: "poller",
            subject = %self.subject.name,
            interval_secs = self.interval.as_secs(),
            feed = self.feed.name(),
            sink = self.publisher.name(),
            "poller started"
        );
        loop {
            ticker.tick().await;
            self.tick(Utc::now()).await;
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run_forever())
    }

    fn filter_new(&self, candidates: Vec<Event>, report: &mut CycleReport) -> Vec<Event> {
        let mut seen = HashSet::with_capacity(candidates.len());
        let mut fresh = Vec::with_capacity(candidates.len());
        for ev in candidates {
            // Repeats inside one response count as duplicates too.
            if self.processed.contains(&ev.key) || !seen.insert(ev.key) {
                tracing::debug!(target: "poller", key = %ev.key, "at-bat already processed");
                report.duplicates += 1;
                continue;
            }
            fresh.push(ev);
        }
        fresh
    }
}

/// Wires a [`Poller`]; feed, stats and publisher are required.
pub struct PollerBuilder {
    subject: Subject,
    feed: Option<Arc<dyn FeedProvider>>,
    stats: Option<Arc<dyn StatsProvider>>,
    publisher: Option<Arc<dyn Publisher>>,
    status: Option<Arc<StatusBoard>>,
    processed: Option<Arc<ProcessedSet>>,
    mode: Mode,
    poll_interval_secs: u64,
    stats_freshness_secs: u64,
    game_day_utc_offset_hours: i32,
    late_game_cutoff_hour: u32,
}

impl PollerBuilder {
    pub fn new(subject: Subject) -> Self {
        Self {
            subject,
            feed: None,
            stats: None,
            publisher: None,
            status: None,
            processed: None,
            mode: Mode::Synthetic,
            poll_interval_secs: 120,
            stats_freshness_secs: 600,
            game_day_utc_offset_hours: -4,
            late_game_cutoff_hour: 6,
        }
    }

    pub fn feed(mut self, feed: Arc<dyn FeedProvider>) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn stats(mut self, stats: Arc<dyn StatsProvider>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn status(mut self, status: Arc<StatusBoard>) -> Self {
        self.status = Some(status);
        self
    }

    /// Share a processed set between pollers (defaults to a private one).
    pub fn processed_set(mut self, processed: Arc<ProcessedSet>) -> Self {
        self.processed = Some(processed);
        self
    }

    /// Mode reported by the default status board (ignored with `.status(..)`).
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    pub fn stats_freshness_secs(mut self, secs: u64) -> Self {
        self.stats_freshness_secs = secs;
        self
    }

    pub fn game_day_utc_offset_hours(mut self, hours: i32) -> Self {
        self.game_day_utc_offset_hours = hours;
        self
    }

    /// Local hour before which the previous game day is polled too.
    pub fn late_game_cutoff_hour(mut self, hour: u32) -> Self {
        self.late_game_cutoff_hour = hour;
        self
    }

    pub fn build(self) -> Result<Poller> {
        let feed = self.feed.ok_or_else(|| anyhow!("poller needs a feed provider"))?;
        let stats = self.stats.ok_or_else(|| anyhow!("poller needs a stats provider"))?;
        let publisher = self
            .publisher
            .ok_or_else(|| anyhow!("poller needs a publisher"))?;
        let game_day_offset = FixedOffset::east_opt(self.game_day_utc_offset_hours * 3600)
            .ok_or_else(|| anyhow!("invalid game day offset: {}h", self.game_day_utc_offset_hours))?;
        let status = self
            .status
            .unwrap_or_else(|| Arc::new(StatusBoard::new(self.mode, self.subject.name.clone())));

        Ok(Poller {
            formatter: NotificationFormatter::new(&self.subject),
            cache: AggregateCache::new(stats, self.stats_freshness_secs),
            processed: self.processed.unwrap_or_default(),
            interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            subject: self.subject,
            feed,
            publisher,
            status,
            game_day_offset,
            late_game_cutoff_hour: self.late_game_cutoff_hour.min(23),
        })
    }
}
