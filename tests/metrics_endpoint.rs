// tests/metrics_endpoint.rs
//
// One recorder per process, so everything lives in a single test.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use chrono::{NaiveDate, TimeZone, Utc};
use http::{Request, StatusCode};
use tower::ServiceExt;

use atbat_tracker::config::Subject;
use atbat_tracker::dedup::ProcessedSet;
use atbat_tracker::feed::providers::synthetic::SyntheticFeed;
use atbat_tracker::feed::types::{Event, EventKey, FeedProvider, Play};
use atbat_tracker::metrics::Metrics;
use atbat_tracker::notify::LogPublisher;
use atbat_tracker::stats::{AggregateSnapshot, StatsProvider};
use atbat_tracker::Poller;

struct NoStats;

#[async_trait]
impl StatsProvider for NoStats {
    async fn season_stats(&self, _subject: &Subject, _season: i32) -> Result<AggregateSnapshot> {
        anyhow::bail!("stats offline")
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Yields once before answering, so concurrent cycles interleave between
/// filtering and claiming.
struct SlowStats;

#[async_trait]
impl StatsProvider for SlowStats {
    async fn season_stats(&self, _subject: &Subject, _season: i32) -> Result<AggregateSnapshot> {
        tokio::task::yield_now().await;
        Ok(AggregateSnapshot::default())
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

struct OneWalk;

#[async_trait]
impl FeedProvider for OneWalk {
    async fn fetch_events(&self, _subject: &Subject, date: NaiveDate) -> Result<Vec<Event>> {
        Ok(vec![Event {
            key: EventKey::new(date, 8, 40),
            play: Play::Walk { situation: None },
        }])
    }

    fn name(&self) -> &'static str {
        "one-walk"
    }
}

fn racing_poller(shared: Arc<ProcessedSet>) -> Poller {
    Poller::builder(Subject::default())
        .feed(Arc::new(OneWalk))
        .stats(Arc::new(SlowStats))
        .publisher(Arc::new(LogPublisher::new()))
        .processed_set(shared)
        .build()
        .unwrap()
}

#[tokio::test]
async fn cycle_counters_are_exported() {
    let metrics = Metrics::init(120, 600).unwrap();

    let mut poller = Poller::builder(Subject::default())
        .feed(Arc::new(SyntheticFeed::with_seed(3)))
        .stats(Arc::new(NoStats))
        .publisher(Arc::new(LogPublisher::new()))
        .build()
        .unwrap();
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 20, 0, 0).unwrap();
    let report = poller.tick(now).await.unwrap();
    assert_eq!(report.published, 1);

    // Both cycles pass the filter before either claims the key; only the
    // winning claim counts as new.
    let shared = Arc::new(ProcessedSet::new());
    let (mut a, mut b) = (racing_poller(shared.clone()), racing_poller(shared.clone()));
    let (ra, rb) = tokio::join!(a.run_cycle(now), b.run_cycle(now));
    let (ra, rb) = (ra.unwrap(), rb.unwrap());
    assert_eq!(ra.published + rb.published, 1);
    assert_eq!(ra.duplicates + rb.duplicates, 1);

    let resp = metrics
        .router()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    for name in [
        "tracker_poll_interval_secs 120",
        "tracker_stats_freshness_secs 600",
        "tracker_cycles_total 1",
        "tracker_events_new_total 2",
        "tracker_events_duplicate_total 1",
        "tracker_published_total 1",
        "tracker_stats_refresh_failures_total 1",
        "tracker_last_cycle_ts",
    ] {
        assert!(text.contains(name), "missing `{name}` in:\n{text}");
    }
}
