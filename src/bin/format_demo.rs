//! Prints formatted messages for a handful of synthetic plate appearances.
//! Season stats are fetched live when reachable; otherwise the messages show
//! without the season block.

use std::sync::Arc;

use atbat_tracker::config::TrackerConfig;
use atbat_tracker::feed::providers::synthetic::SyntheticFeed;
use atbat_tracker::format::NotificationFormatter;
use atbat_tracker::stats::{statsapi::StatsApiStats, AggregateCache};
use chrono::Utc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();
    let cfg = TrackerConfig::load_default()?;

    let feed = SyntheticFeed::new();
    let stats = Arc::new(StatsApiStats::new(cfg.feed.base_url.clone()).with_timeout(5));
    let mut cache = AggregateCache::new(stats, cfg.stats_freshness_secs);
    let formatter = NotificationFormatter::new(&cfg.subject);

    let now = Utc::now();
    let snap = cache.get(&cfg.subject, now).await;

    for i in 1..=5 {
        let ev = feed.generate(now.date_naive());
        println!(
            "--- Example #{i}: {} ({}) ---",
            ev.play.describe().to_uppercase(),
            ev.key
        );
        println!("{}", formatter.format(&ev, &snap).text());
        println!("\n{}\n", "=".repeat(60));
    }

    println!("format-demo done");
    Ok(())
}
