// src/stats/statsapi.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{AggregateSnapshot, StatsProvider};
use crate::config::Subject;

// --- tolerant response shapes: every level may be missing ---

#[derive(Debug, Default, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    stats: Vec<StatGroup>,
}

#[derive(Debug, Default, Deserialize)]
struct StatGroup {
    #[serde(default)]
    splits: Vec<Split>,
}

#[derive(Debug, Default, Deserialize)]
struct Split {
    #[serde(default)]
    stat: HittingStat,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct HittingStat {
    avg: Option<String>,
    obp: Option<String>,
    slg: Option<String>,
    ops: Option<String>,
    babip: Option<String>,
    iso: Option<String>,
    home_runs: Option<u32>,
    rbi: Option<u32>,
    hits: Option<u32>,
    base_on_balls: Option<u32>,
    strike_outs: Option<u32>,
    plate_appearances: Option<u32>,
}

fn first_stat(body: &str) -> Result<Option<HittingStat>> {
    let resp: StatsResponse = serde_json::from_str(body).context("parse stats JSON")?;
    Ok(resp
        .stats
        .into_iter()
        .next()
        .and_then(|g| g.splits.into_iter().next())
        .map(|s| s.stat))
}

/// Season hitting line from a `stats=season&group=hitting` body.
/// A body without splits (no games played yet) yields all-default stats.
pub fn parse_season_hitting(body: &str) -> Result<AggregateSnapshot> {
    let st = first_stat(body)?.unwrap_or_default();
    Ok(AggregateSnapshot {
        avg: st.avg.unwrap_or_default(),
        obp: st.obp.unwrap_or_default(),
        slg: st.slg.unwrap_or_default(),
        ops: st.ops.unwrap_or_default(),
        home_runs: st.home_runs.unwrap_or(0),
        rbi: st.rbi.unwrap_or(0),
        hits: st.hits.unwrap_or(0),
        walks: st.base_on_balls.unwrap_or(0),
        strikeouts: st.strike_outs.unwrap_or(0),
        plate_appearances: st.plate_appearances.unwrap_or(0),
        ..Default::default()
    })
}

/// Fold a `stats=seasonAdvanced` body into `snap` (BABIP, ISO).
pub fn merge_advanced(snap: &mut AggregateSnapshot, body: &str) -> Result<()> {
    if let Some(st) = first_stat(body)? {
        snap.babip = st.babip.unwrap_or_default();
        snap.iso = st.iso.unwrap_or_default();
    }
    Ok(())
}

/// Season stats from the public MLB Stats API.
pub struct StatsApiStats {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl StatsApiStats {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    async fn get_body(&self, subject: &Subject, season: i32, stats: &str) -> Result<String> {
        let url = format!("{}/api/v1/people/{}/stats", self.base_url, subject.player_id);
        let season = season.to_string();
        let rsp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .query(&[("stats", stats), ("season", season.as_str()), ("group", "hitting")])
            .send()
            .await
            .with_context(|| format!("GET {url} ({stats})"))?
            .error_for_status()
            .with_context(|| format!("{stats} stats non-2xx"))?;
        rsp.text().await.context("read stats body")
    }
}

#[async_trait]
impl StatsProvider for StatsApiStats {
    async fn season_stats(&self, subject: &Subject, season: i32) -> Result<AggregateSnapshot> {
        let body = self.get_body(subject, season, "season").await?;
        let mut snap = parse_season_hitting(&body)?;

        // Advanced numbers are a bonus; keep the basic line if they fail.
        match self.get_body(subject, season, "seasonAdvanced").await {
            Ok(adv) => {
                if let Err(e) = merge_advanced(&mut snap, &adv) {
                    tracing::warn!(target: "stats", error = ?e, "advanced stats unparsable");
                }
            }
            Err(e) => tracing::warn!(target: "stats", error = ?e, "advanced stats unavailable"),
        }
        Ok(snap)
    }

    fn name(&self) -> &'static str {
        "statsapi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_sentinels() {
        let body = r#"{"stats":[{"splits":[{"stat":{"avg":".250","homeRuns":3}}]}]}"#;
        let snap = parse_season_hitting(body).unwrap();
        assert_eq!(snap.avg, ".250");
        assert_eq!(snap.obp, "");
        assert_eq!(snap.home_runs, 3);
        assert_eq!(snap.plate_appearances, 0);
        assert!(snap.captured_at.is_none());
    }

    #[test]
    fn no_splits_is_not_an_error() {
        let snap = parse_season_hitting(r#"{"stats":[{"splits":[]}]}"#).unwrap();
        assert_eq!(snap, AggregateSnapshot::default());
        let snap = parse_season_hitting(r#"{}"#).unwrap();
        assert_eq!(snap, AggregateSnapshot::default());
    }

    #[test]
    fn advanced_merges_babip_and_iso() {
        let mut snap = AggregateSnapshot::default();
        merge_advanced(
            &mut snap,
            r#"{"stats":[{"splits":[{"stat":{"babip":".301","iso":".214"}}]}]}"#,
        )
        .unwrap();
        assert_eq!(snap.babip, ".301");
        assert_eq!(snap.iso, ".214");
    }

    #[test]
    fn garbage_body_is_an_error() {
        assert!(parse_season_hitting("<html>").is_err());
    }
}
