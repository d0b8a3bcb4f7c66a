// src/feed/providers/statsapi.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use metrics::counter;
use reqwest::Client;
use serde::Deserialize;

use crate::config::Subject;
use crate::feed::types::{
    Contact, Event, EventKey, FeedProvider, FinalPitch, HitKind, Play, StrikeoutKind,
};

// --- schedule ---

#[derive(Debug, Default, Deserialize)]
struct Schedule {
    #[serde(default)]
    dates: Vec<ScheduleDate>,
}

#[derive(Debug, Default, Deserialize)]
struct ScheduleDate {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    games: Vec<ScheduleGame>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleGame {
    game_pk: u64,
    #[serde(default)]
    official_date: Option<String>,
    #[serde(default)]
    status: GameStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameStatus {
    #[serde(default)]
    abstract_game_state: String,
}

/// A started game from the schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledGame {
    pub game_pk: u64,
    /// The game's own date (`officialDate`, else the schedule entry's date).
    /// Events are keyed by it, not by the day that was queried.
    pub official_date: Option<NaiveDate>,
}

fn parse_day(s: Option<&str>) -> Option<NaiveDate> {
    s.and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

/// Games from a schedule body, skipping games that have not started.
pub fn parse_schedule(body: &str) -> Result<Vec<ScheduledGame>> {
    let schedule: Schedule = serde_json::from_str(body).context("parse schedule JSON")?;
    let mut games = Vec::new();
    for day in schedule.dates {
        let listed = parse_day(day.date.as_deref());
        for g in day.games {
            if g.status.abstract_game_state.eq_ignore_ascii_case("preview") {
                continue;
            }
            games.push(ScheduledGame {
                game_pk: g.game_pk,
                official_date: parse_day(g.official_date.as_deref()).or(listed),
            });
        }
    }
    Ok(games)
}

// --- live feed ---

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveFeed {
    #[serde(default)]
    live_data: LiveData,
}

#[derive(Debug, Default, Deserialize)]
struct LiveData {
    #[serde(default)]
    plays: Plays,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Plays {
    #[serde(default)]
    all_plays: Vec<RawPlay>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawPlay {
    result: PlayResult,
    about: About,
    matchup: Matchup,
    play_events: Vec<PlayEvent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PlayResult {
    event: Option<String>,
    event_type: Option<String>,
    description: Option<String>,
    rbi: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct About {
    at_bat_index: Option<u32>,
    inning: Option<u32>,
    is_complete: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Matchup {
    batter: Option<Person>,
    splits: Option<MatchupSplits>,
}

#[derive(Debug, Deserialize)]
struct Person {
    id: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MatchupSplits {
    men_on_base: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PlayEvent {
    is_pitch: bool,
    details: Option<PitchDetails>,
    pitch_data: Option<PitchData>,
    hit_data: Option<HitData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PitchDetails {
    #[serde(rename = "type")]
    pitch_type: Option<Described>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Described {
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PitchData {
    start_speed: Option<f64>,
    zone: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct HitData {
    launch_speed: Option<f64>,
    launch_angle: Option<f64>,
    total_distance: Option<f64>,
}

/// Exit velocity above which a ball counts as hard hit (mph).
const HARD_HIT_MPH: f64 = 95.0;

fn situation_from(splits: Option<&MatchupSplits>) -> Option<String> {
    let men_on = splits?.men_on_base.as_deref()?;
    match men_on {
        "Loaded" => Some("with bases loaded".to_string()),
        "RISP" => Some("with runners in scoring position".to_string()),
        "Men_On" => Some("with a runner on".to_string()),
        _ => None,
    }
}

fn contact_from(hit: Option<&HitData>) -> Contact {
    let Some(h) = hit else {
        return Contact::default();
    };
    Contact {
        exit_velocity: h.launch_speed,
        launch_angle: h.launch_angle,
        distance: h
            .total_distance
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|d| d.round() as u32),
    }
}

fn classify(raw: &RawPlay) -> Play {
    let last_pitch = raw.play_events.iter().rev().find(|e| e.is_pitch);
    let hit = raw.play_events.iter().rev().find_map(|e| e.hit_data.as_ref());
    let contact = contact_from(hit);
    let situation = situation_from(raw.matchup.splits.as_ref());
    let rbi = raw.result.rbi;

    match raw.result.event_type.as_deref().unwrap_or_default() {
        "home_run" => Play::HomeRun {
            contact_class: contact
                .exit_velocity
                .filter(|v| *v > HARD_HIT_MPH)
                .map(|_| "Hard Hit".to_string()),
            contact,
            rbi,
            situation,
        },
        t @ ("single" | "double" | "triple") => Play::Hit {
            kind: match t {
                "single" => HitKind::Single,
                "double" => HitKind::Double,
                _ => HitKind::Triple,
            },
            contact,
            xba: None,
            rbi,
        },
        "walk" | "intent_walk" => Play::Walk { situation },
        "strikeout" | "strikeout_double_play" => {
            let described = raw
                .result
                .description
                .as_deref()
                .unwrap_or_default()
                .to_ascii_lowercase();
            let kind = if described.contains("called") {
                Some(StrikeoutKind::Looking)
            } else if described.contains("swinging") {
                Some(StrikeoutKind::Swinging)
            } else {
                None
            };
            let pitch = last_pitch
                .map(|p| FinalPitch {
                    pitch_type: p
                        .details
                        .as_ref()
                        .and_then(|d| d.pitch_type.as_ref())
                        .and_then(|t| t.description.clone()),
                    speed: p.pitch_data.as_ref().and_then(|d| d.start_speed),
                    location: p
                        .pitch_data
                        .as_ref()
                        .and_then(|d| d.zone)
                        .map(|z| format!("Zone {z}")),
                })
                .unwrap_or_default();
            Play::Strikeout { kind, pitch }
        }
        _ => Play::Other {
            description: raw.result.event.clone().unwrap_or_default(),
            contact,
        },
    }
}

/// Completed plate appearances of `subject` in one game's live feed.
/// Plays missing an inning or at-bat index cannot be keyed and are skipped.
pub fn parse_live_feed(body: &str, subject: &Subject, date: NaiveDate) -> Result<Vec<Event>> {
    let feed: LiveFeed = serde_json::from_str(body).context("parse live feed JSON")?;
    let mut out = Vec::new();
    for raw in &feed.live_data.plays.all_plays {
        if !raw.about.is_complete {
            continue;
        }
        if raw.matchup.batter.as_ref().map(|b| b.id) != Some(subject.player_id) {
            continue;
        }
        let (Some(inning), Some(ab)) = (raw.about.inning, raw.about.at_bat_index) else {
            tracing::debug!(target: "feed", "play without inning/atBatIndex skipped");
            continue;
        };
        out.push(Event {
            key: EventKey::new(date, inning, ab),
            play: classify(raw),
        });
    }
    Ok(out)
}

/// Live plate appearances from the public MLB Stats API.
pub struct StatsApiFeed {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl StatsApiFeed {
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

    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String> {
        self.client
            .get(url)
            .timeout(self.timeout)
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("{url} non-2xx"))?
            .text()
            .await
            .context("read feed body")
    }
}

#[async_trait]
impl FeedProvider for StatsApiFeed {
    async fn fetch_events(&self, subject: &Subject, date: NaiveDate) -> Result<Vec<Event>> {
        let schedule_url = format!("{}/api/v1/schedule", self.base_url);
        let body = self
            .get_text(
                &schedule_url,
                &[
                    ("sportId", "1".to_string()),
                    ("teamId", subject.team_id.to_string()),
                    ("date", date.format("%Y-%m-%d").to_string()),
                ],
            )
            .await?;
        let games = parse_schedule(&body)?;

        let mut events = Vec::new();
        for game in games {
            let game_pk = game.game_pk;
            let game_date = game.official_date.unwrap_or(date);
            let url = format!("{}/api/v1.1/game/{game_pk}/feed/live", self.base_url);
            // One broken game must not hide the other half of a doubleheader.
            match self.get_text(&url, &[]).await {
                Ok(body) => match parse_live_feed(&body, subject, game_date) {
                    Ok(mut v) => events.append(&mut v),
                    Err(e) => {
                        counter!("tracker_feed_errors_total").increment(1);
                        tracing::warn!(target: "feed", error = ?e, game_pk, "live feed unparsable");
                    }
                },
                Err(e) => {
                    counter!("tracker_feed_errors_total").increment(1);
                    tracing::warn!(target: "feed", error = ?e, game_pk, "live feed fetch failed");
                }
            }
        }
        Ok(events)
    }

    fn name(&self) -> &'static str {
        "statsapi"
    }
}
