// src/config/tracker.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::notify::OAuth1Credentials;

pub const ENV_CONFIG_PATH: &str = "TRACKER_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/tracker.toml";

const ENV_MODE: &str = "TRACKER_MODE";
const ENV_POLL_INTERVAL: &str = "POLL_INTERVAL_SECS";
const ENV_PORT: &str = "PORT";

const MIN_POLL_INTERVAL_SECS: u64 = 10;

fn default_poll_interval() -> u64 {
    120
}
fn default_freshness() -> u64 {
    600
}
fn default_base_url() -> String {
    "https://statsapi.mlb.com".to_string()
}
fn default_utc_offset() -> i32 {
    -4
}
fn default_late_game_cutoff() -> u32 {
    6
}
fn default_request_timeout() -> u64 {
    10
}
fn default_max_chars() -> usize {
    280
}
fn default_publish_timeout() -> u64 {
    5
}
fn default_port() -> u16 {
    5000
}

/// The tracked batter. One pipeline is built per subject; nothing else in
/// the crate is subject specific.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// MLBAM person id.
    pub player_id: u32,
    /// MLBAM team id, used for the schedule lookup.
    pub team_id: u32,
    pub name: String,
    /// Closing tag appended to every message, e.g. "#LGM".
    pub tag: String,
}

impl Default for Subject {
    fn default() -> Self {
        Self {
            player_id: 596019,
            team_id: 121,
            name: "Francisco Lindor".to_string(),
            tag: "#LGM".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Random plate appearances, nothing leaves the process unless a real
    /// publisher is configured.
    #[default]
    Synthetic,
    Live,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Synthetic => "SYNTHETIC",
            Mode::Live => "LIVE",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Offset applied to UTC "now" to find the current game day.
    ///
    /// Fixed: no DST rules. The default -4 is US Eastern daylight time, so in
    /// winter the game day flips one hour late.
    #[serde(default = "default_utc_offset")]
    pub game_day_utc_offset_hours: i32,
    /// Local hour (0-23) before which the previous game day is polled as
    /// well, for games that run past midnight. 0 disables it.
    #[serde(default = "default_late_game_cutoff")]
    pub late_game_cutoff_hour: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Seed for the synthetic generator; random when absent.
    #[serde(default)]
    pub synthetic_seed: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            game_day_utc_offset_hours: default_utc_offset(),
            late_game_cutoff_hour: default_late_game_cutoff(),
            request_timeout_secs: default_request_timeout(),
            synthetic_seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PublisherKind {
    #[default]
    Log,
    Twitter,
    Discord,
    Slack,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    #[serde(default)]
    pub kind: PublisherKind,
    /// X OAuth 1.0a consumer key. "ENV" reads TWITTER_API_KEY.
    #[serde(default)]
    pub api_key: Option<String>,
    /// "ENV" reads TWITTER_API_SECRET.
    #[serde(default)]
    pub api_secret: Option<String>,
    /// "ENV" reads TWITTER_ACCESS_TOKEN.
    #[serde(default)]
    pub access_token: Option<String>,
    /// "ENV" reads TWITTER_ACCESS_TOKEN_SECRET.
    #[serde(default)]
    pub access_token_secret: Option<String>,
    /// Discord/Slack webhook. "ENV" reads DISCORD_WEBHOOK_URL / SLACK_WEBHOOK_URL.
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_publish_timeout")]
    pub timeout_secs: u64,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            kind: PublisherKind::Log,
            api_key: None,
            api_secret: None,
            access_token: None,
            access_token_secret: None,
            webhook_url: None,
            max_chars: default_max_chars(),
            timeout_secs: default_publish_timeout(),
        }
    }
}

impl PublisherConfig {
    /// All four X credentials, once resolved.
    pub fn twitter_credentials(&self) -> Option<OAuth1Credentials> {
        Some(OAuth1Credentials::new(
            self.api_key.clone()?,
            self.api_secret.clone()?,
            self.access_token.clone()?,
            self.access_token_secret.clone()?,
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// How long a season-stats snapshot is served before a refresh.
    #[serde(default = "default_freshness")]
    pub stats_freshness_secs: u64,
    /// Publish a one-off deployment message at startup.
    #[serde(default)]
    pub announce_on_start: bool,
    #[serde(default)]
    pub subject: Subject,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            poll_interval_secs: default_poll_interval(),
            stats_freshness_secs: default_freshness(),
            announce_on_start: false,
            subject: Subject::default(),
            feed: FeedConfig::default(),
            publisher: PublisherConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl TrackerConfig {
    /// Parse a TOML document, then sanitize and resolve `"ENV"` secrets.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: TrackerConfig = toml::from_str(s).context("parsing tracker config")?;
        cfg.sanitize();
        cfg.resolve_secrets()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading tracker config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load config using env var + fallbacks, then apply env overrides:
    /// 1) $TRACKER_CONFIG_PATH
    /// 2) config/tracker.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("TRACKER_CONFIG_PATH points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from(&default_p)?
            } else {
                let mut cfg = TrackerConfig::default();
                cfg.resolve_secrets()?;
                cfg
            }
        };
        cfg.apply_env_overrides()?;
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(m) = std::env::var(ENV_MODE) {
            self.mode = match m.trim().to_ascii_lowercase().as_str() {
                "live" | "production" => Mode::Live,
                "synthetic" | "test" => Mode::Synthetic,
                other => bail!("unsupported {ENV_MODE}: {other}"),
            };
        }
        if let Some(secs) = std::env::var(ENV_POLL_INTERVAL)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.poll_interval_secs = secs;
        }
        if let Some(port) = std::env::var(ENV_PORT)
            .ok()
            .and_then(|v| v.trim().parse::<u16>().ok())
        {
            self.server.port = port;
        }
        Ok(())
    }

    fn sanitize(&mut self) {
        if self.poll_interval_secs < MIN_POLL_INTERVAL_SECS {
            self.poll_interval_secs = MIN_POLL_INTERVAL_SECS;
        }
        if self.stats_freshness_secs == 0 {
            self.stats_freshness_secs = default_freshness();
        }
        if self.feed.request_timeout_secs == 0 {
            self.feed.request_timeout_secs = default_request_timeout();
        }
        if !(-12..=14).contains(&self.feed.game_day_utc_offset_hours) {
            self.feed.game_day_utc_offset_hours = default_utc_offset();
        }
        if self.feed.late_game_cutoff_hour > 23 {
            self.feed.late_game_cutoff_hour = default_late_game_cutoff();
        }
        self.feed.base_url = self.feed.base_url.trim_end_matches('/').to_string();
        if self.publisher.max_chars == 0 {
            self.publisher.max_chars = default_max_chars();
        }
    }

    fn resolve_secrets(&mut self) -> Result<()> {
        let p = &mut self.publisher;
        match p.kind {
            PublisherKind::Log => {}
            PublisherKind::Twitter => {
                p.api_key = Some(resolve_secret(p.api_key.take(), "TWITTER_API_KEY")?);
                p.api_secret = Some(resolve_secret(p.api_secret.take(), "TWITTER_API_SECRET")?);
                p.access_token = Some(resolve_secret(p.access_token.take(), "TWITTER_ACCESS_TOKEN")?);
                p.access_token_secret = Some(resolve_secret(
                    p.access_token_secret.take(),
                    "TWITTER_ACCESS_TOKEN_SECRET",
                )?);
            }
            PublisherKind::Discord => {
                p.webhook_url = Some(resolve_secret(p.webhook_url.take(), "DISCORD_WEBHOOK_URL")?);
            }
            PublisherKind::Slack => {
                p.webhook_url = Some(resolve_secret(p.webhook_url.take(), "SLACK_WEBHOOK_URL")?);
            }
        }
        Ok(())
    }
}

/// Missing value or `"ENV"` reads `var`; anything else is taken literally.
fn resolve_secret(value: Option<String>, var: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().eq_ignore_ascii_case("env") && !v.trim().is_empty() => Ok(v),
        _ => std::env::var(var).map_err(|_| anyhow!("Missing {var} env var")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = TrackerConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.mode, Mode::Synthetic);
        assert_eq!(cfg.poll_interval_secs, 120);
        assert_eq!(cfg.stats_freshness_secs, 600);
        assert_eq!(cfg.subject.tag, "#LGM");
        assert_eq!(cfg.publisher.kind, PublisherKind::Log);
        assert_eq!(cfg.server.port, 5000);
    }

    #[test]
    fn sanitize_clamps_interval_and_trims_base_url() {
        let cfg = TrackerConfig::from_toml_str(
            r#"
            poll_interval_secs = 1
            stats_freshness_secs = 0
            [feed]
            base_url = "http://localhost:9000/"
            game_day_utc_offset_hours = 40
            late_game_cutoff_hour = 30
            "#,
        )
        .unwrap();
        assert_eq!(cfg.poll_interval_secs, MIN_POLL_INTERVAL_SECS);
        assert_eq!(cfg.stats_freshness_secs, 600);
        assert_eq!(cfg.feed.base_url, "http://localhost:9000");
        assert_eq!(cfg.feed.game_day_utc_offset_hours, -4);
        assert_eq!(cfg.feed.late_game_cutoff_hour, 6);
    }

    #[test]
    fn literal_secret_is_kept() {
        let cfg = TrackerConfig::from_toml_str(
            r#"
            [publisher]
            kind = "discord"
            webhook_url = "https://discord.test/hook"
            "#,
        )
        .unwrap();
        assert_eq!(
            cfg.publisher.webhook_url.as_deref(),
            Some("https://discord.test/hook")
        );
    }

    #[serial_test::serial]
    #[test]
    fn env_secret_is_resolved_or_reported() {
        let doc = r#"
            [publisher]
            kind = "twitter"
            api_key = "ENV"
            api_secret = "ENV"
            access_token = "literal-token"
        "#;
        let vars = [
            "TWITTER_API_KEY",
            "TWITTER_API_SECRET",
            "TWITTER_ACCESS_TOKEN",
            "TWITTER_ACCESS_TOKEN_SECRET",
        ];
        for v in vars {
            env::remove_var(v);
        }
        let err = TrackerConfig::from_toml_str(doc).unwrap_err();
        assert!(err.to_string().contains("TWITTER_API_KEY"));

        env::set_var("TWITTER_API_KEY", "ck");
        env::set_var("TWITTER_API_SECRET", "cs");
        env::set_var("TWITTER_ACCESS_TOKEN", "from-env");
        env::set_var("TWITTER_ACCESS_TOKEN_SECRET", "ats");
        let cfg = TrackerConfig::from_toml_str(doc).unwrap();
        let creds = cfg.publisher.twitter_credentials().unwrap();
        assert_eq!(creds.consumer_key, "ck");
        assert_eq!(creds.consumer_secret, "cs");
        assert_eq!(creds.access_token, "literal-token");
        assert_eq!(creds.access_token_secret, "ats");
        for v in vars {
            env::remove_var(v);
        }
    }
}
