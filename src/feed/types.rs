// src/feed/types.rs
//! Plate-appearance events as read from a feed.
//!
//! An [`Event`] is immutable once built. Only its [`EventKey`] outlives the
//! cycle that produced it (see `dedup::ProcessedSet`).

use std::fmt;

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::Subject;

/// Identity of a plate appearance: game date, inning, at-bat index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventKey {
    pub date: NaiveDate,
    pub period: u32,
    pub sequence: u32,
}

impl EventKey {
    pub fn new(date: NaiveDate, period: u32, sequence: u32) -> Self {
        Self {
            date,
            period,
            sequence,
        }
    }
}

impl fmt::Display for EventKey {
    // Same shape as the ids logged since the first tracker: "2024-06-01_4_2"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.date.format("%Y-%m-%d"),
            self.period,
            self.sequence
        )
    }
}

/// Batted-ball measurements. Every field is optional; the feed omits them
/// freely (no contact, tracking outage, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// mph
    pub exit_velocity: Option<f64>,
    /// degrees
    pub launch_angle: Option<f64>,
    /// feet
    pub distance: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitKind {
    Single,
    Double,
    Triple,
}

impl HitKind {
    pub fn label(self) -> &'static str {
        match self {
            HitKind::Single => "SINGLE",
            HitKind::Double => "DOUBLE",
            HitKind::Triple => "TRIPLE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrikeoutKind {
    Looking,
    Swinging,
}

impl StrikeoutKind {
    pub fn label(self) -> &'static str {
        match self {
            StrikeoutKind::Looking => "looking",
            StrikeoutKind::Swinging => "swinging",
        }
    }
}

/// The pitch that ended a strikeout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalPitch {
    pub pitch_type: Option<String>,
    /// mph
    pub speed: Option<f64>,
    pub location: Option<String>,
}

/// Outcome of a plate appearance, with the attributes each category can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum Play {
    HomeRun {
        contact: Contact,
        /// "Barrel", "Hard Hit", ...
        contact_class: Option<String>,
        rbi: Option<u32>,
        situation: Option<String>,
    },
    Hit {
        kind: HitKind,
        contact: Contact,
        /// Expected batting average of the batted ball.
        xba: Option<f64>,
        rbi: Option<u32>,
    },
    Walk {
        situation: Option<String>,
    },
    Strikeout {
        kind: Option<StrikeoutKind>,
        pitch: FinalPitch,
    },
    Other {
        description: String,
        contact: Contact,
    },
}

impl Play {
    /// Short name used in logs and status lines.
    pub fn describe(&self) -> String {
        match self {
            Play::HomeRun { .. } => "Home Run".to_string(),
            Play::Hit { kind, .. } => match kind {
                HitKind::Single => "Single".to_string(),
                HitKind::Double => "Double".to_string(),
                HitKind::Triple => "Triple".to_string(),
            },
            Play::Walk { .. } => "Walk".to_string(),
            Play::Strikeout { .. } => "Strikeout".to_string(),
            Play::Other { description, .. } => description.clone(),
        }
    }

    pub fn situation(&self) -> Option<&str> {
        match self {
            Play::HomeRun { situation, .. } | Play::Walk { situation } => situation.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub key: EventKey,
    pub play: Play,
}

#[async_trait::async_trait]
pub trait FeedProvider: Send + Sync {
    /// All plate appearances of `subject` on `date` that the feed knows about.
    /// May repeat events returned by earlier calls.
    async fn fetch_events(&self, subject: &Subject, date: NaiveDate) -> Result<Vec<Event>>;
    fn name(&self) -> &'static str;
}
