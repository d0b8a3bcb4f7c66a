//! # Notification formatting
//! Turns one plate appearance plus the batter's season line into message text.
//!
//! The message is a list of sections separated by one blank line. A line is
//! emitted only when its source value is present; a section with no lines is
//! dropped entirely, so absent data never shows up as a placeholder.
//! Season lines need a snapshot that carries data (`AggregateSnapshot::has_data`).

use chrono::{DateTime, Utc};

use crate::config::Subject;
use crate::feed::types::{Contact, Event, FinalPitch, HitKind, Play, StrikeoutKind};
use crate::stats::AggregateSnapshot;

/// Ordered text segments; `text()` renders them one per line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationMessage {
    segments: Vec<String>,
}

impl NotificationMessage {
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn text(&self) -> String {
        self.segments.join("\n")
    }

    pub fn char_count(&self) -> usize {
        self.segments.iter().map(|s| s.chars().count()).sum::<usize>()
            + self.segments.len().saturating_sub(1)
    }

    /// Append a section; empty sections are skipped.
    fn section(&mut self, lines: Vec<String>) {
        if lines.is_empty() {
            return;
        }
        if !self.segments.is_empty() {
            self.segments.push(String::new());
        }
        self.segments.extend(lines);
    }
}

/// Rate in percent; a zero denominator yields 0.
pub fn rate_pct(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        f64::from(numerator) / f64::from(denominator) * 100.0
    }
}

fn present(s: &str) -> Option<&str> {
    let t = s.trim();
    (!t.is_empty()).then_some(t)
}

#[derive(Debug, Clone)]
pub struct NotificationFormatter {
    name: String,
    tag: String,
}

impl NotificationFormatter {
    pub fn new(subject: &Subject) -> Self {
        Self {
            name: subject.name.clone(),
            tag: subject.tag.clone(),
        }
    }

    pub fn format(&self, event: &Event, snap: &AggregateSnapshot) -> NotificationMessage {
        let mut msg = NotificationMessage::default();
        match &event.play {
            Play::HomeRun {
                contact,
                contact_class,
                rbi,
                situation,
            } => self.home_run(&mut msg, contact, contact_class.as_deref(), *rbi, situation.as_deref(), snap),
            Play::Hit {
                kind,
                contact,
                xba,
                rbi,
            } => self.hit(&mut msg, *kind, contact, *xba, *rbi, snap),
            Play::Walk { situation } => self.walk(&mut msg, situation.as_deref(), snap),
            Play::Strikeout { kind, pitch } => self.strikeout(&mut msg, *kind, pitch, snap),
            Play::Other {
                description,
                contact,
            } => self.other(&mut msg, description, contact, snap),
        }
        msg.section(vec![self.tag.clone()]);
        msg
    }

    /// One-off deployment message.
    pub fn announcement(&self, now: DateTime<Utc>) -> NotificationMessage {
        let mut msg = NotificationMessage::default();
        msg.section(vec![format!("🚀 {} Bot - Deployment Test", self.name)]);
        msg.section(vec![
            "✅ Bot successfully deployed and running!".to_string(),
            format!("📅 Deployed: {} UTC", now.format("%Y-%m-%d %H:%M:%S")),
            format!("⚾ Ready to track {}'s at-bats!", self.name),
        ]);
        msg.section(vec![self.tag.clone()]);
        msg
    }

    fn home_run(
        &self,
        msg: &mut NotificationMessage,
        contact: &Contact,
        contact_class: Option<&str>,
        rbi: Option<u32>,
        situation: Option<&str>,
        snap: &AggregateSnapshot,
    ) {
        msg.section(vec![format!("🚨 {} GOES YARD! 🚨", self.name)]);

        let mut metrics = Vec::new();
        if let Some(ev) = contact.exit_velocity {
            metrics.push(format!("💥 Exit Velocity: {ev:.1} mph"));
        }
        if let Some(d) = contact.distance {
            metrics.push(format!("📏 Distance: {d} ft"));
        }
        if let Some(la) = contact.launch_angle {
            metrics.push(format!("📐 Launch Angle: {la:.1}°"));
        }
        if let Some(class) = contact_class.and_then(present) {
            metrics.push(format!("🎯 {class}"));
        }
        msg.section(metrics);

        let mut season = Vec::new();
        if snap.has_data() {
            season.push(format!("🏆 Season HR #{}", snap.home_runs + 1));
            if present(&snap.avg).is_some() {
                season.push(format!("📊 Season Stats: {}", snap.slash_line()));
            }
            if let Some(ops) = present(&snap.ops) {
                season.push(format!("💪 OPS: {ops}"));
            }
            if let Some(iso) = present(&snap.iso) {
                season.push(format!("⚡ ISO: {iso}"));
            }
            if let Some(r) = rbi {
                season.push(format!("🏃 RBI: {}", snap.rbi + r));
            }
        }
        if let Some(s) = situation.and_then(present) {
            season.push(format!("⚾ {s}"));
        }
        msg.section(season);
    }

    fn hit(
        &self,
        msg: &mut NotificationMessage,
        kind: HitKind,
        contact: &Contact,
        xba: Option<f64>,
        rbi: Option<u32>,
        snap: &AggregateSnapshot,
    ) {
        let emoji = match kind {
            HitKind::Single => "💫",
            HitKind::Double => "⚡",
            HitKind::Triple => "🔥",
        };
        msg.section(vec![format!("{emoji} {} with a {}!", self.name, kind.label())]);

        let mut metrics = contact_lines(contact);
        if let Some(x) = xba {
            metrics.push(format!("📈 xBA: {x:.3}"));
        }
        msg.section(metrics);

        if snap.has_data() {
            let mut season = Vec::new();
            if let Some(avg) = present(&snap.avg) {
                match present(&snap.ops) {
                    Some(ops) => season.push(format!("📊 Season: {avg} AVG, {ops} OPS")),
                    None => season.push(format!("📊 Season: {avg} AVG")),
                }
            }
            season.push(format!(
                "🏃 {} hits, {} RBI",
                snap.hits + 1,
                snap.rbi + rbi.unwrap_or(0)
            ));
            if let Some(babip) = present(&snap.babip) {
                season.push(format!("🍀 BABIP: {babip}"));
            }
            msg.section(season);
        }
    }

    fn walk(&self, msg: &mut NotificationMessage, situation: Option<&str>, snap: &AggregateSnapshot) {
        msg.section(vec![format!("👁️ {} draws a WALK!", self.name)]);

        let mut body = Vec::new();
        if snap.has_data() {
            let bb_rate = rate_pct(snap.walks + 1, snap.plate_appearances);
            body.push(format!("🎯 Plate Discipline: {bb_rate:.1}% BB rate"));
            body.push(format!(
                "📊 Season: {} BB, {} K",
                snap.walks + 1,
                snap.strikeouts
            ));
            if let Some(obp) = present(&snap.obp) {
                body.push(format!("👀 OBP: {obp}"));
            }
        }
        if let Some(s) = situation.and_then(present) {
            body.push(format!("⚾ {s}"));
        }
        msg.section(body);
    }

    fn strikeout(
        &self,
        msg: &mut NotificationMessage,
        kind: Option<StrikeoutKind>,
        pitch: &FinalPitch,
        snap: &AggregateSnapshot,
    ) {
        let headline = match kind {
            Some(k) => format!("❌ {} strikes out {}", self.name, k.label()),
            None => format!("❌ {} strikes out", self.name),
        };
        msg.section(vec![headline]);

        let mut lines = Vec::new();
        if let Some(t) = pitch.pitch_type.as_deref().and_then(present) {
            lines.push(format!("🎯 Final Pitch: {t}"));
        }
        if let Some(speed) = pitch.speed {
            lines.push(format!("⚡ Speed: {speed:.1} mph"));
        }
        if let Some(loc) = pitch.location.as_deref().and_then(present) {
            lines.push(format!("📍 Location: {loc}"));
        }
        msg.section(lines);

        if snap.has_data() {
            let k_rate = rate_pct(snap.strikeouts, snap.plate_appearances);
            msg.section(vec![
                format!("📊 Season K Rate: {k_rate:.1}%"),
                format!("⚾ {} K, {} BB", snap.strikeouts + 1, snap.walks),
            ]);
        }
    }

    fn other(
        &self,
        msg: &mut NotificationMessage,
        description: &str,
        contact: &Contact,
        snap: &AggregateSnapshot,
    ) {
        let what = present(description).unwrap_or("plate appearance");
        msg.section(vec![format!("⚾ {}: {what}", self.name)]);
        msg.section(contact_lines(contact));
        if snap.has_data() && present(&snap.avg).is_some() {
            msg.section(vec![format!("📊 Season: {}", snap.slash_line())]);
        }
    }
}

fn contact_lines(contact: &Contact) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(ev) = contact.exit_velocity {
        out.push(format!("💪 Exit Velocity: {ev:.1} mph"));
    }
    if let Some(la) = contact.launch_angle {
        out.push(format!("📐 Launch Angle: {la:.1}°"));
    }
    if let Some(d) = contact.distance {
        out.push(format!("📏 Distance: {d} ft"));
    }
    out
}
