//! Persisted data model: sessions, presets and snooze entries

use chrono::{DateTime, Local};
use focus_util::{PresetId, SessionId, elapsed_between};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::{BlockCategory, TargetKind, app_matches, normalize_app_name, normalize_domain};

/// Default length of a new session
pub const DEFAULT_SESSION_DURATION: Duration = Duration::from_secs(25 * 60);

/// Lifecycle state of the controller's current session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session
    Idle,
    /// Timer running, policy enforced
    Active,
    /// Timer frozen, policy lifted
    Paused,
    /// Out of time, about to be folded into history
    Completed,
}

/// A focus session.
///
/// `paused_at` is set exactly when `paused` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: SessionId,
    pub goal: String,
    pub duration: Duration,
    pub start_time: Option<DateTime<Local>>,
    pub end_time: Option<DateTime<Local>>,
    #[serde(default)]
    pub blocked_apps: BTreeSet<String>,
    #[serde(default)]
    pub blocked_websites: BTreeSet<String>,
    #[serde(default)]
    pub block_categories: BTreeSet<BlockCategory>,
    pub active: bool,
    pub paused: bool,
    pub paused_at: Option<DateTime<Local>>,
    #[serde(default)]
    pub total_paused: Duration,
}

impl FocusSession {
    pub fn new(goal: impl Into<String>, duration: Duration) -> Self {
        Self {
            id: SessionId::new(),
            goal: goal.into(),
            duration,
            start_time: None,
            end_time: None,
            blocked_apps: BTreeSet::new(),
            blocked_websites: BTreeSet::new(),
            block_categories: BTreeSet::new(),
            active: false,
            paused: false,
            paused_at: None,
            total_paused: Duration::ZERO,
        }
    }

    /// Add apps, dropping names that do not normalize
    pub fn with_apps<I, S>(mut self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.blocked_apps
            .extend(apps.into_iter().filter_map(|a| normalize_app_name(a.as_ref())));
        self
    }

    /// Add websites, dropping entries that do not normalize to a host
    pub fn with_websites<I, S>(mut self, sites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.blocked_websites
            .extend(sites.into_iter().filter_map(|s| normalize_domain(s.as_ref())));
        self
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = BlockCategory>) -> Self {
        self.block_categories.extend(categories);
        self
    }

    /// Time actively focused as of `now`, excluding pauses
    pub fn focused_time(&self, now: DateTime<Local>) -> Duration {
        let Some(start) = self.start_time else {
            return Duration::ZERO;
        };
        let effective_now = self.paused_at.unwrap_or(now);
        elapsed_between(start, effective_now).saturating_sub(self.total_paused)
    }

    /// Remaining time. While paused the clock is frozen at `paused_at`.
    /// Sessions that are not active report their full duration.
    pub fn remaining(&self, now: DateTime<Local>) -> Duration {
        if !self.active || self.start_time.is_none() {
            return self.duration;
        }
        self.duration.saturating_sub(self.focused_time(now))
    }

    pub fn is_completed(&self, now: DateTime<Local>) -> bool {
        self.active && self.remaining(now).is_zero()
    }

    /// Fraction of the duration already focused, in `0.0..=1.0`
    pub fn progress(&self, now: DateTime<Local>) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let remaining = self.remaining(now).as_secs_f64();
        (1.0 - remaining / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    pub fn state(&self, now: DateTime<Local>) -> SessionState {
        if !self.active {
            SessionState::Idle
        } else if self.paused {
            SessionState::Paused
        } else if self.is_completed(now) {
            SessionState::Completed
        } else {
            SessionState::Active
        }
    }
}

/// A reusable session template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub id: PresetId,
    /// Session this preset was saved from, if any
    #[serde(default)]
    pub source_session_id: Option<SessionId>,
    pub name: String,
    pub duration: Duration,
    #[serde(default)]
    pub block_categories: BTreeSet<BlockCategory>,
    #[serde(default)]
    pub custom_apps: BTreeSet<String>,
    #[serde(default)]
    pub custom_websites: BTreeSet<String>,
}

impl Preset {
    pub fn new(
        name: impl Into<String>,
        duration: Duration,
        categories: impl IntoIterator<Item = BlockCategory>,
    ) -> Self {
        Self {
            id: PresetId::new(),
            source_session_id: None,
            name: name.into(),
            duration,
            block_categories: categories.into_iter().collect(),
            custom_apps: BTreeSet::new(),
            custom_websites: BTreeSet::new(),
        }
    }

    /// Built-in presets used until the user saves their own
    pub fn defaults() -> Vec<Preset> {
        use BlockCategory::*;
        vec![
            Preset::new(
                "Deep Work",
                Duration::from_secs(2 * 60 * 60),
                [SocialMedia, Shopping, Entertainment, Messaging],
            ),
            Preset::new("Quick Focus", Duration::from_secs(25 * 60), [SocialMedia, Entertainment]),
            Preset::new(
                "Study Session",
                Duration::from_secs(60 * 60),
                [SocialMedia, Gaming, Entertainment],
            ),
            Preset::new(
                "Meeting Mode",
                Duration::from_secs(30 * 60),
                [SocialMedia, Shopping, Gaming],
            ),
        ]
    }

    /// Capture a session's configuration as a preset named after its goal
    pub fn from_session(session: &FocusSession) -> Self {
        let name = if session.goal.trim().is_empty() {
            "Untitled".to_string()
        } else {
            session.goal.clone()
        };
        Self {
            id: PresetId::new(),
            source_session_id: Some(session.id),
            name,
            duration: session.duration,
            block_categories: session.block_categories.clone(),
            custom_apps: session.blocked_apps.clone(),
            custom_websites: session.blocked_websites.clone(),
        }
    }

    /// Build a fresh, unstarted session from this preset.
    ///
    /// The goal defaults to the preset name. Explicit lists are merged with
    /// the categories' default lists.
    pub fn to_session(&self, goal: Option<String>) -> FocusSession {
        let goal = goal
            .filter(|g| !g.trim().is_empty())
            .unwrap_or_else(|| self.name.clone());
        let category_apps = self
            .block_categories
            .iter()
            .flat_map(|c| c.default_apps().iter().copied());
        let category_sites = self
            .block_categories
            .iter()
            .flat_map(|c| c.default_websites().iter().copied());

        FocusSession::new(goal, self.duration)
            .with_apps(self.custom_apps.iter().map(String::as_str).chain(category_apps))
            .with_websites(self.custom_websites.iter().map(String::as_str).chain(category_sites))
            .with_categories(self.block_categories.iter().copied())
    }
}

/// What a client asks for when starting a session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionPlan {
    pub goal: String,
    pub duration: Option<Duration>,
    #[serde(default)]
    pub apps: Vec<String>,
    #[serde(default)]
    pub websites: Vec<String>,
    #[serde(default)]
    pub categories: Vec<BlockCategory>,
}

impl SessionPlan {
    pub fn into_session(self) -> FocusSession {
        FocusSession::new(self.goal, self.duration.unwrap_or(DEFAULT_SESSION_DURATION))
            .with_apps(self.apps)
            .with_websites(self.websites)
            .with_categories(self.categories)
    }
}

/// A time-boxed exemption for one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnoozeEntry {
    pub target: String,
    pub kind: TargetKind,
    pub expires_at: DateTime<Local>,
}

impl SnoozeEntry {
    pub fn is_active(&self, now: DateTime<Local>) -> bool {
        now < self.expires_at
    }

    /// App names compare case-insensitively, domains exactly
    pub fn matches(&self, target: &str, kind: TargetKind) -> bool {
        self.kind == kind
            && match kind {
                TargetKind::App => app_matches(&self.target, target),
                TargetKind::Website => self.target == target,
            }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn secs(n: i64) -> chrono::Duration {
        chrono::Duration::seconds(n)
    }

    fn started(duration: u64) -> FocusSession {
        let mut s = FocusSession::new("write", Duration::from_secs(duration));
        s.start_time = Some(t0());
        s.end_time = Some(t0() + secs(duration as i64));
        s.active = true;
        s
    }

    #[test]
    fn remaining_counts_down_while_active() {
        let s = started(1500);
        assert_eq!(s.remaining(t0()), Duration::from_secs(1500));
        assert_eq!(s.remaining(t0() + secs(600)), Duration::from_secs(900));
        assert_eq!(s.remaining(t0() + secs(5000)), Duration::ZERO);
        assert!(s.is_completed(t0() + secs(1500)));
        assert_eq!(s.state(t0() + secs(1500)), SessionState::Completed);
    }

    #[test]
    fn remaining_is_frozen_while_paused() {
        let mut s = started(1500);
        s.paused = true;
        s.paused_at = Some(t0() + secs(600));
        assert_eq!(s.remaining(t0() + secs(600)), Duration::from_secs(900));
        assert_eq!(s.remaining(t0() + secs(4000)), Duration::from_secs(900));
        assert_eq!(s.state(t0() + secs(4000)), SessionState::Paused);
    }

    #[test]
    fn paused_time_is_not_counted() {
        let mut s = started(1500);
        s.total_paused = Duration::from_secs(300);
        assert_eq!(s.remaining(t0() + secs(900)), Duration::from_secs(900));
    }

    #[test]
    fn inactive_session_reports_full_duration() {
        let s = FocusSession::new("idle", Duration::from_secs(60));
        assert_eq!(s.remaining(t0()), Duration::from_secs(60));
        assert!(!s.is_completed(t0()));
        assert_eq!(s.state(t0()), SessionState::Idle);
    }

    #[test]
    fn progress_bounds() {
        let s = started(1000);
        assert_eq!(s.progress(t0()), 0.0);
        assert!((s.progress(t0() + secs(250)) - 0.25).abs() < 1e-9);
        assert_eq!(s.progress(t0() + secs(2000)), 1.0);
    }

    #[test]
    fn builders_drop_invalid_targets() {
        let s = FocusSession::new("g", Duration::from_secs(60))
            .with_apps(["Slack", "  ", "Slack.app"])
            .with_websites(["https://www.reddit.com/r/rust", "not a domain", "reddit.com"]);
        assert_eq!(s.blocked_apps.len(), 1);
        assert_eq!(s.blocked_websites.iter().collect::<Vec<_>>(), vec!["reddit.com"]);
    }

    #[test]
    fn default_presets() {
        let presets = Preset::defaults();
        let names: Vec<_> = presets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Deep Work", "Quick Focus", "Study Session", "Meeting Mode"]);
        assert_eq!(presets[0].duration, Duration::from_secs(7200));
        assert!(presets[1].block_categories.contains(&BlockCategory::Entertainment));
    }

    #[test]
    fn preset_session_merges_category_defaults() {
        let mut preset = Preset::new("Reading", Duration::from_secs(1800), [BlockCategory::Gaming]);
        preset.custom_websites.insert("news.ycombinator.com".into());

        let session = preset.to_session(None);
        assert_eq!(session.goal, "Reading");
        assert_eq!(session.duration, Duration::from_secs(1800));
        assert!(session.blocked_websites.contains("news.ycombinator.com"));
        assert!(session.blocked_websites.contains("steampowered.com"));
        assert!(session.blocked_apps.contains("Steam"));
        assert!(!session.active);

        let session = preset.to_session(Some("Chapter 3".into()));
        assert_eq!(session.goal, "Chapter 3");
    }

    #[test]
    fn preset_from_session_keeps_back_reference() {
        let session = started(900).with_apps(["Discord"]);
        let preset = Preset::from_session(&session);
        assert_eq!(preset.source_session_id, Some(session.id));
        assert_eq!(preset.name, "write");
        assert!(preset.custom_apps.contains("Discord"));
    }

    #[test]
    fn snooze_entry_activity() {
        let entry = SnoozeEntry {
            target: "Twitter".into(),
            kind: TargetKind::App,
            expires_at: t0() + secs(180),
        };
        assert!(entry.is_active(t0()));
        assert!(!entry.is_active(t0() + secs(180)));
        assert!(entry.matches("Twitter", TargetKind::App));
        assert!(entry.matches("twitter", TargetKind::App));
        assert!(!entry.matches("Twitter", TargetKind::Website));
    }

    #[test]
    fn session_round_trips_through_json() {
        let mut s = started(1500)
            .with_apps(["Slack"])
            .with_websites(["x.com"])
            .with_categories([BlockCategory::News]);
        s.paused = true;
        s.paused_at = Some(t0() + secs(30));
        s.total_paused = Duration::from_millis(1234);

        let json = serde_json::to_string(&s).unwrap();
        let parsed: FocusSession = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, s);
    }
}
