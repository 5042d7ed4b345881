//! Desired policy: what should be blocked right now

use chrono::{DateTime, Local};
use focus_api::{FocusSession, SnoozeEntry, TargetKind, normalize_app_name, normalize_domain};
use std::collections::BTreeSet;

/// Targets that should currently be blocked.
///
/// Always `(explicit ∪ category defaults) \ snoozed`, recomputed from
/// scratch so it has no memory of earlier states.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredPolicy {
    pub apps: BTreeSet<String>,
    pub websites: BTreeSet<String>,
}

impl DesiredPolicy {
    /// Nothing blocked
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn compute(session: &FocusSession, snoozes: &[SnoozeEntry], now: DateTime<Local>) -> Self {
        let exempt = |target: &str, kind: TargetKind| {
            snoozes
                .iter()
                .any(|e| e.is_active(now) && e.matches(target, kind))
        };

        let category_apps = session
            .block_categories
            .iter()
            .flat_map(|c| c.default_apps().iter().copied());
        let apps = session
            .blocked_apps
            .iter()
            .map(String::as_str)
            .chain(category_apps)
            .filter_map(normalize_app_name)
            .filter(|app| !exempt(app, TargetKind::App))
            .collect();

        let category_sites = session
            .block_categories
            .iter()
            .flat_map(|c| c.default_websites().iter().copied());
        let websites = session
            .blocked_websites
            .iter()
            .map(String::as_str)
            .chain(category_sites)
            .filter_map(normalize_domain)
            .filter(|site| !exempt(site, TargetKind::Website))
            .collect();

        Self { apps, websites }
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty() && self.websites.is_empty()
    }

    pub fn contains(&self, target: &str, kind: TargetKind) -> bool {
        match kind {
            TargetKind::App => self.apps.iter().any(|a| focus_api::app_matches(a, target)),
            TargetKind::Website => self.websites.contains(target),
        }
    }
}
