//! Plain-text rendering of responses and events

use chrono::{DateTime, Local};
use focus_api::{
    CategoryView, Event, EventPayload, FocusSession, HealthStatus, Preset, ServiceStateSnapshot,
    SessionInfo, SessionState,
};
use focus_util::{format_countdown, format_duration};
use std::fmt::Write;

pub fn state(snapshot: &ServiceStateSnapshot, now: DateTime<Local>) -> String {
    let mut out = String::new();
    match &snapshot.current_session {
        None => out.push_str("No focus session\n"),
        Some(info) => out.push_str(&session(info)),
    }

    if !snapshot.enforced_apps.is_empty() {
        let _ = writeln!(out, "Blocking apps: {}", snapshot.enforced_apps.join(", "));
    }
    if !snapshot.enforced_websites.is_empty() {
        let _ = writeln!(
            out,
            "Blocking websites: {}",
            snapshot.enforced_websites.join(", ")
        );
    }
    for entry in &snapshot.snoozes {
        let left = (entry.expires_at - now).to_std().unwrap_or_default();
        let _ = writeln!(
            out,
            "Snoozed {} {} ({} left)",
            entry.kind,
            entry.target,
            format_countdown(left)
        );
    }
    out
}

pub fn session(info: &SessionInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", info.goal, state_label(info.state));
    match info.state {
        SessionState::Active | SessionState::Paused => {
            let _ = writeln!(
                out,
                "  {} remaining of {} ({:.0}%)",
                format_countdown(info.remaining),
                format_duration(info.duration),
                info.progress * 100.0
            );
        }
        SessionState::Completed | SessionState::Idle => {}
    }
    if let Some(ends_at) = info.ends_at {
        let _ = writeln!(out, "  ends at {}", ends_at.format("%H:%M:%S"));
    }
    let _ = writeln!(out, "  id {}", info.session_id);
    out
}

fn state_label(state: SessionState) -> &'static str {
    match state {
        SessionState::Idle => "idle",
        SessionState::Active => "active",
        SessionState::Paused => "paused",
        SessionState::Completed => "completed",
    }
}

pub fn presets(presets: &[Preset]) -> String {
    let mut out = String::new();
    for preset in presets {
        let categories: Vec<String> = preset
            .block_categories
            .iter()
            .map(|c| c.to_string())
            .collect();
        let _ = writeln!(
            out,
            "{}  {} ({})",
            preset.id,
            preset.name,
            format_duration(preset.duration)
        );
        if !categories.is_empty() {
            let _ = writeln!(out, "    categories: {}", categories.join(", "));
        }
        let extras: Vec<&str> = preset
            .custom_apps
            .iter()
            .chain(preset.custom_websites.iter())
            .map(String::as_str)
            .collect();
        if !extras.is_empty() {
            let _ = writeln!(out, "    also: {}", extras.join(", "));
        }
    }
    out
}

pub fn history(sessions: &[FocusSession]) -> String {
    let mut out = String::new();
    for session in sessions {
        let started = session
            .start_time
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".into());
        let focused = session
            .end_time
            .map(|end| session.focused_time(end).min(session.duration))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{}  {}  {} focused  {}",
            session.id,
            started,
            format_duration(focused),
            session.goal
        );
    }
    out
}

pub fn categories(categories: &[CategoryView]) -> String {
    let mut out = String::new();
    for view in categories {
        let _ = writeln!(out, "{}", view.display_name);
        let _ = writeln!(out, "  apps: {}", view.apps.join(", "));
        let _ = writeln!(out, "  websites: {}", view.websites.join(", "));
    }
    out
}

pub fn health(status: &HealthStatus) -> String {
    format!(
        "live: {}\nready: {}\nhost: {}\nstore: {}\n",
        yes_no(status.live),
        yes_no(status.ready),
        yes_no(status.host_ok),
        yes_no(status.store_ok)
    )
}

fn yes_no(value: bool) -> &'static str {
    if value { "ok" } else { "FAILING" }
}

/// One line per event; `None` for events not worth printing
pub fn event(event: &Event) -> Option<String> {
    let line = match &event.payload {
        EventPayload::StateChanged(_) | EventPayload::Tick { .. } => return None,
        EventPayload::SessionStarted { goal, ends_at, .. } => match ends_at {
            Some(ends_at) => format!("started: {} (until {})", goal, ends_at.format("%H:%M")),
            None => format!("started: {}", goal),
        },
        EventPayload::SessionPaused { remaining, .. } => {
            format!("paused with {} left", format_countdown(*remaining))
        }
        EventPayload::SessionResumed { remaining, .. } => {
            format!("resumed with {} left", format_countdown(*remaining))
        }
        EventPayload::SessionExtended { by, .. } => format!("extended by {}", format_duration(*by)),
        EventPayload::SessionEnded {
            reason, focused, ..
        } => format!("ended ({:?}) after {} focused", reason, format_duration(*focused)),
        EventPayload::BlockNotice {
            target,
            kind,
            snooze_seconds,
        } => format!(
            "blocked {} {} (snooze: focusctl snooze {} --for {})",
            kind,
            target,
            target,
            snooze_seconds / 60
        ),
        EventPayload::SnoozeStarted {
            target, expires_at, ..
        } => format!("snoozed {} until {}", target, expires_at.format("%H:%M:%S")),
        EventPayload::SnoozeEnded { target, .. } => format!("snooze over: {}", target),
        EventPayload::Shutdown => "focusd is shutting down".to_string(),
    };
    Some(format!("{} {}", event.timestamp.format("%H:%M:%S"), line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_api::{BlockCategory, SnoozeEntry, TargetKind};
    use std::time::Duration;

    #[test]
    fn idle_state() {
        let snapshot = ServiceStateSnapshot {
            api_version: focus_api::API_VERSION,
            state: SessionState::Idle,
            current_session: None,
            snoozes: vec![],
            enforced_apps: vec![],
            enforced_websites: vec![],
        };
        assert_eq!(state(&snapshot, focus_util::now()), "No focus session\n");
    }

    #[test]
    fn active_state_lists_blocks_and_snoozes() {
        let now = focus_util::now();
        let session = FocusSession::new("Write", Duration::from_secs(1500));
        let mut info = SessionInfo::from_session(&session, now);
        info.state = SessionState::Active;
        info.remaining = Duration::from_secs(1380);

        let snapshot = ServiceStateSnapshot {
            api_version: focus_api::API_VERSION,
            state: SessionState::Active,
            current_session: Some(info),
            snoozes: vec![SnoozeEntry {
                target: "twitter.com".into(),
                kind: TargetKind::Website,
                expires_at: now + chrono::Duration::seconds(90),
            }],
            enforced_apps: vec!["Slack".into()],
            enforced_websites: vec!["youtube.com".into()],
        };

        let text = state(&snapshot, now);
        assert!(text.contains("Write [active]"));
        assert!(text.contains("23:00 remaining"));
        assert!(text.contains("Blocking apps: Slack"));
        assert!(text.contains("Blocking websites: youtube.com"));
        assert!(text.contains("Snoozed website twitter.com (01:30 left)"));
    }

    #[test]
    fn categories_are_listed_by_display_name() {
        let views: Vec<CategoryView> = BlockCategory::ALL.into_iter().map(Into::into).collect();
        let text = categories(&views);
        assert!(text.contains("Social Media"));
        assert!(text.contains("Messaging"));
    }

    #[test]
    fn ticks_are_not_printed() {
        let tick = Event::new(EventPayload::Tick {
            session_id: focus_util::SessionId::new(),
            remaining: Duration::from_secs(10),
        });
        assert!(event(&tick).is_none());

        let notice = Event::new(EventPayload::BlockNotice {
            target: "Slack".into(),
            kind: TargetKind::App,
            snooze_seconds: 180,
        });
        let line = event(&notice).unwrap();
        assert!(line.contains("blocked app Slack"));
        assert!(line.contains("--for 3"));
    }
}
