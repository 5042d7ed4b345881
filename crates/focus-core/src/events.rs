//! Events emitted by the core

use chrono::{DateTime, Local};
use focus_api::{SessionEndReason, SessionState, TargetKind};
use focus_util::SessionId;
use std::time::Duration;

/// Events emitted by the session controller
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    SessionStarted {
        session_id: SessionId,
        goal: String,
        ends_at: Option<DateTime<Local>>,
    },

    /// A persisted session was picked up after a restart
    SessionRestored {
        session_id: SessionId,
        state: SessionState,
    },

    SessionPaused {
        session_id: SessionId,
        remaining: Duration,
    },

    SessionResumed {
        session_id: SessionId,
        remaining: Duration,
    },

    SessionExtended {
        session_id: SessionId,
        by: Duration,
        ends_at: Option<DateTime<Local>>,
    },

    SessionEnded {
        session_id: SessionId,
        reason: SessionEndReason,
        focused: Duration,
    },

    /// Countdown moved; policy unchanged
    Tick {
        session_id: SessionId,
        remaining: Duration,
    },

    SnoozeStarted {
        target: String,
        kind: TargetKind,
        expires_at: DateTime<Local>,
    },

    SnoozeEnded {
        target: String,
        kind: TargetKind,
    },
}

/// Observations published by the enforcers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnforcementEvent {
    /// A target was suppressed or redirected. The user may snooze it.
    Blocked { target: String, kind: TargetKind },
}
