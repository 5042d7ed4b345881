//! Event types for focusd -> client streaming

use chrono::{DateTime, Local};
use focus_util::SessionId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{API_VERSION, ServiceStateSnapshot, SessionEndReason, TargetKind};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Local>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: focus_util::now(),
            payload,
        }
    }
}

/// All possible events from the service to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Full state snapshot (sent on subscribe and major changes)
    StateChanged(ServiceStateSnapshot),

    SessionStarted {
        session_id: SessionId,
        goal: String,
        ends_at: Option<DateTime<Local>>,
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

    /// Once per session tick while active
    Tick {
        session_id: SessionId,
        remaining: Duration,
    },

    /// A blocked target was just suppressed. Clients may offer a snooze.
    BlockNotice {
        target: String,
        kind: TargetKind,
        snooze_seconds: u64,
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

    /// Service is shutting down
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization() {
        let event = Event::new(EventPayload::BlockNotice {
            target: "Twitter".into(),
            kind: TargetKind::App,
            snooze_seconds: 180,
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"block_notice\""));

        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.api_version, API_VERSION);
        assert!(matches!(parsed.payload, EventPayload::BlockNotice { snooze_seconds: 180, .. }));
    }

    #[test]
    fn session_ended_serialization() {
        let event = Event::new(EventPayload::SessionEnded {
            session_id: SessionId::new(),
            reason: SessionEndReason::Completed,
            focused: Duration::from_secs(1500),
        });
        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();
        if let EventPayload::SessionEnded { reason, focused, .. } = parsed.payload {
            assert_eq!(reason, SessionEndReason::Completed);
            assert_eq!(focused, Duration::from_secs(1500));
        } else {
            panic!("Expected SessionEnded");
        }
    }
}
