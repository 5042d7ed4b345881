//! Audit event types

use chrono::{DateTime, Local};
use focus_api::{SessionEndReason, TargetKind};
use focus_util::{PresetId, SessionId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Types of audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    ServiceStarted,

    ServiceStopped,

    SessionStarted {
        session_id: SessionId,
        goal: String,
        duration: Duration,
    },

    /// Session picked up again after a restart
    SessionRestored { session_id: SessionId },

    SessionPaused { session_id: SessionId },

    SessionResumed {
        session_id: SessionId,
        paused_for: Duration,
    },

    SessionExtended {
        session_id: SessionId,
        extended_by: Duration,
    },

    SessionEnded {
        session_id: SessionId,
        reason: SessionEndReason,
        focused: Duration,
    },

    SnoozeGranted {
        target: String,
        kind: TargetKind,
        until: DateTime<Local>,
    },

    SnoozeExpired { target: String, kind: TargetKind },

    PresetSaved { preset_id: PresetId, name: String },

    PresetDeleted { preset_id: PresetId },

    HistoryEntryDeleted { session_id: SessionId },

    HistoryCleared { count: usize },

    ClientConnected { client_id: String },

    ClientDisconnected { client_id: String },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    pub timestamp: DateTime<Local>,

    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Set by store
            timestamp: focus_util::now(),
            event,
        }
    }
}
