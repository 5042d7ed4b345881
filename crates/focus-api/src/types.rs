//! View types shared by responses and events

use chrono::{DateTime, Local};
use focus_util::SessionId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{BlockCategory, FocusSession, SessionState, SnoozeEntry};

/// Current session as shown to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub goal: String,
    pub state: SessionState,
    pub started_at: Option<DateTime<Local>>,
    pub ends_at: Option<DateTime<Local>>,
    pub duration: Duration,
    pub remaining: Duration,
    pub progress: f64,
    pub total_paused: Duration,
    pub blocked_apps: Vec<String>,
    pub blocked_websites: Vec<String>,
    pub block_categories: Vec<BlockCategory>,
}

impl SessionInfo {
    pub fn from_session(session: &FocusSession, now: DateTime<Local>) -> Self {
        Self {
            session_id: session.id,
            goal: session.goal.clone(),
            state: session.state(now),
            started_at: session.start_time,
            ends_at: session.end_time,
            duration: session.duration,
            remaining: session.remaining(now),
            progress: session.progress(now),
            total_paused: session.total_paused,
            blocked_apps: session.blocked_apps.iter().cloned().collect(),
            blocked_websites: session.blocked_websites.iter().cloned().collect(),
            block_categories: session.block_categories.iter().copied().collect(),
        }
    }
}

/// Full service state snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStateSnapshot {
    pub api_version: u32,
    pub state: SessionState,
    pub current_session: Option<SessionInfo>,
    /// Active snoozes
    #[serde(default)]
    pub snoozes: Vec<SnoozeEntry>,
    /// Apps currently being enforced
    #[serde(default)]
    pub enforced_apps: Vec<String>,
    /// Domains currently being enforced
    #[serde(default)]
    pub enforced_websites: Vec<String>,
}

/// Category with its default lists, for pickers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryView {
    pub category: BlockCategory,
    pub display_name: String,
    pub apps: Vec<String>,
    pub websites: Vec<String>,
}

impl From<BlockCategory> for CategoryView {
    fn from(category: BlockCategory) -> Self {
        Self {
            category,
            display_name: category.display_name().to_string(),
            apps: category.default_apps().iter().map(|s| s.to_string()).collect(),
            websites: category.default_websites().iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEndReason {
    /// Ran out of time
    Completed,
    /// Stopped by the user
    Stopped,
}

/// Health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub live: bool,
    pub ready: bool,
    pub host_ok: bool,
    pub store_ok: bool,
}
