//! Command types for the focusd protocol

use chrono::{DateTime, Local};
use focus_util::{ClientId, FocusError, PresetId, SessionId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    API_VERSION, CategoryView, FocusSession, HealthStatus, Preset, ServiceStateSnapshot,
    SessionInfo, SessionPlan, SnoozeEntry, TargetKind,
};

/// Request wrapper with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation
    pub request_id: u64,
    pub api_version: u32,
    pub command: Command,
}

impl Request {
    pub fn new(request_id: u64, command: Command) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            command,
        }
    }
}

/// Response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Corresponding request ID
    pub request_id: u64,
    pub api_version: u32,
    pub result: ResponseResult,
}

impl Response {
    pub fn success(request_id: u64, payload: ResponsePayload) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Ok(payload),
        }
    }

    pub fn error(request_id: u64, error: ErrorInfo) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Err(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseResult {
    Ok(ResponsePayload),
    Err(ErrorInfo),
}

/// Error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<FocusError> for ErrorInfo {
    fn from(err: FocusError) -> Self {
        let code = match &err {
            FocusError::PresetNotFound(_) => ErrorCode::PresetNotFound,
            FocusError::HistoryEntryNotFound(_) => ErrorCode::HistoryEntryNotFound,
            FocusError::PresetAlreadySaved(_) => ErrorCode::DuplicatePreset,
            FocusError::NoSession => ErrorCode::NoSession,
            FocusError::InvalidTransition(_) => ErrorCode::InvalidTransition,
            FocusError::ConfigError(_) => ErrorCode::ConfigError,
            FocusError::ValidationError(_) => ErrorCode::InvalidRequest,
            FocusError::HostError(_) => ErrorCode::HostError,
            FocusError::IpcError(_) | FocusError::Internal(_) => ErrorCode::InternalError,
        };
        ErrorInfo::new(code, err.to_string())
    }
}

/// Error codes for the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    InvalidTransition,
    NoSession,
    PresetNotFound,
    HistoryEntryNotFound,
    DuplicatePreset,
    ConfigError,
    HostError,
    InternalError,
}

/// All possible commands from clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Get current service state
    GetState,

    /// Start a new session from an ad-hoc plan
    StartSession { plan: SessionPlan },

    /// Start a new session from a saved preset
    StartPreset {
        preset_id: PresetId,
        goal: Option<String>,
    },

    Pause,
    Resume,
    Stop,

    /// Add time to the running session
    Extend { by: Duration },

    /// Exempt one target for a while
    Snooze {
        target: String,
        kind: TargetKind,
        /// Defaults to the configured snooze length
        duration: Option<Duration>,
    },

    ListPresets,
    SavePreset { preset: Preset },
    DeletePreset { preset_id: PresetId },
    /// Save a finished session from history as a preset
    SavePresetFromSession { session_id: SessionId },

    ListHistory,
    DeleteHistoryEntry { session_id: SessionId },
    ClearHistory,

    ListCategories,
    ListInstalledApps,

    /// Subscribe to events (returns immediately, events stream separately)
    SubscribeEvents,
    UnsubscribeEvents,

    GetHealth,

    /// Ping for keepalive
    Ping,
}

/// Response payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    State(ServiceStateSnapshot),
    Session(SessionInfo),
    Stopped {
        session: Option<SessionInfo>,
    },
    Snoozed {
        entry: SnoozeEntry,
    },
    Extended {
        new_end: Option<DateTime<Local>>,
    },
    Presets {
        presets: Vec<Preset>,
    },
    PresetSaved {
        preset: Preset,
    },
    PresetDeleted,
    History {
        sessions: Vec<FocusSession>,
    },
    HistoryEntryDeleted,
    HistoryCleared,
    Categories {
        categories: Vec<CategoryView>,
    },
    InstalledApps {
        apps: Vec<String>,
    },
    Subscribed {
        client_id: ClientId,
    },
    Unsubscribed,
    Health(HealthStatus),
    Pong,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockCategory;

    #[test]
    fn request_serialization() {
        let req = Request::new(
            7,
            Command::StartSession {
                plan: SessionPlan {
                    goal: "Write report".into(),
                    duration: Some(Duration::from_secs(1500)),
                    categories: vec![BlockCategory::SocialMedia],
                    ..Default::default()
                },
            },
        );
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"type\":\"start_session\""));

        let parsed: Request = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.request_id, 7);
        match parsed.command {
            Command::StartSession { plan } => {
                assert_eq!(plan.goal, "Write report");
                assert_eq!(plan.categories, vec![BlockCategory::SocialMedia]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn snooze_command_parses_without_duration() {
        let json = r#"{"request_id":1,"api_version":1,"command":{"type":"snooze","target":"Twitter","kind":"app","duration":null}}"#;
        let parsed: Request = serde_json::from_str(json).unwrap();
        assert!(matches!(
            parsed.command,
            Command::Snooze { kind: TargetKind::App, duration: None, .. }
        ));
    }

    #[test]
    fn focus_error_maps_to_code() {
        let info = ErrorInfo::from(FocusError::InvalidTransition("pause from idle".into()));
        assert_eq!(info.code, ErrorCode::InvalidTransition);
        assert!(info.message.contains("pause from idle"));

        let info = ErrorInfo::from(FocusError::PresetNotFound(PresetId::new()));
        assert_eq!(info.code, ErrorCode::PresetNotFound);
    }

    #[test]
    fn list_payloads_serialize_with_tag() {
        let resp = Response::success(
            2,
            ResponsePayload::Presets {
                presets: Preset::defaults(),
            },
        );
        let json = serde_json::to_string(&resp).unwrap();
        let parsed: Response = serde_json::from_str(&json).unwrap();
        match parsed.result {
            ResponseResult::Ok(ResponsePayload::Presets { presets }) => assert_eq!(presets.len(), 4),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn error_response_serialization() {
        let resp = Response::error(3, ErrorInfo::new(ErrorCode::NoSession, "No session"));
        let json = serde_json::to_string(&resp).unwrap();
        let parsed: Response = serde_json::from_str(&json).unwrap();
        assert!(matches!(parsed.result, ResponseResult::Err(ref e) if e.code == ErrorCode::NoSession));
    }
}
