//! Error types for focusd

use thiserror::Error;

use crate::{PresetId, SessionId};

/// Error type surfaced to IPC clients for rejected requests
#[derive(Debug, Error)]
pub enum FocusError {
    #[error("Preset not found: {0}")]
    PresetNotFound(PresetId),

    #[error("History entry not found: {0}")]
    HistoryEntryNotFound(SessionId),

    #[error("A preset was already saved from session {0}")]
    PresetAlreadySaved(SessionId),

    #[error("No session")]
    NoSession,

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Host error: {0}")]
    HostError(String),

    #[error("IPC error: {0}")]
    IpcError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FocusError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn host(msg: impl Into<String>) -> Self {
        Self::HostError(msg.into())
    }

    pub fn ipc(msg: impl Into<String>) -> Self {
        Self::IpcError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, FocusError>;
