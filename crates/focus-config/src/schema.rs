//! Raw configuration schema (as parsed from TOML)

use focus_host_api::TabScanMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    #[serde(default)]
    pub service: RawServiceConfig,

    #[serde(default)]
    pub timing: RawTimingConfig,

    #[serde(default)]
    pub blocking: RawBlockingConfig,

    /// Browser backends. Empty means the built-in list.
    #[serde(default)]
    pub browsers: Vec<RawBrowser>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// IPC socket path
    pub socket_path: Option<PathBuf>,

    /// Data directory for store
    pub data_dir: Option<PathBuf>,
}

/// Timer settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTimingConfig {
    /// Session countdown tick (default: 1000)
    pub session_tick_ms: Option<u64>,

    /// Reconciliation poll interval for apps and tabs (default: 2000)
    pub enforcement_interval_ms: Option<u64>,

    /// Upper bound on a single OS call (default: 1500)
    pub call_timeout_ms: Option<u64>,

    /// Snooze length when a request names none (default: 180)
    pub default_snooze_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawBlockingConfig {
    /// Where matched tabs are sent (default: about:blank)
    pub redirect_url: Option<String>,
}

/// Browser backend definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawBrowser {
    /// Application name used in scripts
    pub name: String,

    pub bundle_id: String,

    /// Fallback process name for running-detection
    pub process_name: Option<String>,

    /// Script reference to the focused tab (default: "active tab")
    pub active_tab_ref: Option<String>,

    pub scan: TabScanMode,
}
