//! Validated settings

use crate::schema::{RawBrowser, RawConfig};
use focus_host_api::BrowserBackend;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SESSION_TICK_MS: u64 = 1000;
pub const DEFAULT_ENFORCEMENT_INTERVAL_MS: u64 = 2000;
/// Blocked targets must be re-checked at least this often
pub const MAX_ENFORCEMENT_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 1500;
pub const DEFAULT_SNOOZE_SECONDS: u64 = 180;
pub const DEFAULT_REDIRECT_URL: &str = "about:blank";

/// Validated settings ready for use by the service
#[derive(Debug, Clone)]
pub struct Settings {
    pub service: ServiceConfig,
    pub timing: TimingConfig,
    /// Neutral URL that matched tabs are redirected to
    pub redirect_url: String,
    pub browsers: Vec<BrowserBackend>,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let browsers = if raw.browsers.is_empty() {
            BrowserBackend::defaults()
        } else {
            raw.browsers.into_iter().map(convert_browser).collect()
        };

        Self {
            service: ServiceConfig {
                socket_path: raw
                    .service
                    .socket_path
                    .unwrap_or_else(focus_util::socket_path_without_env),
                data_dir: raw
                    .service
                    .data_dir
                    .unwrap_or_else(focus_util::data_dir_without_env),
            },
            timing: TimingConfig {
                session_tick: Duration::from_millis(
                    raw.timing.session_tick_ms.unwrap_or(DEFAULT_SESSION_TICK_MS),
                ),
                enforcement_interval: Duration::from_millis(
                    raw.timing
                        .enforcement_interval_ms
                        .unwrap_or(DEFAULT_ENFORCEMENT_INTERVAL_MS),
                ),
                call_timeout: Duration::from_millis(
                    raw.timing.call_timeout_ms.unwrap_or(DEFAULT_CALL_TIMEOUT_MS),
                ),
                default_snooze: Duration::from_secs(
                    raw.timing
                        .default_snooze_seconds
                        .unwrap_or(DEFAULT_SNOOZE_SECONDS),
                ),
            },
            redirect_url: raw
                .blocking
                .redirect_url
                .unwrap_or_else(|| DEFAULT_REDIRECT_URL.to_string()),
            browsers,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            timing: TimingConfig::default(),
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            browsers: BrowserBackend::defaults(),
        }
    }
}

/// Service paths
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub socket_path: PathBuf,
    pub data_dir: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            socket_path: focus_util::socket_path_without_env(),
            data_dir: focus_util::data_dir_without_env(),
        }
    }
}

/// Timer settings
#[derive(Debug, Clone, Copy)]
pub struct TimingConfig {
    pub session_tick: Duration,
    pub enforcement_interval: Duration,
    pub call_timeout: Duration,
    pub default_snooze: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            session_tick: Duration::from_millis(DEFAULT_SESSION_TICK_MS),
            enforcement_interval: Duration::from_millis(DEFAULT_ENFORCEMENT_INTERVAL_MS),
            call_timeout: Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS),
            default_snooze: Duration::from_secs(DEFAULT_SNOOZE_SECONDS),
        }
    }
}

fn convert_browser(raw: RawBrowser) -> BrowserBackend {
    let mut backend = BrowserBackend::new(raw.name, raw.bundle_id, raw.scan);
    if let Some(name) = raw.process_name {
        backend = backend.with_process_name(name);
    }
    if let Some(reference) = raw.active_tab_ref {
        backend = backend.with_active_tab_ref(reference);
    }
    backend
}
