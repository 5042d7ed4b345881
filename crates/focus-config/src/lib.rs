//! Configuration parsing and validation for focusd
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Service paths, timing intervals and snooze length
//! - Browser backend definitions
//! - Validation with clear error messages

mod schema;
mod settings;
mod validation;

pub use schema::*;
pub use settings::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Settings> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Like [`load_config`], but a missing file yields the defaults
pub fn load_config_or_default(path: impl AsRef<Path>) -> ConfigResult<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!(path = %path.display(), "No config file, using defaults");
        return Ok(Settings::default());
    }
    load_config(path)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Settings> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Settings::from_raw(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_host_api::TabScanMode;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn parse_minimal_config() {
        let settings = parse_config("config_version = 1").unwrap();
        assert_eq!(settings.timing.enforcement_interval, Duration::from_secs(2));
        assert_eq!(settings.timing.default_snooze, Duration::from_secs(180));
        assert_eq!(settings.redirect_url, "about:blank");
        assert_eq!(settings.browsers.len(), 4);
    }

    #[test]
    fn parse_full_config() {
        let config = r#"
            config_version = 1

            [service]
            socket_path = "/tmp/focusd-test.sock"
            data_dir = "/tmp/focusd-data"

            [timing]
            session_tick_ms = 500
            enforcement_interval_ms = 1500
            call_timeout_ms = 1000
            default_snooze_seconds = 60

            [blocking]
            redirect_url = "https://example.org/focus"

            [[browsers]]
            name = "Brave Browser"
            bundle_id = "com.brave.Browser"
            scan = "all_tabs"

            [[browsers]]
            name = "Arc"
            bundle_id = "company.thebrowser.Browser"
            process_name = "Arc"
            scan = "active_tab_only"
        "#;

        let settings = parse_config(config).unwrap();
        assert_eq!(settings.service.socket_path.to_str(), Some("/tmp/focusd-test.sock"));
        assert_eq!(settings.timing.session_tick, Duration::from_millis(500));
        assert_eq!(settings.timing.enforcement_interval, Duration::from_millis(1500));
        assert_eq!(settings.timing.call_timeout, Duration::from_secs(1));
        assert_eq!(settings.timing.default_snooze, Duration::from_secs(60));
        assert_eq!(settings.redirect_url, "https://example.org/focus");
        assert_eq!(settings.browsers.len(), 2);
        assert_eq!(settings.browsers[1].scan_mode, TabScanMode::ActiveTabOnly);
        assert_eq!(settings.browsers[0].active_tab_ref, "active tab");
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config("config_version = 99");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_unknown_scan_mode() {
        let config = r#"
            config_version = 1
            [[browsers]]
            name = "Opera"
            bundle_id = "com.operasoftware.Opera"
            scan = "some_tabs"
        "#;
        assert!(matches!(parse_config(config), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_config_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.timing.session_tick, Duration::from_secs(1));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "config_version = 1\n[timing]\ndefault_snooze_seconds = 300").unwrap();

        let settings = load_config(file.path()).unwrap();
        assert_eq!(settings.timing.default_snooze, Duration::from_secs(300));
    }
}
