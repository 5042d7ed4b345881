//! Configuration validation

use crate::schema::{RawBrowser, RawConfig};
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Browser '{name}': {message}")]
    BrowserError { name: String, message: String },

    #[error("Duplicate browser name: {0}")]
    DuplicateBrowser(String),

    #[error("Timing '{field}': {message}")]
    TimingError { field: &'static str, message: String },

    #[error("Global config error: {0}")]
    GlobalError(String),
}

/// Validate a raw configuration, collecting every problem
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let timing = &config.timing;
    for (field, value) in [
        ("session_tick_ms", timing.session_tick_ms),
        ("enforcement_interval_ms", timing.enforcement_interval_ms),
        ("call_timeout_ms", timing.call_timeout_ms),
        ("default_snooze_seconds", timing.default_snooze_seconds),
    ] {
        if value == Some(0) {
            errors.push(ValidationError::TimingError {
                field,
                message: "must be greater than zero".into(),
            });
        }
    }

    let interval = timing
        .enforcement_interval_ms
        .unwrap_or(crate::DEFAULT_ENFORCEMENT_INTERVAL_MS);
    if interval > crate::MAX_ENFORCEMENT_INTERVAL_MS {
        errors.push(ValidationError::TimingError {
            field: "enforcement_interval_ms",
            message: format!(
                "{}ms exceeds the maximum of {}ms",
                interval,
                crate::MAX_ENFORCEMENT_INTERVAL_MS
            ),
        });
    }
    let call_timeout = timing.call_timeout_ms.unwrap_or(crate::DEFAULT_CALL_TIMEOUT_MS);
    if call_timeout >= interval && call_timeout > 0 {
        errors.push(ValidationError::TimingError {
            field: "call_timeout_ms",
            message: format!(
                "{}ms must be shorter than enforcement_interval_ms ({}ms)",
                call_timeout, interval
            ),
        });
    }

    if let Some(url) = &config.blocking.redirect_url
        && url.trim().is_empty()
    {
        errors.push(ValidationError::GlobalError(
            "blocking.redirect_url cannot be empty".into(),
        ));
    }

    let mut seen = HashSet::new();
    for browser in &config.browsers {
        if !seen.insert(browser.name.to_lowercase()) {
            errors.push(ValidationError::DuplicateBrowser(browser.name.clone()));
        }
        errors.extend(validate_browser(browser));
    }

    errors
}

fn validate_browser(browser: &RawBrowser) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if browser.name.trim().is_empty() {
        errors.push(ValidationError::BrowserError {
            name: browser.name.clone(),
            message: "name cannot be empty".into(),
        });
    }
    if browser.bundle_id.trim().is_empty() {
        errors.push(ValidationError::BrowserError {
            name: browser.name.clone(),
            message: "bundle_id cannot be empty".into(),
        });
    }
    // Spliced into AppleScript unquoted, so only plain words are allowed
    if let Some(reference) = &browser.active_tab_ref {
        if reference.trim().is_empty() {
            errors.push(ValidationError::BrowserError {
                name: browser.name.clone(),
                message: "active_tab_ref cannot be empty".into(),
            });
        } else if !reference.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ') {
            errors.push(ValidationError::BrowserError {
                name: browser.name.clone(),
                message: format!("active_tab_ref {:?} may only contain letters, digits and spaces", reference),
            });
        }
    }

    errors
}
