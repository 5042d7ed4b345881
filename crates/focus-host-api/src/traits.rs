//! OS capability trait

use async_trait::async_trait;
use focus_api::{TargetKind, normalize_domain, domain_matches};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::{BrowserBackend, HostCapabilities};

/// Errors from OS capability calls
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Application not found: {0}")]
    AppNotFound(String),

    #[error("Browser backend unsupported: {0}")]
    Unsupported(String),

    #[error("Script failed: {0}")]
    ScriptFailed(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// A running application as observed by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningApp {
    /// Display name, matched against blocked app names
    pub name: String,
    pub bundle_id: Option<String>,
    pub is_foreground: bool,
}

impl RunningApp {
    pub fn new(name: impl Into<String>, is_foreground: bool) -> Self {
        Self {
            name: name.into(),
            bundle_id: None,
            is_foreground,
        }
    }
}

/// The set of normalized domains a tab scan looks for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabMatcher {
    domains: Vec<String>,
}

impl TabMatcher {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domains: domains.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Returns the blocked domain a tab URL falls under, if any
    pub fn matching_domain(&self, url: &str) -> Option<&str> {
        let host = normalize_domain(url)?;
        self.domains
            .iter()
            .find(|d| domain_matches(&host, d))
            .map(String::as_str)
    }

    pub fn matches(&self, url: &str) -> bool {
        self.matching_domain(url).is_some()
    }
}

/// Result of one tab scan against one browser
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabScanOutcome {
    /// Tabs inspected
    pub scanned: usize,
    /// Blocked domains of the tabs that were redirected
    pub redirected: Vec<String>,
}

/// Events raised by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// An application came to the foreground
    AppActivated { name: String },

    /// The user asked for a snooze from a native block notice
    SnoozeRequested { target: String, kind: TargetKind },
}

/// OS capability - implemented once per platform.
///
/// These are the only calls through which focusd observes or changes the
/// host. Every method may be slow; callers bound them with a timeout.
#[async_trait]
pub trait OsCapability: Send + Sync {
    /// Get the capabilities of this host
    fn capabilities(&self) -> &HostCapabilities;

    /// Running applications, with the foreground one flagged
    async fn list_running_applications(&self) -> HostResult<Vec<RunningApp>>;

    /// Hide an application. Never terminates it.
    async fn suppress(&self, name: &str) -> HostResult<()>;

    /// Reverse a previous `suppress`
    async fn restore(&self, name: &str) -> HostResult<()>;

    /// Installed application names, sorted
    async fn list_installed_applications(&self) -> HostResult<Vec<String>>;

    /// Whether the browser is already running. Must never launch it.
    async fn is_browser_running(&self, backend: &BrowserBackend) -> HostResult<bool>;

    /// Point every scanned tab that matches at `redirect_url`.
    ///
    /// Which tabs are scanned follows `backend.scan_mode`.
    async fn redirect_matching_tabs(
        &self,
        backend: &BrowserBackend,
        matcher: &TabMatcher,
        redirect_url: &str,
    ) -> HostResult<TabScanOutcome>;

    /// Subscribe to host events
    fn subscribe(&self) -> broadcast::Receiver<HostEvent>;

    /// Optional: check if the host is healthy
    fn is_healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matcher_finds_blocked_domain() {
        let matcher = TabMatcher::new(["youtube.com", "reddit.com"]);
        assert_eq!(matcher.matching_domain("https://www.youtube.com/watch?v=x"), Some("youtube.com"));
        assert_eq!(matcher.matching_domain("https://old.reddit.com/r/rust"), Some("reddit.com"));
        assert_eq!(matcher.matching_domain("https://notyoutube.com/youtube.com"), None);
        assert_eq!(matcher.matching_domain("about:blank"), None);
    }

    #[test]
    fn empty_matcher_matches_nothing() {
        let matcher = TabMatcher::default();
        assert!(matcher.is_empty());
        assert!(!matcher.matches("https://example.com"));
    }
}
