//! Browser automation backends
//!
//! How a browser's tabs can be scanned is data, not code: each backend
//! carries a [`TabScanMode`] and the platform adapter reads it.

use serde::{Deserialize, Serialize};

/// How much of a browser's tab list can be inspected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabScanMode {
    /// Every tab of every window
    AllTabs,
    /// Only the active tab of the front window. Used when enumerating the
    /// full tab list is unreliable (Arc raises invalid-index errors).
    ActiveTabOnly,
    /// No scripting surface; the backend is skipped
    Unsupported,
}

/// A browser that can be scanned for blocked tabs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserBackend {
    /// Application name used to address the browser in scripts
    pub name: String,
    /// Bundle identifier used to detect a running instance
    pub bundle_id: String,
    /// Process name checked when the bundle id is not found
    pub process_name: Option<String>,
    /// Script reference to the focused tab of a window
    pub active_tab_ref: String,
    pub scan_mode: TabScanMode,
}

impl BrowserBackend {
    pub fn new(name: impl Into<String>, bundle_id: impl Into<String>, scan_mode: TabScanMode) -> Self {
        Self {
            name: name.into(),
            bundle_id: bundle_id.into(),
            process_name: None,
            active_tab_ref: "active tab".into(),
            scan_mode,
        }
    }

    pub fn with_process_name(mut self, name: impl Into<String>) -> Self {
        self.process_name = Some(name.into());
        self
    }

    pub fn with_active_tab_ref(mut self, reference: impl Into<String>) -> Self {
        self.active_tab_ref = reference.into();
        self
    }

    pub fn is_supported(&self) -> bool {
        self.scan_mode != TabScanMode::Unsupported
    }

    /// Safari, Chrome, Arc and Firefox
    pub fn defaults() -> Vec<BrowserBackend> {
        vec![
            BrowserBackend::new("Safari", "com.apple.Safari", TabScanMode::AllTabs)
                .with_active_tab_ref("current tab"),
            BrowserBackend::new("Google Chrome", "com.google.Chrome", TabScanMode::AllTabs),
            BrowserBackend::new("Arc", "company.thebrowser.Browser", TabScanMode::ActiveTabOnly)
                .with_process_name("Arc"),
            BrowserBackend::new("Firefox", "org.mozilla.firefox", TabScanMode::Unsupported),
        ]
    }
}
