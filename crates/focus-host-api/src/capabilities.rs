//! Host capabilities model

use serde::{Deserialize, Serialize};

/// Describes what an OS capability implementation can do
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostCapabilities {
    /// Can enumerate running applications and the foreground one
    pub can_list_running_apps: bool,

    /// Can hide an application without terminating it
    pub can_suppress_apps: bool,

    /// Can scan and redirect browser tabs
    pub can_scan_browser_tabs: bool,

    /// Can list installed applications for pickers
    pub can_list_installed_apps: bool,

    /// Emits an event when an application comes to the foreground
    pub can_observe_app_activation: bool,
}

impl HostCapabilities {
    /// Create minimal capabilities (observation only)
    pub fn minimal() -> Self {
        Self {
            can_list_running_apps: true,
            can_suppress_apps: false,
            can_scan_browser_tabs: false,
            can_list_installed_apps: false,
            can_observe_app_activation: false,
        }
    }

    /// Create capabilities for a macOS host driven through System Events
    pub fn macos_full() -> Self {
        Self {
            can_list_running_apps: true,
            can_suppress_apps: true,
            can_scan_browser_tabs: true,
            can_list_installed_apps: true,
            can_observe_app_activation: false,
        }
    }

    /// Whether enforcement of the given kind can do anything on this host
    pub fn can_enforce(&self, kind: focus_api::TargetKind) -> bool {
        match kind {
            focus_api::TargetKind::App => self.can_list_running_apps && self.can_suppress_apps,
            focus_api::TargetKind::Website => self.can_scan_browser_tabs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_api::TargetKind;

    #[test]
    fn minimal_cannot_enforce() {
        let caps = HostCapabilities::minimal();
        assert!(!caps.can_enforce(TargetKind::App));
        assert!(!caps.can_enforce(TargetKind::Website));
    }

    #[test]
    fn macos_can_enforce_both() {
        let caps = HostCapabilities::macos_full();
        assert!(caps.can_enforce(TargetKind::App));
        assert!(caps.can_enforce(TargetKind::Website));
    }
}
