//! macOS host adapter implementation

use async_trait::async_trait;
use focus_host_api::{
    BrowserBackend, HostCapabilities, HostError, HostEvent, HostResult, OsCapability, RunningApp,
    TabMatcher, TabScanMode, TabScanOutcome,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::script::*;
use crate::{application_dirs, scan_applications};

/// macOS host adapter.
///
/// Talks to System Events and to each browser through `osascript`. Needs
/// the Accessibility and Automation permissions; without them calls fail
/// with [`HostError::PermissionDenied`].
pub struct MacHost {
    capabilities: HostCapabilities,
    app_dirs: Vec<PathBuf>,
    event_tx: broadcast::Sender<HostEvent>,
}

impl MacHost {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(64);

        Self {
            capabilities: HostCapabilities {
                can_observe_app_activation: true,
                ..HostCapabilities::macos_full()
            },
            app_dirs: application_dirs(),
            event_tx,
        }
    }

    /// Watch the frontmost app and raise [`HostEvent::AppActivated`] on
    /// every change
    pub fn start_activation_monitor(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            let mut last: Option<String> = None;
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                match run_osascript(&frontmost_script()).await {
                    Ok(name) if !name.is_empty() && last.as_deref() != Some(name.as_str()) => {
                        debug!(app = %name, "Frontmost app changed");
                        let _ = event_tx.send(HostEvent::AppActivated { name: name.clone() });
                        last = Some(name);
                    }
                    Ok(_) => {}
                    Err(e) => debug!(error = %e, "Frontmost app query failed"),
                }
            }
        })
    }

    async fn redirect_all_tabs(
        &self,
        backend: &BrowserBackend,
        matcher: &TabMatcher,
        redirect_url: &str,
    ) -> HostResult<TabScanOutcome> {
        let tabs = parse_tab_list(&run_osascript(&list_all_tabs_script(&backend.name)).await?);
        let mut outcome = TabScanOutcome {
            scanned: tabs.len(),
            redirected: Vec::new(),
        };

        for tab in tabs {
            let Some(domain) = matcher.matching_domain(&tab.url) else {
                continue;
            };
            let script = set_tab_url_script(&backend.name, tab.window, tab.tab, redirect_url);
            match run_osascript(&script).await {
                Ok(_) => outcome.redirected.push(domain.to_string()),
                // The tab may have closed since the listing
                Err(e) => warn!(browser = %backend.name, error = %e, "Failed to redirect tab"),
            }
        }
        Ok(outcome)
    }

    async fn redirect_active_tab(
        &self,
        backend: &BrowserBackend,
        matcher: &TabMatcher,
        redirect_url: &str,
    ) -> HostResult<TabScanOutcome> {
        let url = run_osascript(&active_tab_url_script(&backend.name, &backend.active_tab_ref)).await?;
        let mut outcome = TabScanOutcome {
            scanned: 1,
            redirected: Vec::new(),
        };

        if let Some(domain) = matcher.matching_domain(&url) {
            let script = set_active_tab_url_script(&backend.name, &backend.active_tab_ref, redirect_url);
            run_osascript(&script).await?;
            outcome.redirected.push(domain.to_string());
        }
        Ok(outcome)
    }
}

impl Default for MacHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OsCapability for MacHost {
    fn capabilities(&self) -> &HostCapabilities {
        &self.capabilities
    }

    async fn list_running_applications(&self) -> HostResult<Vec<RunningApp>> {
        let output = run_osascript(&list_processes_script()).await?;
        Ok(parse_process_list(&output))
    }

    async fn suppress(&self, name: &str) -> HostResult<()> {
        run_osascript(&set_visible_script(name, false)).await?;
        info!(app = %name, "Hid application");
        Ok(())
    }

    async fn restore(&self, name: &str) -> HostResult<()> {
        run_osascript(&set_visible_script(name, true)).await?;
        Ok(())
    }

    async fn list_installed_applications(&self) -> HostResult<Vec<String>> {
        let dirs = self.app_dirs.clone();
        tokio::task::spawn_blocking(move || scan_applications(&dirs))
            .await
            .map_err(|e| HostError::Internal(format!("Application scan failed: {}", e)))
    }

    async fn is_browser_running(&self, backend: &BrowserBackend) -> HostResult<bool> {
        let process = backend.process_name.as_deref().unwrap_or(&backend.name);
        let output = run_osascript(&process_running_script(process)).await?;
        Ok(output.trim() == "true")
    }

    async fn redirect_matching_tabs(
        &self,
        backend: &BrowserBackend,
        matcher: &TabMatcher,
        redirect_url: &str,
    ) -> HostResult<TabScanOutcome> {
        if matcher.is_empty() {
            return Ok(TabScanOutcome::default());
        }
        match backend.scan_mode {
            TabScanMode::AllTabs => self.redirect_all_tabs(backend, matcher, redirect_url).await,
            TabScanMode::ActiveTabOnly => {
                self.redirect_active_tab(backend, matcher, redirect_url).await
            }
            TabScanMode::Unsupported => Err(HostError::Unsupported(backend.name.clone())),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.event_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advertises_activation_observation() {
        let host = MacHost::new();
        assert!(host.capabilities().can_observe_app_activation);
        assert!(host.capabilities().can_suppress_apps);
    }

    #[tokio::test]
    async fn unsupported_backend_is_rejected_without_scripting() {
        let host = MacHost::new();
        let firefox = BrowserBackend::new("Firefox", "org.mozilla.firefox", TabScanMode::Unsupported);
        let result = host
            .redirect_matching_tabs(&firefox, &TabMatcher::new(["youtube.com"]), "about:blank")
            .await;
        assert!(matches!(result, Err(HostError::Unsupported(_))));
    }

    #[tokio::test]
    async fn empty_matcher_short_circuits() {
        let host = MacHost::new();
        let safari = BrowserBackend::new("Safari", "com.apple.Safari", TabScanMode::AllTabs);
        let outcome = host
            .redirect_matching_tabs(&safari, &TabMatcher::default(), "about:blank")
            .await
            .unwrap();
        assert_eq!(outcome, TabScanOutcome::default());
    }
}
