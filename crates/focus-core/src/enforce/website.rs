//! Website enforcer: redirects browser tabs showing blocked domains

use focus_api::TargetKind;
use focus_host_api::{BrowserBackend, OsCapability, TabMatcher};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{EnforcementEvent, Poller, SnoozeView};

struct WebsiteCycle {
    host: Arc<dyn OsCapability>,
    desired: Arc<Mutex<BTreeSet<String>>>,
    snoozes: SnoozeView,
    events: mpsc::UnboundedSender<EnforcementEvent>,
    browsers: Vec<BrowserBackend>,
    redirect_url: String,
    call_timeout: Duration,
}

impl WebsiteCycle {
    async fn run(&self) {
        let now = focus_util::now();
        let domains: Vec<String> = self
            .desired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|d| !self.snoozes.is_snoozed(d, TargetKind::Website, now))
            .cloned()
            .collect();
        if domains.is_empty() {
            return;
        }
        let matcher = TabMatcher::new(domains);

        let mut blocked = BTreeSet::new();
        for backend in self.browsers.iter().filter(|b| b.is_supported()) {
            match timeout(self.call_timeout, self.host.is_browser_running(backend)).await {
                Ok(Ok(true)) => {}
                Ok(Ok(false)) => continue,
                Ok(Err(e)) => {
                    debug!(browser = %backend.name, error = %e, "Browser probe failed");
                    continue;
                }
                Err(_) => {
                    warn!(browser = %backend.name, "Browser probe timed out");
                    continue;
                }
            }

            let scan = self
                .host
                .redirect_matching_tabs(backend, &matcher, &self.redirect_url);
            match timeout(self.call_timeout, scan).await {
                Ok(Ok(outcome)) => {
                    if !outcome.redirected.is_empty() {
                        info!(
                            browser = %backend.name,
                            scanned = outcome.scanned,
                            redirected = outcome.redirected.len(),
                            "Redirected blocked tabs"
                        );
                    }
                    blocked.extend(outcome.redirected);
                }
                Ok(Err(e)) => warn!(browser = %backend.name, error = %e, "Tab scan failed"),
                Err(_) => warn!(browser = %backend.name, "Tab scan timed out"),
            }
        }

        for domain in blocked {
            let _ = self.events.send(EnforcementEvent::Blocked {
                target: domain,
                kind: TargetKind::Website,
            });
        }
    }
}

/// Keeps blocked domains out of browser tabs.
///
/// Matching tabs are navigated to the redirect URL. Redirects are not undone
/// when a domain leaves the desired set, so there is nothing to restore.
/// Backends whose scan mode is unsupported are skipped.
pub struct WebsiteEnforcer {
    cycle: Arc<WebsiteCycle>,
    poller: Poller,
    interval: Duration,
    enabled: bool,
}

impl WebsiteEnforcer {
    pub fn new(
        host: Arc<dyn OsCapability>,
        snoozes: SnoozeView,
        events: mpsc::UnboundedSender<EnforcementEvent>,
        browsers: Vec<BrowserBackend>,
        redirect_url: impl Into<String>,
        interval: Duration,
        call_timeout: Duration,
    ) -> Self {
        let enabled = host.capabilities().can_enforce(TargetKind::Website);
        if !enabled {
            warn!("Host cannot scan browser tabs; website blocking disabled");
        }
        for backend in browsers.iter().filter(|b| !b.is_supported()) {
            debug!(browser = %backend.name, "Browser has no tab scripting support, skipping");
        }

        Self {
            cycle: Arc::new(WebsiteCycle {
                host,
                desired: Arc::new(Mutex::new(BTreeSet::new())),
                snoozes,
                events,
                browsers,
                redirect_url: redirect_url.into(),
                call_timeout,
            }),
            poller: Poller::new(),
            interval,
            enabled,
        }
    }

    /// Replace the desired set, stopping the poller around the swap
    pub async fn set_desired(&mut self, desired: BTreeSet<String>) {
        if !self.enabled {
            return;
        }

        let unchanged = *self.lock() == desired;
        if unchanged && (desired.is_empty() || self.poller.is_running()) {
            return;
        }

        self.poller.stop().await;
        let empty = desired.is_empty();
        *self.lock() = desired;

        if !empty {
            let cycle = self.cycle.clone();
            self.poller.start(self.interval, move || {
                let cycle = cycle.clone();
                async move { cycle.run().await }
            });
            debug!(interval = ?self.interval, "Website poller started");
        }
    }

    pub async fn release_all(&mut self) {
        self.set_desired(BTreeSet::new()).await;
        self.poller.stop().await;
    }

    pub fn desired(&self) -> BTreeSet<String> {
        self.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_running()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        self.cycle
            .desired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SnoozeScheduler;
    use focus_host_api::{MockHost, TabScanMode};

    fn browsers() -> Vec<BrowserBackend> {
        vec![
            BrowserBackend::new("Safari", "com.apple.Safari", TabScanMode::AllTabs),
            BrowserBackend::new("Arc", "company.thebrowser.Browser", TabScanMode::ActiveTabOnly),
            BrowserBackend::new("Firefox", "org.mozilla.firefox", TabScanMode::Unsupported),
        ]
    }

    fn enforcer(
        host: Arc<MockHost>,
        snoozes: SnoozeView,
    ) -> (WebsiteEnforcer, mpsc::UnboundedReceiver<EnforcementEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let enforcer = WebsiteEnforcer::new(
            host,
            snoozes,
            tx,
            browsers(),
            "about:blank",
            Duration::from_secs(2),
            Duration::from_millis(1500),
        );
        (enforcer, rx)
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn redirects_every_matching_tab_in_all_tabs_mode() {
        let host = Arc::new(MockHost::new());
        host.open_tab("Safari", "https://www.youtube.com/watch?v=1");
        host.open_tab("Safari", "https://docs.rs/tokio");
        host.open_tab("Safari", "https://m.youtube.com/");
        let (mut sites, mut rx) = enforcer(host.clone(), SnoozeView::default());

        sites.set_desired(set(&["youtube.com"])).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(
            host.tabs("Safari"),
            vec!["about:blank", "https://docs.rs/tokio", "about:blank"]
        );
        // One notice per domain per cycle
        assert_eq!(
            rx.try_recv().unwrap(),
            EnforcementEvent::Blocked {
                target: "youtube.com".into(),
                kind: TargetKind::Website
            }
        );
        assert!(rx.try_recv().is_err());

        sites.release_all().await;
    }

    #[tokio::test(start_paused = true)]
    async fn active_tab_only_leaves_background_tabs() {
        let host = Arc::new(MockHost::new());
        host.open_tab("Arc", "https://reddit.com/r/rust");
        host.open_tab("Arc", "https://example.org");
        let (mut sites, _rx) = enforcer(host.clone(), SnoozeView::default());

        sites.set_desired(set(&["reddit.com"])).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(host.tabs("Arc")[0], "https://reddit.com/r/rust");

        host.set_active_tab("Arc", 0);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(host.tabs("Arc")[0], "about:blank");

        sites.release_all().await;
    }

    #[tokio::test(start_paused = true)]
    async fn snoozed_site_is_skipped() {
        let host = Arc::new(MockHost::new());
        host.open_tab("Safari", "https://www.youtube.com/watch?v=1");
        let (mut scheduler, _expired) = SnoozeScheduler::new();
        scheduler.snooze("youtube.com", TargetKind::Website, Duration::from_secs(180), focus_util::now());
        let (mut sites, mut rx) = enforcer(host.clone(), scheduler.view());

        sites.set_desired(set(&["youtube.com"])).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(host.tabs("Safari"), vec!["https://www.youtube.com/watch?v=1"]);
        assert!(rx.try_recv().is_err());

        scheduler.clear();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(host.tabs("Safari"), vec!["about:blank"]);

        sites.release_all().await;
    }

    #[tokio::test(start_paused = true)]
    async fn unsupported_browser_is_never_touched() {
        let host = Arc::new(MockHost::new());
        host.open_tab("Firefox", "https://youtube.com");
        let (mut sites, _rx) = enforcer(host.clone(), SnoozeView::default());

        sites.set_desired(set(&["youtube.com"])).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(host.tabs("Firefox"), vec!["https://youtube.com"]);
        assert!(host.actions().is_empty());

        sites.release_all().await;
    }

    #[tokio::test(start_paused = true)]
    async fn scan_failure_is_tolerated() {
        let host = Arc::new(MockHost::new());
        host.open_tab("Safari", "https://youtube.com");
        *host.fail_tabs.lock().unwrap() = true;
        let (mut sites, _rx) = enforcer(host.clone(), SnoozeView::default());

        sites.set_desired(set(&["youtube.com"])).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(sites.is_running());

        *host.fail_tabs.lock().unwrap() = false;
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(host.tabs("Safari"), vec!["about:blank"]);

        sites.release_all().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_desired_set_empties() {
        let host = Arc::new(MockHost::new());
        let (mut sites, _rx) = enforcer(host.clone(), SnoozeView::default());

        sites.set_desired(set(&["youtube.com"])).await;
        assert!(sites.is_running());
        sites.set_desired(BTreeSet::new()).await;
        assert!(!sites.is_running());

        host.open_tab("Safari", "https://youtube.com");
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(host.tabs("Safari"), vec!["https://youtube.com"]);
    }
}
