//! Mock OS capability for testing

use async_trait::async_trait;
use focus_api::app_matches;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

use crate::{
    BrowserBackend, HostCapabilities, HostError, HostEvent, HostResult, OsCapability, RunningApp,
    TabMatcher, TabScanMode, TabScanOutcome,
};

/// Corrective action recorded by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockAction {
    Suppress(String),
    Restore(String),
    Redirect { browser: String, url: String },
}

/// Fake browser state
#[derive(Debug, Clone, Default)]
pub struct MockBrowser {
    pub running: bool,
    pub tabs: Vec<String>,
    /// Index of the active tab
    pub active: usize,
}

/// Mock OS capability for unit/integration testing
pub struct MockHost {
    capabilities: HostCapabilities,
    apps: Arc<Mutex<Vec<RunningApp>>>,
    hidden: Arc<Mutex<HashSet<String>>>,
    browsers: Arc<Mutex<HashMap<String, MockBrowser>>>,
    installed: Arc<Mutex<Vec<String>>>,
    actions: Arc<Mutex<Vec<MockAction>>>,
    event_tx: broadcast::Sender<HostEvent>,

    /// Configure app listing to fail
    pub fail_list: Arc<Mutex<bool>>,

    /// Configure suppress to fail
    pub fail_suppress: Arc<Mutex<bool>>,

    /// Configure tab scans to fail
    pub fail_tabs: Arc<Mutex<bool>>,

    /// Delay applied to every call (simulates a slow scripting bridge)
    pub call_delay: Arc<Mutex<Option<Duration>>>,
}

impl MockHost {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(64);

        Self {
            capabilities: HostCapabilities::macos_full(),
            apps: Arc::new(Mutex::new(Vec::new())),
            hidden: Arc::new(Mutex::new(HashSet::new())),
            browsers: Arc::new(Mutex::new(HashMap::new())),
            installed: Arc::new(Mutex::new(Vec::new())),
            actions: Arc::new(Mutex::new(Vec::new())),
            event_tx,
            fail_list: Arc::new(Mutex::new(false)),
            fail_suppress: Arc::new(Mutex::new(false)),
            fail_tabs: Arc::new(Mutex::new(false)),
            call_delay: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_capabilities(mut self, caps: HostCapabilities) -> Self {
        self.capabilities = caps;
        self
    }

    pub fn with_installed<I, S>(self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.installed.lock().unwrap() = apps.into_iter().map(Into::into).collect();
        self
    }

    /// Start an app in the background, or bring it forward if `foreground`
    pub fn launch_app(&self, name: &str, foreground: bool) {
        let mut apps = self.apps.lock().unwrap();
        if !apps.iter().any(|a| a.name == name) {
            apps.push(RunningApp::new(name, false));
        }
        drop(apps);
        if foreground {
            self.bring_to_front(name);
        }
    }

    /// Make `name` the only foreground app and unhide it
    pub fn bring_to_front(&self, name: &str) {
        let mut apps = self.apps.lock().unwrap();
        for app in apps.iter_mut() {
            app.is_foreground = app.name == name;
        }
        self.hidden.lock().unwrap().remove(name);
    }

    /// Bring an app forward and raise the matching host event
    pub fn activate(&self, name: &str) {
        self.launch_app(name, true);
        let _ = self.event_tx.send(HostEvent::AppActivated { name: name.to_string() });
    }

    pub fn quit_app(&self, name: &str) {
        self.apps.lock().unwrap().retain(|a| a.name != name);
        self.hidden.lock().unwrap().remove(name);
    }

    pub fn is_hidden(&self, name: &str) -> bool {
        self.hidden.lock().unwrap().contains(name)
    }

    pub fn is_foreground(&self, name: &str) -> bool {
        self.apps
            .lock()
            .unwrap()
            .iter()
            .any(|a| a.name == name && a.is_foreground)
    }

    /// Open a tab and make it active, starting the browser if needed
    pub fn open_tab(&self, browser: &str, url: &str) {
        let mut browsers = self.browsers.lock().unwrap();
        let entry = browsers.entry(browser.to_string()).or_default();
        entry.running = true;
        entry.tabs.push(url.to_string());
        entry.active = entry.tabs.len() - 1;
    }

    pub fn set_active_tab(&self, browser: &str, index: usize) {
        if let Some(b) = self.browsers.lock().unwrap().get_mut(browser) {
            b.active = index;
        }
    }

    pub fn quit_browser(&self, browser: &str) {
        self.browsers.lock().unwrap().remove(browser);
    }

    pub fn tabs(&self, browser: &str) -> Vec<String> {
        self.browsers
            .lock()
            .unwrap()
            .get(browser)
            .map(|b| b.tabs.clone())
            .unwrap_or_default()
    }

    /// Raise an arbitrary host event
    pub fn emit(&self, event: HostEvent) {
        let _ = self.event_tx.send(event);
    }

    pub fn actions(&self) -> Vec<MockAction> {
        self.actions.lock().unwrap().clone()
    }

    pub fn clear_actions(&self) {
        self.actions.lock().unwrap().clear();
    }

    pub fn suppress_count(&self, name: &str) -> usize {
        self.actions
            .lock()
            .unwrap()
            .iter()
            .filter(|a| matches!(a, MockAction::Suppress(n) if n == name))
            .count()
    }

    async fn delay(&self) {
        let delay = *self.call_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OsCapability for MockHost {
    fn capabilities(&self) -> &HostCapabilities {
        &self.capabilities
    }

    async fn list_running_applications(&self) -> HostResult<Vec<RunningApp>> {
        self.delay().await;
        if *self.fail_list.lock().unwrap() {
            return Err(HostError::ScriptFailed("Mock list failure".into()));
        }
        Ok(self.apps.lock().unwrap().clone())
    }

    async fn suppress(&self, name: &str) -> HostResult<()> {
        self.delay().await;
        if *self.fail_suppress.lock().unwrap() {
            return Err(HostError::ScriptFailed("Mock suppress failure".into()));
        }

        let mut apps = self.apps.lock().unwrap();
        let app = apps
            .iter_mut()
            .find(|a| app_matches(&a.name, name))
            .ok_or_else(|| HostError::AppNotFound(name.to_string()))?;
        app.is_foreground = false;
        self.hidden.lock().unwrap().insert(app.name.clone());
        self.actions
            .lock()
            .unwrap()
            .push(MockAction::Suppress(app.name.clone()));
        Ok(())
    }

    async fn restore(&self, name: &str) -> HostResult<()> {
        self.delay().await;
        let apps = self.apps.lock().unwrap();
        let app = apps
            .iter()
            .find(|a| app_matches(&a.name, name))
            .ok_or_else(|| HostError::AppNotFound(name.to_string()))?;
        self.hidden.lock().unwrap().remove(&app.name);
        self.actions
            .lock()
            .unwrap()
            .push(MockAction::Restore(app.name.clone()));
        Ok(())
    }

    async fn list_installed_applications(&self) -> HostResult<Vec<String>> {
        self.delay().await;
        let mut installed = self.installed.lock().unwrap().clone();
        installed.sort();
        Ok(installed)
    }

    async fn is_browser_running(&self, backend: &BrowserBackend) -> HostResult<bool> {
        self.delay().await;
        Ok(self
            .browsers
            .lock()
            .unwrap()
            .get(&backend.name)
            .is_some_and(|b| b.running))
    }

    async fn redirect_matching_tabs(
        &self,
        backend: &BrowserBackend,
        matcher: &TabMatcher,
        redirect_url: &str,
    ) -> HostResult<TabScanOutcome> {
        self.delay().await;
        if !backend.is_supported() {
            return Err(HostError::Unsupported(backend.name.clone()));
        }
        if *self.fail_tabs.lock().unwrap() {
            return Err(HostError::ScriptFailed("Mock tab scan failure".into()));
        }

        let mut browsers = self.browsers.lock().unwrap();
        let Some(browser) = browsers.get_mut(&backend.name).filter(|b| b.running) else {
            return Ok(TabScanOutcome::default());
        };

        let indices: Vec<usize> = match backend.scan_mode {
            TabScanMode::AllTabs => (0..browser.tabs.len()).collect(),
            TabScanMode::ActiveTabOnly if browser.active < browser.tabs.len() => vec![browser.active],
            _ => Vec::new(),
        };

        let mut outcome = TabScanOutcome {
            scanned: indices.len(),
            redirected: Vec::new(),
        };
        let mut actions = self.actions.lock().unwrap();
        for idx in indices {
            if let Some(domain) = matcher.matching_domain(&browser.tabs[idx]) {
                outcome.redirected.push(domain.to_string());
                browser.tabs[idx] = redirect_url.to_string();
                actions.push(MockAction::Redirect {
                    browser: backend.name.clone(),
                    url: redirect_url.to_string(),
                });
            }
        }
        Ok(outcome)
    }

    fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.event_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(name: &str, mode: TabScanMode) -> BrowserBackend {
        BrowserBackend::new(name, format!("test.{}", name), mode)
    }

    #[tokio::test]
    async fn mock_suppress_and_restore() {
        let host = MockHost::new();
        host.launch_app("Slack", true);

        host.suppress("Slack").await.unwrap();
        assert!(host.is_hidden("Slack"));
        assert!(!host.is_foreground("Slack"));

        host.restore("Slack").await.unwrap();
        assert!(!host.is_hidden("Slack"));
        assert_eq!(
            host.actions(),
            vec![MockAction::Suppress("Slack".into()), MockAction::Restore("Slack".into())]
        );
    }

    #[tokio::test]
    async fn mock_suppress_missing_app() {
        let host = MockHost::new();
        let result = host.suppress("Nope").await;
        assert!(matches!(result, Err(HostError::AppNotFound(_))));
    }

    #[tokio::test]
    async fn mock_redirects_all_tabs() {
        let host = MockHost::new();
        host.open_tab("Safari", "https://reddit.com/r/rust");
        host.open_tab("Safari", "https://docs.rs");
        host.open_tab("Safari", "https://www.reddit.com/");

        let outcome = host
            .redirect_matching_tabs(
                &backend("Safari", TabScanMode::AllTabs),
                &TabMatcher::new(["reddit.com"]),
                "about:blank",
            )
            .await
            .unwrap();

        assert_eq!(outcome.scanned, 3);
        assert_eq!(outcome.redirected.len(), 2);
        assert_eq!(host.tabs("Safari"), vec!["about:blank", "https://docs.rs", "about:blank"]);
    }

    #[tokio::test]
    async fn mock_active_tab_only() {
        let host = MockHost::new();
        host.open_tab("Arc", "https://youtube.com");
        host.open_tab("Arc", "https://docs.rs");

        let outcome = host
            .redirect_matching_tabs(
                &backend("Arc", TabScanMode::ActiveTabOnly),
                &TabMatcher::new(["youtube.com"]),
                "about:blank",
            )
            .await
            .unwrap();

        assert_eq!(outcome.scanned, 1);
        assert!(outcome.redirected.is_empty());
        assert_eq!(host.tabs("Arc")[0], "https://youtube.com");
    }

    #[tokio::test]
    async fn mock_unsupported_backend() {
        let host = MockHost::new();
        let result = host
            .redirect_matching_tabs(
                &backend("Firefox", TabScanMode::Unsupported),
                &TabMatcher::new(["youtube.com"]),
                "about:blank",
            )
            .await;
        assert!(matches!(result, Err(HostError::Unsupported(_))));
    }

    #[tokio::test]
    async fn mock_events_reach_subscribers() {
        let host = MockHost::new();
        let mut rx = host.subscribe();
        host.activate("Discord");
        assert_eq!(
            rx.recv().await.unwrap(),
            HostEvent::AppActivated { name: "Discord".into() }
        );
    }
}
