//! Enforcement engine: the app and website enforcers behind one handle

use focus_config::{DEFAULT_REDIRECT_URL, Settings, TimingConfig};
use focus_host_api::{BrowserBackend, OsCapability};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::{AppEnforcer, DesiredPolicy, EnforcementEvent, SnoozeView, WebsiteEnforcer};

/// Knobs for the enforcers
#[derive(Debug, Clone)]
pub struct EnforcementOptions {
    pub interval: Duration,
    pub call_timeout: Duration,
    pub redirect_url: String,
    pub browsers: Vec<BrowserBackend>,
}

impl EnforcementOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            interval: settings.timing.enforcement_interval,
            call_timeout: settings.timing.call_timeout,
            redirect_url: settings.redirect_url.clone(),
            browsers: settings.browsers.clone(),
        }
    }
}

impl Default for EnforcementOptions {
    fn default() -> Self {
        let timing = TimingConfig::default();
        Self {
            interval: timing.enforcement_interval,
            call_timeout: timing.call_timeout,
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            browsers: BrowserBackend::defaults(),
        }
    }
}

pub struct EnforcementEngine {
    apps: AppEnforcer,
    websites: WebsiteEnforcer,
}

impl EnforcementEngine {
    pub fn new(
        host: Arc<dyn OsCapability>,
        snoozes: SnoozeView,
        options: EnforcementOptions,
    ) -> (Self, mpsc::UnboundedReceiver<EnforcementEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let apps = AppEnforcer::new(
            host.clone(),
            snoozes.clone(),
            tx.clone(),
            options.interval,
            options.call_timeout,
        );
        let websites = WebsiteEnforcer::new(
            host,
            snoozes,
            tx,
            options.browsers,
            options.redirect_url,
            options.interval,
            options.call_timeout,
        );

        (Self { apps, websites }, rx)
    }

    /// Converge both enforcers on `policy`
    pub async fn apply(&mut self, policy: &DesiredPolicy) {
        debug!(
            apps = policy.apps.len(),
            websites = policy.websites.len(),
            "Applying policy"
        );
        self.apps.set_desired(policy.apps.clone()).await;
        self.websites.set_desired(policy.websites.clone()).await;
    }

    /// Stop both pollers and restore hidden apps. No host call is made by
    /// the enforcers after this returns.
    pub async fn lift_all(&mut self) {
        self.apps.release_all().await;
        self.websites.release_all().await;
    }

    /// Ask the app poller for an early pass, e.g. after an app activation
    pub fn nudge_apps(&self) {
        self.apps.nudge();
    }

    pub fn enforced_apps(&self) -> BTreeSet<String> {
        self.apps.desired()
    }

    pub fn enforced_websites(&self) -> BTreeSet<String> {
        self.websites.desired()
    }

    pub fn is_running(&self) -> bool {
        self.apps.is_running() || self.websites.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_host_api::MockHost;

    #[tokio::test(start_paused = true)]
    async fn apply_and_lift() {
        let host = Arc::new(MockHost::new());
        host.launch_app("Slack", true);
        host.open_tab("Safari", "https://youtube.com/");
        let (mut engine, _rx) =
            EnforcementEngine::new(host.clone(), SnoozeView::default(), EnforcementOptions::default());

        let policy = DesiredPolicy {
            apps: ["Slack".to_string()].into(),
            websites: ["youtube.com".to_string()].into(),
        };
        engine.apply(&policy).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(engine.is_running());
        assert!(host.is_hidden("Slack"));
        assert_eq!(host.tabs("Safari"), vec!["about:blank"]);
        assert_eq!(engine.enforced_apps(), policy.apps);

        engine.lift_all().await;
        assert!(!engine.is_running());
        assert!(!host.is_hidden("Slack"));
        assert!(engine.enforced_websites().is_empty());
    }
}
