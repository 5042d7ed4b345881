//! App enforcer: hides blocked apps that come to the foreground

use focus_api::{TargetKind, app_matches};
use focus_host_api::OsCapability;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{EnforcementEvent, Poller, SnoozeView};

#[derive(Debug, Default)]
struct AppState {
    desired: BTreeSet<String>,
    /// Running-app names this enforcer has hidden and not yet restored
    suppressed: BTreeSet<String>,
}

/// One reconciliation pass, shared with the poller task
struct AppCycle {
    host: Arc<dyn OsCapability>,
    state: Arc<Mutex<AppState>>,
    snoozes: SnoozeView,
    events: mpsc::UnboundedSender<EnforcementEvent>,
    call_timeout: Duration,
}

impl AppCycle {
    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(&self) {
        let desired = self.lock().desired.clone();
        if desired.is_empty() {
            return;
        }

        let running = match timeout(self.call_timeout, self.host.list_running_applications()).await
        {
            Ok(Ok(apps)) => apps,
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to list running applications");
                return;
            }
            Err(_) => {
                warn!(timeout = ?self.call_timeout, "Listing running applications timed out");
                return;
            }
        };

        let now = focus_util::now();
        for app in running.iter().filter(|a| a.is_foreground) {
            let Some(blocked) = desired.iter().find(|d| app_matches(&app.name, d)) else {
                continue;
            };
            if self.snoozes.is_snoozed(blocked, TargetKind::App, now) {
                continue;
            }

            let fresh = self.lock().suppressed.insert(app.name.clone());
            match timeout(self.call_timeout, self.host.suppress(&app.name)).await {
                Ok(Ok(())) => {
                    info!(app = %app.name, "Suppressed blocked app");
                    let _ = self.events.send(EnforcementEvent::Blocked {
                        target: blocked.clone(),
                        kind: TargetKind::App,
                    });
                }
                Ok(Err(e)) => {
                    warn!(app = %app.name, error = %e, "Failed to suppress app");
                    if fresh {
                        self.lock().suppressed.remove(&app.name);
                    }
                }
                Err(_) => {
                    warn!(app = %app.name, "Suppress call timed out");
                    if fresh {
                        self.lock().suppressed.remove(&app.name);
                    }
                }
            }
        }
    }
}

/// Keeps blocked apps out of the foreground.
///
/// Enforcement is foreground-based: a blocked app running in the background
/// is left alone until it is brought forward. Apps this enforcer hid are
/// restored once they leave the desired set.
pub struct AppEnforcer {
    cycle: Arc<AppCycle>,
    poller: Poller,
    interval: Duration,
    enabled: bool,
}

impl AppEnforcer {
    pub fn new(
        host: Arc<dyn OsCapability>,
        snoozes: SnoozeView,
        events: mpsc::UnboundedSender<EnforcementEvent>,
        interval: Duration,
        call_timeout: Duration,
    ) -> Self {
        let enabled = host.capabilities().can_enforce(TargetKind::App);
        if !enabled {
            warn!("Host cannot suppress apps; app blocking disabled");
        }

        Self {
            cycle: Arc::new(AppCycle {
                host,
                state: Arc::new(Mutex::new(AppState::default())),
                snoozes,
                events,
                call_timeout,
            }),
            poller: Poller::new(),
            interval,
            enabled,
        }
    }

    /// Replace the desired set.
    ///
    /// The poller is stopped before the set changes and restarted afterwards,
    /// so no cycle ever observes a half-applied policy. Apps that were hidden
    /// and are no longer desired get restored in between.
    pub async fn set_desired(&mut self, desired: BTreeSet<String>) {
        if !self.enabled {
            return;
        }

        let unchanged = self.cycle.lock().desired == desired;
        if unchanged && (desired.is_empty() || self.poller.is_running()) {
            return;
        }

        self.poller.stop().await;

        let released: Vec<String> = {
            let mut state = self.cycle.lock();
            state.desired = desired;
            let released: Vec<String> = state
                .suppressed
                .iter()
                .filter(|name| !state.desired.iter().any(|d| app_matches(name, d)))
                .cloned()
                .collect();
            for name in &released {
                state.suppressed.remove(name);
            }
            released
        };

        for name in released {
            self.restore(&name).await;
        }

        if !self.cycle.lock().desired.is_empty() {
            let cycle = self.cycle.clone();
            self.poller.start(self.interval, move || {
                let cycle = cycle.clone();
                async move { cycle.run().await }
            });
            debug!(interval = ?self.interval, "App poller started");
        }
    }

    /// Stop enforcing and restore every app this enforcer hid
    pub async fn release_all(&mut self) {
        self.set_desired(BTreeSet::new()).await;
        // Also covers the disabled and already-stopped cases
        self.poller.stop().await;
    }

    /// Run a cycle now instead of waiting for the next interval
    pub fn nudge(&self) {
        self.poller.nudge();
    }

    pub fn desired(&self) -> BTreeSet<String> {
        self.cycle.lock().desired.clone()
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_running()
    }

    async fn restore(&self, name: &str) {
        match timeout(self.cycle.call_timeout, self.cycle.host.restore(name)).await {
            Ok(Ok(())) => info!(app = %name, "Restored app"),
            Ok(Err(e)) => warn!(app = %name, error = %e, "Failed to restore app"),
            Err(_) => warn!(app = %name, "Restore call timed out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SnoozeScheduler;
    use focus_host_api::{HostCapabilities, MockAction, MockHost};

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn enforcer(
        host: Arc<MockHost>,
        snoozes: SnoozeView,
    ) -> (AppEnforcer, mpsc::UnboundedReceiver<EnforcementEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let enforcer = AppEnforcer::new(
            host,
            snoozes,
            tx,
            Duration::from_secs(1),
            Duration::from_millis(500),
        );
        (enforcer, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn suppresses_foreground_blocked_app() {
        let host = Arc::new(MockHost::new());
        host.launch_app("Slack", true);
        host.launch_app("Xcode", false);
        let (mut apps, mut rx) = enforcer(host.clone(), SnoozeView::default());

        apps.set_desired(set(&["Slack"])).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(host.is_hidden("Slack"));
        assert!(!host.is_hidden("Xcode"));
        assert_eq!(
            rx.try_recv().unwrap(),
            EnforcementEvent::Blocked {
                target: "Slack".into(),
                kind: TargetKind::App
            }
        );

        apps.release_all().await;
    }

    #[tokio::test(start_paused = true)]
    async fn background_app_is_left_alone_until_activated() {
        let host = Arc::new(MockHost::new());
        host.launch_app("Xcode", true);
        host.launch_app("Slack", false);
        let (mut apps, _rx) = enforcer(host.clone(), SnoozeView::default());

        apps.set_desired(set(&["Slack"])).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(host.suppress_count("Slack"), 0);

        host.bring_to_front("Slack");
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(host.suppress_count("Slack"), 1);

        apps.release_all().await;
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_an_app_restores_it_once() {
        let host = Arc::new(MockHost::new());
        host.launch_app("Slack", true);
        let (mut apps, _rx) = enforcer(host.clone(), SnoozeView::default());

        apps.set_desired(set(&["Slack", "Discord"])).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(host.is_hidden("Slack"));

        apps.set_desired(set(&["Discord"])).await;
        assert!(!host.is_hidden("Slack"));

        apps.release_all().await;
        let restores = host
            .actions()
            .iter()
            .filter(|a| matches!(a, MockAction::Restore(n) if n == "Slack"))
            .count();
        assert_eq!(restores, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn no_host_calls_after_release() {
        let host = Arc::new(MockHost::new());
        host.launch_app("Slack", true);
        let (mut apps, _rx) = enforcer(host.clone(), SnoozeView::default());

        apps.set_desired(set(&["Slack"])).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        apps.release_all().await;
        assert!(!apps.is_running());

        host.clear_actions();
        host.bring_to_front("Slack");
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(host.actions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn snoozed_app_is_skipped() {
        let host = Arc::new(MockHost::new());
        host.launch_app("Slack", true);
        let (mut scheduler, _expired) = SnoozeScheduler::new();
        scheduler.snooze("Slack", TargetKind::App, Duration::from_secs(180), focus_util::now());
        let (mut apps, _rx) = enforcer(host.clone(), scheduler.view());

        apps.set_desired(set(&["Slack"])).await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(host.suppress_count("Slack"), 0);

        apps.release_all().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_suppress_is_retried_next_cycle() {
        let host = Arc::new(MockHost::new());
        host.launch_app("Slack", true);
        *host.fail_suppress.lock().unwrap() = true;
        let (mut apps, _rx) = enforcer(host.clone(), SnoozeView::default());

        apps.set_desired(set(&["Slack"])).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!host.is_hidden("Slack"));

        *host.fail_suppress.lock().unwrap() = false;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(host.is_hidden("Slack"));

        apps.release_all().await;
    }

    #[tokio::test(start_paused = true)]
    async fn slow_host_calls_time_out() {
        let host = Arc::new(MockHost::new());
        host.launch_app("Slack", true);
        *host.call_delay.lock().unwrap() = Some(Duration::from_secs(5));
        let (mut apps, _rx) = enforcer(host.clone(), SnoozeView::default());

        apps.set_desired(set(&["Slack"])).await;
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(host.suppress_count("Slack"), 0);

        apps.release_all().await;
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_without_capability() {
        let host = Arc::new(MockHost::new().with_capabilities(HostCapabilities::minimal()));
        host.launch_app("Slack", true);
        let (mut apps, _rx) = enforcer(host.clone(), SnoozeView::default());

        apps.set_desired(set(&["Slack"])).await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!apps.is_running());
        assert!(host.actions().is_empty());
    }
}
