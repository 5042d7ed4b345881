//! Snooze scheduler
//!
//! Holds at most one exemption per target. Each exemption has a one-shot
//! timer that posts [`SnoozeExpired`] back to the owner of the scheduler,
//! which then removes the entry and re-applies policy. Entries are also
//! filtered lazily by expiry, so a late or lost timer never extends a snooze.

use chrono::{DateTime, Local};
use focus_api::{SnoozeEntry, TargetKind};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Posted by a snooze timer when its exemption lapses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnoozeExpired {
    pub target: String,
    pub kind: TargetKind,
    pub expires_at: DateTime<Local>,
}

/// Read-only view of the snooze set, shared with the enforcers
#[derive(Debug, Clone, Default)]
pub struct SnoozeView {
    entries: Arc<RwLock<Vec<SnoozeEntry>>>,
}

impl SnoozeView {
    /// True iff an entry for this target is active at `now`
    pub fn is_snoozed(&self, target: &str, kind: TargetKind, now: DateTime<Local>) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|e| e.matches(target, kind) && e.is_active(now))
    }

    /// Entries active at `now`
    pub fn active(&self, now: DateTime<Local>) -> Vec<SnoozeEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.is_active(now))
            .cloned()
            .collect()
    }
}

/// Owner of the snooze set. Only the session controller writes to it.
pub struct SnoozeScheduler {
    view: SnoozeView,
    timers: HashMap<(TargetKind, String), JoinHandle<()>>,
    expired_tx: mpsc::UnboundedSender<SnoozeExpired>,
}

impl SnoozeScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SnoozeExpired>) {
        let (expired_tx, expired_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            view: SnoozeView::default(),
            timers: HashMap::new(),
            expired_tx,
        };
        (scheduler, expired_rx)
    }

    pub fn view(&self) -> SnoozeView {
        self.view.clone()
    }

    /// Exempt `target` until `now + duration`. A repeat snooze for the same
    /// target replaces the earlier one; the latest request wins.
    ///
    /// Returns `None`, leaving existing snoozes alone, when the expiry is not
    /// a representable time.
    pub fn snooze(
        &mut self,
        target: &str,
        kind: TargetKind,
        duration: Duration,
        now: DateTime<Local>,
    ) -> Option<SnoozeEntry> {
        let entry = SnoozeEntry {
            target: target.to_string(),
            kind,
            expires_at: focus_util::checked_offset(now, duration)?,
        };

        {
            let mut entries = self.write();
            entries.retain(|e| !e.matches(target, kind));
            entries.push(entry.clone());
        }

        let key = (kind, target.to_string());
        if let Some(previous) = self.timers.remove(&key) {
            previous.abort();
        }

        let tx = self.expired_tx.clone();
        let message = SnoozeExpired {
            target: entry.target.clone(),
            kind,
            expires_at: entry.expires_at,
        };
        let timer = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = tx.send(message);
        });
        self.timers.insert(key, timer);

        debug!(target_name = %entry.target, kind = %kind, until = %entry.expires_at, "Snooze scheduled");
        Some(entry)
    }

    /// Handle a timer message. Returns the removed entry, or `None` when the
    /// message is stale (the snooze was replaced or cleared meanwhile).
    pub fn expire(&mut self, expired: &SnoozeExpired) -> Option<SnoozeEntry> {
        let mut entries = self.write();
        let idx = entries.iter().position(|e| {
            e.matches(&expired.target, expired.kind) && e.expires_at == expired.expires_at
        })?;
        let entry = entries.remove(idx);
        drop(entries);

        self.timers.remove(&(expired.kind, expired.target.clone()));
        Some(entry)
    }

    /// Drop entries that lapsed by `now` without their timer being handled
    pub fn prune(&mut self, now: DateTime<Local>) -> Vec<SnoozeEntry> {
        let mut entries = self.write();
        let (lapsed, kept): (Vec<_>, Vec<_>) = entries.drain(..).partition(|e| !e.is_active(now));
        *entries = kept;
        drop(entries);

        for entry in &lapsed {
            if let Some(timer) = self.timers.remove(&(entry.kind, entry.target.clone())) {
                timer.abort();
            }
        }
        lapsed
    }

    pub fn is_snoozed(&self, target: &str, kind: TargetKind, now: DateTime<Local>) -> bool {
        self.view.is_snoozed(target, kind, now)
    }

    pub fn active(&self, now: DateTime<Local>) -> Vec<SnoozeEntry> {
        self.view.active(now)
    }

    /// Remove every entry and cancel every pending timer
    pub fn clear(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
        self.write().clear();
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<SnoozeEntry>> {
        self.view
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SnoozeScheduler {
    fn drop(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
    }

    fn secs(n: i64) -> chrono::Duration {
        chrono::Duration::seconds(n)
    }

    #[tokio::test(start_paused = true)]
    async fn snooze_is_active_until_expiry() {
        let (mut scheduler, _rx) = SnoozeScheduler::new();
        scheduler.snooze("Twitter", TargetKind::App, Duration::from_secs(180), t0());

        assert!(scheduler.is_snoozed("Twitter", TargetKind::App, t0()));
        assert!(scheduler.is_snoozed("twitter", TargetKind::App, t0() + secs(179)));
        assert!(!scheduler.is_snoozed("Twitter", TargetKind::App, t0() + secs(181)));
        assert!(!scheduler.is_snoozed("Twitter", TargetKind::Website, t0()));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_posts_expiry() {
        let (mut scheduler, mut rx) = SnoozeScheduler::new();
        let entry = scheduler
            .snooze("reddit.com", TargetKind::Website, Duration::from_secs(180), t0())
            .unwrap();

        let expired = rx.recv().await.unwrap();
        assert_eq!(expired.target, "reddit.com");
        assert_eq!(expired.expires_at, entry.expires_at);

        assert_eq!(scheduler.expire(&expired), Some(entry));
        assert!(scheduler.active(t0()).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn repeat_snooze_replaces_entry() {
        let (mut scheduler, mut rx) = SnoozeScheduler::new();
        scheduler.snooze("Slack", TargetKind::App, Duration::from_secs(60), t0());
        let second = scheduler
            .snooze("Slack", TargetKind::App, Duration::from_secs(300), t0() + secs(10))
            .unwrap();

        assert_eq!(scheduler.active(t0() + secs(10)).len(), 1);
        assert!(scheduler.is_snoozed("Slack", TargetKind::App, t0() + secs(120)));

        let expired = rx.recv().await.unwrap();
        assert_eq!(expired.expires_at, second.expires_at);
        assert!(scheduler.expire(&expired).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_expiry_is_ignored() {
        let (mut scheduler, _rx) = SnoozeScheduler::new();
        scheduler.snooze("Slack", TargetKind::App, Duration::from_secs(300), t0());

        let stale = SnoozeExpired {
            target: "Slack".into(),
            kind: TargetKind::App,
            expires_at: t0() + secs(60),
        };
        assert!(scheduler.expire(&stale).is_none());
        assert!(scheduler.is_snoozed("Slack", TargetKind::App, t0()));
    }

    #[tokio::test(start_paused = true)]
    async fn clear_cancels_timers() {
        let (mut scheduler, mut rx) = SnoozeScheduler::new();
        scheduler.snooze("Slack", TargetKind::App, Duration::from_secs(5), t0());
        scheduler.clear();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
        assert!(scheduler.active(t0()).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_snooze_keeps_existing_entries() {
        let (mut scheduler, mut rx) = SnoozeScheduler::new();
        scheduler.snooze("Slack", TargetKind::App, Duration::from_secs(60), t0());

        assert!(
            scheduler
                .snooze("Slack", TargetKind::App, Duration::from_secs(u64::MAX), t0())
                .is_none()
        );
        assert!(scheduler.is_snoozed("Slack", TargetKind::App, t0() + secs(30)));
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn prune_removes_lapsed_entries() {
        let (mut scheduler, _rx) = SnoozeScheduler::new();
        scheduler.snooze("a.com", TargetKind::Website, Duration::from_secs(30), t0());
        scheduler.snooze("b.com", TargetKind::Website, Duration::from_secs(300), t0());

        let lapsed = scheduler.prune(t0() + secs(60));
        assert_eq!(lapsed.len(), 1);
        assert_eq!(lapsed[0].target, "a.com");
        assert_eq!(scheduler.active(t0() + secs(60)).len(), 1);
    }
}
