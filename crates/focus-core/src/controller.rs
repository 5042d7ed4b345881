//! Session controller
//!
//! Owns the current session, the snooze set, presets and history. Every
//! transition recomputes the desired policy and pushes it to the
//! enforcement engine before returning, so callers observe a converged
//! engine once a call completes.

use chrono::{DateTime, Local};
use focus_api::{
    API_VERSION, FocusSession, HealthStatus, Preset, ServiceStateSnapshot, SessionEndReason,
    SessionInfo, SessionState, SnoozeEntry, TargetKind, normalize_app_name, normalize_domain,
};
use focus_config::Settings;
use focus_host_api::OsCapability;
use focus_store::{AuditEvent, AuditEventType, Store};
use focus_util::{FocusError, PresetId, SessionId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    ActiveSession, CoreEvent, DesiredPolicy, EnforcementEngine, EnforcementEvent,
    EnforcementOptions, SnoozeExpired, SnoozeScheduler, TransitionError,
};

/// Controller settings
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub enforcement: EnforcementOptions,
    /// Snooze length when a request does not name one
    pub default_snooze: Duration,
}

impl ControllerOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            enforcement: EnforcementOptions::from_settings(settings),
            default_snooze: settings.timing.default_snooze,
        }
    }
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            enforcement: EnforcementOptions::default(),
            default_snooze: focus_api::DEFAULT_SNOOZE,
        }
    }
}

/// Channels the controller's collaborators report on. The owner of the
/// controller drains these and feeds them back in.
pub struct ControllerEvents {
    pub enforcement: mpsc::UnboundedReceiver<EnforcementEvent>,
    pub snooze_expired: mpsc::UnboundedReceiver<SnoozeExpired>,
}

pub struct SessionController {
    store: Arc<dyn Store>,
    host: Arc<dyn OsCapability>,
    engine: EnforcementEngine,
    snoozes: SnoozeScheduler,
    current: Option<ActiveSession>,
    presets: Vec<Preset>,
    history: Vec<FocusSession>,
    policy: DesiredPolicy,
    default_snooze: Duration,
}

impl SessionController {
    pub fn new(
        store: Arc<dyn Store>,
        host: Arc<dyn OsCapability>,
        options: ControllerOptions,
    ) -> (Self, ControllerEvents) {
        let (snoozes, snooze_expired) = SnoozeScheduler::new();
        let (engine, enforcement) =
            EnforcementEngine::new(host.clone(), snoozes.view(), options.enforcement);

        let presets = match store.load_presets() {
            Ok(Some(presets)) => presets,
            Ok(None) => {
                debug!("No saved presets, using defaults");
                Preset::defaults()
            }
            Err(e) => {
                warn!(error = %e, "Failed to load presets, using defaults");
                Preset::defaults()
            }
        };

        let history = store.load_history().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load history");
            Vec::new()
        });

        info!(
            presets = presets.len(),
            history = history.len(),
            "Session controller initialized"
        );

        let controller = Self {
            store,
            host,
            engine,
            snoozes,
            current: None,
            presets,
            history,
            policy: DesiredPolicy::empty(),
            default_snooze: options.default_snooze,
        };
        let events = ControllerEvents {
            enforcement,
            snooze_expired,
        };
        (controller, events)
    }

    /// Pick up a session persisted by a previous run.
    ///
    /// An active session resumes enforcement right away; a paused one stays
    /// paused. A session whose time ran out while the service was down is
    /// completed by the next [`tick`](Self::tick).
    pub async fn restore(&mut self, now: DateTime<Local>) -> Option<CoreEvent> {
        let persisted = match self.store.load_current_session() {
            Ok(persisted) => persisted?,
            Err(e) => {
                warn!(error = %e, "Failed to load persisted session");
                return None;
            }
        };

        let Some(active) = ActiveSession::restore(persisted, now) else {
            debug!("Discarding persisted session that is not running");
            self.persist_current();
            return None;
        };

        let session_id = active.id();
        let state = active.state(now);
        info!(session_id = %session_id, state = ?state, "Restored session");
        self.audit(AuditEventType::SessionRestored { session_id });

        self.current = Some(active);
        self.reapply(now).await;
        Some(CoreEvent::SessionRestored { session_id, state })
    }

    // Transitions

    /// Start a session. Only valid while idle.
    pub async fn start(
        &mut self,
        session: FocusSession,
        now: DateTime<Local>,
    ) -> Result<CoreEvent, TransitionError> {
        if let Some(current) = &self.current {
            return Err(TransitionError::invalid("start", current.state(now)));
        }

        let active = ActiveSession::begin(session, now)?;
        let record = active.session();
        let session_id = record.id;
        let goal = record.goal.clone();
        let ends_at = record.end_time;

        info!(
            session_id = %session_id,
            goal = %goal,
            duration = ?record.duration,
            apps = record.blocked_apps.len(),
            websites = record.blocked_websites.len(),
            "Session started"
        );
        self.audit(AuditEventType::SessionStarted {
            session_id,
            goal: goal.clone(),
            duration: record.duration,
        });

        self.current = Some(active);
        self.persist_current();
        self.reapply(now).await;

        Ok(CoreEvent::SessionStarted {
            session_id,
            goal,
            ends_at,
        })
    }

    /// Start a session from a saved preset
    pub async fn start_preset(
        &mut self,
        preset_id: PresetId,
        goal: Option<String>,
        now: DateTime<Local>,
    ) -> focus_util::Result<CoreEvent> {
        let preset = self
            .presets
            .iter()
            .find(|p| p.id == preset_id)
            .ok_or(FocusError::PresetNotFound(preset_id))?;
        let session = preset.to_session(goal);
        Ok(self.start(session, now).await?)
    }

    /// Pause the clock. All enforcement is lifted while paused.
    pub async fn pause(&mut self, now: DateTime<Local>) -> Result<CoreEvent, TransitionError> {
        let current = self.current_mut("pause")?;
        current.pause(now)?;
        let session_id = current.id();
        let remaining = current.remaining(now);

        info!(session_id = %session_id, remaining = ?remaining, "Session paused");
        self.audit(AuditEventType::SessionPaused { session_id });
        self.persist_current();
        self.reapply(now).await;

        Ok(CoreEvent::SessionPaused {
            session_id,
            remaining,
        })
    }

    pub async fn resume(&mut self, now: DateTime<Local>) -> Result<CoreEvent, TransitionError> {
        let current = self.current_mut("resume")?;
        let paused_for = current.resume(now)?;
        let session_id = current.id();
        let remaining = current.remaining(now);

        info!(session_id = %session_id, paused_for = ?paused_for, "Session resumed");
        self.audit(AuditEventType::SessionResumed {
            session_id,
            paused_for,
        });
        self.persist_current();
        self.snoozes.prune(now);
        self.reapply(now).await;

        Ok(CoreEvent::SessionResumed {
            session_id,
            remaining,
        })
    }

    /// Add time to an active session. Policy is unchanged.
    pub fn extend(&mut self, by: Duration, now: DateTime<Local>) -> Result<CoreEvent, TransitionError> {
        let current = self.current_mut("extend")?;
        current.extend(by, now)?;
        let session_id = current.id();
        let ends_at = current.session().end_time;

        info!(session_id = %session_id, by = ?by, "Session extended");
        self.audit(AuditEventType::SessionExtended {
            session_id,
            extended_by: by,
        });
        self.persist_current();

        Ok(CoreEvent::SessionExtended {
            session_id,
            by,
            ends_at,
        })
    }

    /// Stop the session early. Valid while active or paused; a session that
    /// already ran out is completed by the tick instead.
    pub async fn stop(&mut self, now: DateTime<Local>) -> Result<CoreEvent, TransitionError> {
        let state = self.state(now);
        if !matches!(state, SessionState::Active | SessionState::Paused) {
            return Err(TransitionError::invalid("stop", state));
        }
        let Some(current) = self.current.take() else {
            return Err(TransitionError::invalid("stop", SessionState::Idle));
        };
        Ok(self.end_session(current, SessionEndReason::Stopped, now).await)
    }

    /// Advance the session clock.
    ///
    /// Lapsed snoozes are dropped first. While paused nothing else happens;
    /// an active session either completes or reports its countdown.
    pub async fn tick(&mut self, now: DateTime<Local>) -> Vec<CoreEvent> {
        let mut events = Vec::new();

        for entry in self.snoozes.prune(now) {
            events.push(self.snooze_ended(entry));
        }
        let snoozes_lapsed = !events.is_empty();

        match self.state(now) {
            SessionState::Completed => {
                if let Some(current) = self.current.take() {
                    events.push(
                        self.end_session(current, SessionEndReason::Completed, now)
                            .await,
                    );
                }
            }
            SessionState::Active => {
                if snoozes_lapsed {
                    self.reapply(now).await;
                }
                if let Some(current) = &self.current {
                    events.push(CoreEvent::Tick {
                        session_id: current.id(),
                        remaining: current.remaining(now),
                    });
                }
            }
            SessionState::Paused | SessionState::Idle => {}
        }

        events
    }

    // Snoozes

    /// Exempt one target for `duration` (or the default snooze length).
    ///
    /// Requires a session. The target is normalized the same way session
    /// targets are; input that does not normalize is rejected.
    pub async fn snooze(
        &mut self,
        target: &str,
        kind: TargetKind,
        duration: Option<Duration>,
        now: DateTime<Local>,
    ) -> focus_util::Result<SnoozeEntry> {
        if self.current.is_none() {
            return Err(FocusError::NoSession);
        }
        let normalized = kind
            .normalize(target)
            .ok_or_else(|| FocusError::validation(format!("Invalid {} target: {:?}", kind, target)))?;
        let duration = duration.unwrap_or(self.default_snooze);
        if duration.is_zero() {
            return Err(FocusError::validation("Snooze duration must be positive"));
        }

        let entry = self
            .snoozes
            .snooze(&normalized, kind, duration, now)
            .ok_or_else(|| FocusError::validation(format!("Snooze duration out of range: {:?}", duration)))?;
        info!(target_name = %entry.target, kind = %kind, until = %entry.expires_at, "Snooze granted");
        self.audit(AuditEventType::SnoozeGranted {
            target: entry.target.clone(),
            kind,
            until: entry.expires_at,
        });

        if self.state(now) == SessionState::Active {
            self.reapply(now).await;
        }
        Ok(entry)
    }

    /// Feed back a snooze timer. Stale timers are ignored.
    pub async fn handle_snooze_expired(
        &mut self,
        expired: SnoozeExpired,
        now: DateTime<Local>,
    ) -> Vec<CoreEvent> {
        let Some(entry) = self.snoozes.expire(&expired) else {
            debug!(target_name = %expired.target, "Ignoring stale snooze timer");
            return Vec::new();
        };

        let event = self.snooze_ended(entry);
        if self.state(now) == SessionState::Active {
            self.reapply(now).await;
        }
        vec![event]
    }

    pub fn is_snoozed(&self, target: &str, kind: TargetKind, now: DateTime<Local>) -> bool {
        self.snoozes.is_snoozed(target, kind, now)
    }

    pub fn default_snooze(&self) -> Duration {
        self.default_snooze
    }

    // Queries

    pub fn state(&self, now: DateTime<Local>) -> SessionState {
        self.current
            .as_ref()
            .map_or(SessionState::Idle, |c| c.state(now))
    }

    pub fn current_session(&self) -> Option<&FocusSession> {
        self.current.as_ref().map(ActiveSession::session)
    }

    pub fn current_session_id(&self) -> Option<SessionId> {
        self.current.as_ref().map(ActiveSession::id)
    }

    /// The policy last pushed to the engine
    pub fn policy(&self) -> &DesiredPolicy {
        &self.policy
    }

    pub fn snapshot(&self, now: DateTime<Local>) -> ServiceStateSnapshot {
        ServiceStateSnapshot {
            api_version: API_VERSION,
            state: self.state(now),
            current_session: self
                .current
                .as_ref()
                .map(|c| SessionInfo::from_session(c.session(), now)),
            snoozes: self.snoozes.active(now),
            enforced_apps: self.engine.enforced_apps().into_iter().collect(),
            enforced_websites: self.engine.enforced_websites().into_iter().collect(),
        }
    }

    /// Let the app enforcer reconcile now, e.g. after an app activation
    pub fn nudge_enforcement(&self) {
        if self.state(focus_util::now()) == SessionState::Active {
            self.engine.nudge_apps();
        }
    }

    pub async fn list_installed_apps(&self) -> focus_util::Result<Vec<String>> {
        self.host
            .list_installed_applications()
            .await
            .map_err(|e| FocusError::host(e.to_string()))
    }

    pub fn health(&self) -> HealthStatus {
        let store_ok = self.store.is_healthy();
        let host_ok = self.host.is_healthy();
        HealthStatus {
            live: true,
            ready: store_ok && host_ok,
            host_ok,
            store_ok,
        }
    }

    // Presets

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    /// Insert or replace a preset by id. Targets are normalized and invalid
    /// ones dropped.
    pub fn save_preset(&mut self, mut preset: Preset) -> focus_util::Result<Preset> {
        preset.name = preset.name.trim().to_string();
        if preset.name.is_empty() {
            return Err(FocusError::validation("Preset name cannot be empty"));
        }
        preset.custom_apps = preset
            .custom_apps
            .iter()
            .filter_map(|a| normalize_app_name(a))
            .collect();
        preset.custom_websites = preset
            .custom_websites
            .iter()
            .filter_map(|w| normalize_domain(w))
            .collect();

        match self.presets.iter_mut().find(|p| p.id == preset.id) {
            Some(existing) => *existing = preset.clone(),
            None => self.presets.push(preset.clone()),
        }

        info!(preset_id = %preset.id, name = %preset.name, "Preset saved");
        self.audit(AuditEventType::PresetSaved {
            preset_id: preset.id,
            name: preset.name.clone(),
        });
        self.persist_presets();
        Ok(preset)
    }

    pub fn delete_preset(&mut self, preset_id: PresetId) -> focus_util::Result<()> {
        let idx = self
            .presets
            .iter()
            .position(|p| p.id == preset_id)
            .ok_or(FocusError::PresetNotFound(preset_id))?;
        self.presets.remove(idx);

        info!(preset_id = %preset_id, "Preset deleted");
        self.audit(AuditEventType::PresetDeleted { preset_id });
        self.persist_presets();
        Ok(())
    }

    /// Capture a finished session as a preset. Each session can be saved
    /// at most once.
    pub fn save_preset_from_session(&mut self, session_id: SessionId) -> focus_util::Result<Preset> {
        let session = self
            .history
            .iter()
            .find(|s| s.id == session_id)
            .ok_or(FocusError::HistoryEntryNotFound(session_id))?;
        if self
            .presets
            .iter()
            .any(|p| p.source_session_id == Some(session_id))
        {
            return Err(FocusError::PresetAlreadySaved(session_id));
        }

        let preset = Preset::from_session(session);
        self.save_preset(preset)
    }

    // History

    pub fn history(&self) -> &[FocusSession] {
        &self.history
    }

    pub fn delete_history_entry(&mut self, session_id: SessionId) -> focus_util::Result<()> {
        let idx = self
            .history
            .iter()
            .position(|s| s.id == session_id)
            .ok_or(FocusError::HistoryEntryNotFound(session_id))?;
        self.history.remove(idx);

        self.audit(AuditEventType::HistoryEntryDeleted { session_id });
        self.persist_history();
        Ok(())
    }

    /// Remove every history entry. Returns how many were removed.
    pub fn clear_history(&mut self) -> usize {
        let count = self.history.len();
        self.history.clear();

        info!(count, "History cleared");
        self.audit(AuditEventType::HistoryCleared { count });
        self.persist_history();
        count
    }

    /// Lift enforcement and flush state before the service exits. A running
    /// session stays persisted so the next start can restore it.
    pub async fn shutdown(&mut self) {
        self.engine.lift_all().await;
        self.policy = DesiredPolicy::empty();
        self.snoozes.clear();
        self.persist_current();
        info!("Session controller shut down");
    }

    // Internals

    fn current_mut(&mut self, action: &'static str) -> Result<&mut ActiveSession, TransitionError> {
        self.current
            .as_mut()
            .ok_or_else(|| TransitionError::invalid(action, SessionState::Idle))
    }

    async fn end_session(
        &mut self,
        current: ActiveSession,
        reason: SessionEndReason,
        now: DateTime<Local>,
    ) -> CoreEvent {
        self.engine.lift_all().await;
        self.policy = DesiredPolicy::empty();
        self.snoozes.clear();

        let record = current.finish(now);
        let session_id = record.id;
        let focused = record.focused_time(now).min(record.duration);

        info!(
            session_id = %session_id,
            reason = ?reason,
            focused = ?focused,
            "Session ended"
        );
        self.audit(AuditEventType::SessionEnded {
            session_id,
            reason,
            focused,
        });

        self.history.push(record);
        self.persist_history();
        self.persist_current();

        CoreEvent::SessionEnded {
            session_id,
            reason,
            focused,
        }
    }

    /// Recompute the desired policy and push it to the engine. Anything but
    /// an active session maps to the empty policy.
    async fn reapply(&mut self, now: DateTime<Local>) {
        let policy = match &self.current {
            Some(current) if current.state(now) == SessionState::Active => {
                DesiredPolicy::compute(current.session(), &self.snoozes.active(now), now)
            }
            _ => DesiredPolicy::empty(),
        };

        if policy.is_empty() {
            self.engine.lift_all().await;
        } else {
            self.engine.apply(&policy).await;
        }
        self.policy = policy;
    }

    fn snooze_ended(&self, entry: SnoozeEntry) -> CoreEvent {
        info!(target_name = %entry.target, kind = %entry.kind, "Snooze ended");
        self.audit(AuditEventType::SnoozeExpired {
            target: entry.target.clone(),
            kind: entry.kind,
        });
        CoreEvent::SnoozeEnded {
            target: entry.target,
            kind: entry.kind,
        }
    }

    fn audit(&self, event: AuditEventType) {
        let _ = self.store.append_audit(AuditEvent::new(event));
    }

    fn persist_current(&self) {
        if let Err(e) = self.store.save_current_session(self.current_session()) {
            warn!(error = %e, "Failed to persist current session");
        }
    }

    fn persist_presets(&self) {
        if let Err(e) = self.store.save_presets(&self.presets) {
            warn!(error = %e, "Failed to persist presets");
        }
    }

    fn persist_history(&self) {
        if let Err(e) = self.store.save_history(&self.history) {
            warn!(error = %e, "Failed to persist history");
        }
    }
}
