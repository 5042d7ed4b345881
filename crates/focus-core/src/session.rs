//! Session state machine

use chrono::{DateTime, Local};
use focus_api::{FocusSession, SessionState};
use focus_util::{SessionId, checked_offset, elapsed_between};
use std::time::Duration;
use thiserror::Error;

/// A rejected state transition. State is unchanged when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {action} while {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },

    #[error("cannot {action} by {by:?}: time out of range")]
    OutOfRange { action: &'static str, by: Duration },
}

impl TransitionError {
    pub(crate) fn invalid(action: &'static str, state: SessionState) -> Self {
        TransitionError::InvalidTransition { action, state }
    }
}

impl From<TransitionError> for focus_util::FocusError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::InvalidTransition { .. } => {
                focus_util::FocusError::InvalidTransition(err.to_string())
            }
            TransitionError::OutOfRange { .. } => focus_util::FocusError::validation(err.to_string()),
        }
    }
}

/// The controller's current session.
///
/// Wraps a [`FocusSession`] and only exposes the transitions that keep its
/// invariants (`paused_at` set iff `paused`, `end_time` tracking `duration`).
#[derive(Debug, Clone)]
pub struct ActiveSession {
    session: FocusSession,
}

impl ActiveSession {
    /// Start the clock on a fresh session
    pub fn begin(mut session: FocusSession, now: DateTime<Local>) -> Result<Self, TransitionError> {
        let end_time = checked_offset(now, session.duration).ok_or(TransitionError::OutOfRange {
            action: "start",
            by: session.duration,
        })?;
        session.start_time = Some(now);
        session.end_time = Some(end_time);
        session.active = true;
        session.paused = false;
        session.paused_at = None;
        session.total_paused = Duration::ZERO;
        Ok(Self { session })
    }

    /// Adopt a persisted session. Returns `None` for sessions that never
    /// started or already ended.
    pub fn restore(mut session: FocusSession, now: DateTime<Local>) -> Option<Self> {
        if !session.active || session.start_time.is_none() {
            return None;
        }
        match (session.paused, session.paused_at) {
            (true, None) => session.paused_at = Some(now),
            (false, Some(_)) => session.paused_at = None,
            _ => {}
        }
        Some(Self { session })
    }

    pub fn session(&self) -> &FocusSession {
        &self.session
    }

    pub fn id(&self) -> SessionId {
        self.session.id
    }

    pub fn state(&self, now: DateTime<Local>) -> SessionState {
        self.session.state(now)
    }

    pub fn remaining(&self, now: DateTime<Local>) -> Duration {
        self.session.remaining(now)
    }

    /// Freeze the clock. Valid only while `Active`.
    pub fn pause(&mut self, now: DateTime<Local>) -> Result<(), TransitionError> {
        let state = self.state(now);
        if state != SessionState::Active {
            return Err(TransitionError::invalid("pause", state));
        }
        self.session.paused = true;
        self.session.paused_at = Some(now);
        Ok(())
    }

    /// Restart the clock. Returns how long the session was paused.
    pub fn resume(&mut self, now: DateTime<Local>) -> Result<Duration, TransitionError> {
        let state = self.state(now);
        let Some(paused_at) = self.session.paused_at.filter(|_| state == SessionState::Paused)
        else {
            return Err(TransitionError::invalid("resume", state));
        };
        let paused_for = elapsed_between(paused_at, now);
        self.session.total_paused += paused_for;
        self.session.paused = false;
        self.session.paused_at = None;
        self.session.end_time = self
            .session
            .end_time
            .map(|end| checked_offset(end, paused_for).unwrap_or(end));
        Ok(paused_for)
    }

    /// Add time. Valid only while `Active`; nothing changes when the new
    /// end is out of range.
    pub fn extend(&mut self, by: Duration, now: DateTime<Local>) -> Result<(), TransitionError> {
        let state = self.state(now);
        if state != SessionState::Active {
            return Err(TransitionError::invalid("extend", state));
        }
        let out_of_range = TransitionError::OutOfRange { action: "extend", by };
        let duration = self.session.duration.checked_add(by).ok_or(out_of_range.clone())?;
        let end_time = match self.session.end_time {
            Some(end) => Some(checked_offset(end, by).ok_or(out_of_range)?),
            None => None,
        };
        self.session.duration = duration;
        self.session.end_time = end_time;
        Ok(())
    }

    /// Turn the session into its terminal history record.
    ///
    /// An outstanding pause is folded into `total_paused`, so the record
    /// satisfies the pause invariant and reports the time actually focused.
    pub fn finish(mut self, now: DateTime<Local>) -> FocusSession {
        if let Some(paused_at) = self.session.paused_at.take() {
            self.session.total_paused += elapsed_between(paused_at, now);
        }
        self.session.paused = false;
        self.session.active = false;
        self.session.end_time = Some(now);
        self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 4, 2, 8, 0, 0).unwrap()
    }

    fn at(secs: i64) -> DateTime<Local> {
        t0() + chrono::Duration::seconds(secs)
    }

    fn begin(duration: u64) -> ActiveSession {
        ActiveSession::begin(FocusSession::new("focus", Duration::from_secs(duration)), t0()).unwrap()
    }

    #[test]
    fn begin_sets_times() {
        let s = begin(1500);
        assert_eq!(s.session().start_time, Some(t0()));
        assert_eq!(s.session().end_time, Some(at(1500)));
        assert!(s.session().active);
        assert_eq!(s.state(t0()), SessionState::Active);
    }

    #[test]
    fn pause_resume_preserves_remaining() {
        let mut s = begin(1500);
        s.pause(at(600)).unwrap();
        let before = s.remaining(at(600));
        assert_eq!(before, Duration::from_secs(900));

        let paused_for = s.resume(at(900)).unwrap();
        assert_eq!(paused_for, Duration::from_secs(300));
        assert_eq!(s.remaining(at(900)), before);
        assert_eq!(s.remaining(at(1000)), Duration::from_secs(800));
        assert_eq!(s.session().end_time, Some(at(1800)));
    }

    #[test]
    fn repeated_pauses_accumulate() {
        let mut s = begin(1000);
        s.pause(at(100)).unwrap();
        s.resume(at(200)).unwrap();
        s.pause(at(300)).unwrap();
        s.resume(at(450)).unwrap();
        assert_eq!(s.session().total_paused, Duration::from_secs(250));
        assert_eq!(s.remaining(at(450)), Duration::from_secs(800));
    }

    #[test]
    fn invalid_transitions_leave_state_unchanged() {
        let mut s = begin(1000);
        let before = s.session().clone();

        assert_eq!(
            s.resume(at(10)),
            Err(TransitionError::InvalidTransition {
                action: "resume",
                state: SessionState::Active
            })
        );
        assert_eq!(s.session(), &before);

        s.pause(at(10)).unwrap();
        let paused = s.session().clone();
        assert!(s.pause(at(20)).is_err());
        assert!(s.extend(Duration::from_secs(60), at(20)).is_err());
        assert_eq!(s.session(), &paused);
    }

    #[test]
    fn completed_session_rejects_pause_and_extend() {
        let mut s = begin(60);
        assert_eq!(s.state(at(60)), SessionState::Completed);
        assert!(s.pause(at(60)).is_err());
        assert!(s.extend(Duration::from_secs(60), at(60)).is_err());
    }

    #[test]
    fn extend_shifts_end() {
        let mut s = begin(600);
        s.extend(Duration::from_secs(300), at(100)).unwrap();
        assert_eq!(s.session().duration, Duration::from_secs(900));
        assert_eq!(s.session().end_time, Some(at(900)));
        assert_eq!(s.remaining(at(100)), Duration::from_secs(800));
    }

    #[test]
    fn out_of_range_durations_are_rejected() {
        let huge = FocusSession::new("focus", Duration::from_secs(u64::MAX));
        assert!(matches!(
            ActiveSession::begin(huge, t0()),
            Err(TransitionError::OutOfRange { action: "start", .. })
        ));

        let mut s = begin(600);
        let err = s.extend(Duration::from_secs(u64::MAX / 2), at(100)).unwrap_err();
        assert!(matches!(err, TransitionError::OutOfRange { action: "extend", .. }));
        assert_eq!(s.session().duration, Duration::from_secs(600));
        assert_eq!(s.session().end_time, Some(at(600)));

        let err = s.extend(Duration::MAX, at(100)).unwrap_err();
        assert!(matches!(err, TransitionError::OutOfRange { .. }));
        assert!(matches!(
            focus_util::FocusError::from(err),
            focus_util::FocusError::ValidationError(_)
        ));
    }

    #[test]
    fn finish_folds_open_pause() {
        let mut s = begin(600);
        s.pause(at(100)).unwrap();
        let record = s.finish(at(400));

        assert!(!record.active);
        assert!(!record.paused);
        assert!(record.paused_at.is_none());
        assert_eq!(record.end_time, Some(at(400)));
        assert_eq!(record.total_paused, Duration::from_secs(300));
        assert_eq!(record.focused_time(at(400)), Duration::from_secs(100));
    }

    #[test]
    fn restore_repairs_pause_invariant() {
        let mut session = begin(600).session().clone();
        session.paused = true;
        session.paused_at = None;

        let restored = ActiveSession::restore(session, at(50)).unwrap();
        assert_eq!(restored.session().paused_at, Some(at(50)));

        let unstarted = FocusSession::new("never", Duration::from_secs(60));
        assert!(ActiveSession::restore(unstarted, t0()).is_none());
    }
}
