//! Store trait definitions

use focus_api::{FocusSession, Preset};

use crate::{AuditEvent, StoreResult};

/// Main store trait.
///
/// Each save replaces the whole document, so a later successful save
/// always catches up with whatever an earlier failed one missed.
pub trait Store: Send + Sync {
    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Current session

    /// Load the session that was running when the service last saved
    fn load_current_session(&self) -> StoreResult<Option<FocusSession>>;

    /// Save the current session. `None` clears it.
    fn save_current_session(&self, session: Option<&FocusSession>) -> StoreResult<()>;

    // Presets

    /// Load saved presets. `None` means presets were never saved.
    fn load_presets(&self) -> StoreResult<Option<Vec<Preset>>>;

    fn save_presets(&self, presets: &[Preset]) -> StoreResult<()>;

    // History

    /// Load finished sessions, oldest first
    fn load_history(&self) -> StoreResult<Vec<FocusSession>>;

    fn save_history(&self, history: &[FocusSession]) -> StoreResult<()>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
