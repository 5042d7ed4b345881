//! SQLite-based store implementation

use chrono::{DateTime, Local};
use focus_api::{FocusSession, Preset};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{AuditEvent, Store, StoreError, StoreResult};

const CURRENT_SESSION_KEY: &str = "current_session";
const PRESETS_KEY: &str = "presets";
const HISTORY_KEY: &str = "history";

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Poisoned)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            -- Whole-document state: current session, presets, history
            CREATE TABLE IF NOT EXISTS documents (
                key TEXT PRIMARY KEY,
                json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }

    fn load_document<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let conn = self.conn()?;

        let json: Option<String> = conn
            .query_row("SELECT json FROM documents WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;

        match json {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    fn save_document<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let json = serde_json::to_string(value)?;
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO documents (key, json, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key)
            DO UPDATE SET json = excluded.json, updated_at = excluded.updated_at
            "#,
            params![key, json, focus_util::now().to_rfc3339()],
        )?;

        debug!(key, bytes = json.len(), "Document saved");
        Ok(())
    }

    fn delete_document(&self, key: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM documents WHERE key = ?", [key])?;
        Ok(())
    }
}

impl Store for SqliteStore {
    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let event_json = serde_json::to_string(&event.event)?;
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
            params![event.timestamp.to_rfc3339(), event_json],
        )?;

        event.id = conn.last_insert_rowid();
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let id: i64 = row.get(0)?;
            let timestamp_str: String = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp_str, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp_str, event_json) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map(|dt| dt.with_timezone(&Local))
                .unwrap_or_else(|_| focus_util::now());
            let event: crate::AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp,
                event,
            });
        }

        Ok(events)
    }

    fn load_current_session(&self) -> StoreResult<Option<FocusSession>> {
        self.load_document(CURRENT_SESSION_KEY)
    }

    fn save_current_session(&self, session: Option<&FocusSession>) -> StoreResult<()> {
        match session {
            Some(session) => self.save_document(CURRENT_SESSION_KEY, session),
            None => self.delete_document(CURRENT_SESSION_KEY),
        }
    }

    fn load_presets(&self) -> StoreResult<Option<Vec<Preset>>> {
        self.load_document(PRESETS_KEY)
    }

    fn save_presets(&self, presets: &[Preset]) -> StoreResult<()> {
        self.save_document(PRESETS_KEY, presets)
    }

    fn load_history(&self) -> StoreResult<Vec<FocusSession>> {
        let history: Option<Vec<FocusSession>> = self.load_document(HISTORY_KEY)?;
        Ok(history.unwrap_or_default())
    }

    fn save_history(&self, history: &[FocusSession]) -> StoreResult<()> {
        self.save_document(HISTORY_KEY, history)
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuditEventType;
    use focus_api::BlockCategory;
    use std::time::Duration;

    fn running_session() -> FocusSession {
        let now = focus_util::now();
        let mut session = FocusSession::new("Write chapter", Duration::from_secs(1500))
            .with_apps(["Slack"])
            .with_websites(["reddit.com"])
            .with_categories([BlockCategory::SocialMedia]);
        session.start_time = Some(now);
        session.end_time = Some(now + chrono::Duration::seconds(1500));
        session.active = true;
        session.paused = true;
        session.paused_at = Some(now);
        session.total_paused = Duration::from_millis(2500);
        session
    }

    #[test]
    fn test_in_memory_store() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.is_healthy());
    }

    #[test]
    fn test_audit_log() {
        let store = SqliteStore::in_memory().unwrap();

        store
            .append_audit(AuditEvent::new(AuditEventType::ServiceStarted))
            .unwrap();
        store
            .append_audit(AuditEvent::new(AuditEventType::HistoryCleared { count: 3 }))
            .unwrap();

        let events = store.get_recent_audits(10).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0].event, AuditEventType::HistoryCleared { count: 3 }));
        assert!(matches!(events[1].event, AuditEventType::ServiceStarted));
    }

    #[test]
    fn test_current_session_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.load_current_session().unwrap().is_none());

        let session = running_session();
        store.save_current_session(Some(&session)).unwrap();
        assert_eq!(store.load_current_session().unwrap(), Some(session));

        store.save_current_session(None).unwrap();
        assert!(store.load_current_session().unwrap().is_none());
    }

    #[test]
    fn test_presets_distinguish_unsaved_from_empty() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.load_presets().unwrap().is_none());

        store.save_presets(&[]).unwrap();
        assert_eq!(store.load_presets().unwrap(), Some(vec![]));

        let presets = Preset::defaults();
        store.save_presets(&presets).unwrap();
        assert_eq!(store.load_presets().unwrap(), Some(presets));
    }

    #[test]
    fn test_history_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.load_history().unwrap().is_empty());

        let mut finished = running_session();
        finished.active = false;
        finished.paused = false;
        finished.paused_at = None;
        store.save_history(std::slice::from_ref(&finished)).unwrap();

        assert_eq!(store.load_history().unwrap(), vec![finished]);
    }

    #[test]
    fn test_file_store_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("focusd.db");
        let session = running_session();

        {
            let store = SqliteStore::open(&path).unwrap();
            store.save_current_session(Some(&session)).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.load_current_session().unwrap(), Some(session));
    }
}
