//! Persistence layer for focusd
//!
//! Provides:
//! - Current session snapshot for restart recovery
//! - Saved presets and session history
//! - Audit log (append-only)

mod audit;
mod sqlite;
mod traits;

pub use audit::*;
pub use sqlite::*;
pub use traits::*;

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored document did not decode, or a value did not encode
    #[error("Document JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store connection poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;
