//! Data model and protocol types for focusd
//!
//! This crate defines the stable API between focusd and clients:
//! - Focus sessions, presets, categories and snooze entries
//! - Block target normalization and matching
//! - Commands (requests from clients) and responses
//! - Events (service -> clients)
//! - Versioning

mod category;
mod commands;
mod events;
mod model;
mod target;
mod types;

pub use category::*;
pub use commands::*;
pub use events::*;
pub use model::*;
pub use target::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;

/// Snooze length used when a request does not name one
pub const DEFAULT_SNOOZE: std::time::Duration = std::time::Duration::from_secs(180);
