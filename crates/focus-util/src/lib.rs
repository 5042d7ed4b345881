//! Shared utilities for focusd
//!
//! This crate provides:
//! - ID types (SessionId, PresetId, ClientId)
//! - Time utilities (mockable wall clock, duration formatting)
//! - Error types
//! - Default paths for socket, data, and config directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
