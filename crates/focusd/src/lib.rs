//! focusd - focus sessions that keep distracting apps and websites away
//!
//! The service wires together:
//! - The session controller and its enforcement engine
//! - The host (macOS System Events in production, a mock in tests)
//! - The store (SQLite)
//! - The IPC server clients talk to

mod service;

pub use service::*;
