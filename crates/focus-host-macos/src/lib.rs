//! macOS host adapter for focusd
//!
//! Provides:
//! - Running-app listing and hide/unhide through System Events
//! - Browser tab inspection and redirect through per-browser AppleScript
//! - Installed application discovery from the standard app folders
//! - Frontmost-app observation for fast enforcement

mod adapter;
mod apps;
mod script;

pub use adapter::*;
pub use apps::*;
pub use script::*;
