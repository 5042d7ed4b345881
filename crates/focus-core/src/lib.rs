//! Core session state machine and enforcement engine for focusd
//!
//! This crate is the heart of focusd, containing:
//! - Session state machine (Idle -> Active <-> Paused -> Completed -> Idle)
//! - Snooze scheduler (time-boxed per-target exemptions)
//! - Desired policy computation
//! - Reconciliation pollers for apps and browser tabs
//! - The session controller that ties them together

mod controller;
mod enforce;
mod events;
mod policy;
mod session;
mod snooze;

pub use controller::*;
pub use enforce::*;
pub use events::*;
pub use policy::*;
pub use session::*;
pub use snooze::*;
