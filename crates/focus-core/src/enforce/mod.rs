//! Enforcement: reconciliation pollers that converge the host on the
//! desired policy
//!
//! Each enforcer owns one poller. A poller runs a cycle immediately on
//! start and then once per interval; the app enforcer can also be nudged to
//! run a cycle early when the host reports an activation.

mod app;
mod engine;
mod poller;
mod website;

pub use app::*;
pub use engine::*;
pub use poller::*;
pub use website::*;
