//! OS capability trait interfaces for focusd
//!
//! This crate defines the interface between the enforcement engine and the
//! platform that is being observed and corrected. It contains no platform
//! code itself.

mod browser;
mod capabilities;
mod mock;
mod traits;

pub use browser::*;
pub use capabilities::*;
pub use mock::*;
pub use traits::*;
