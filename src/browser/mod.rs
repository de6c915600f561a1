//! Browser session management
//!
//! Launches or attaches to Chrome over the DevTools protocol and hosts the
//! page scripts that extract listing data from the active tab.

pub mod config;
pub mod session;

pub use config::{ConnectionOptions, LaunchOptions};
pub use session::BrowserSession;
