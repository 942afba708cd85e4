//! vsay - speech output for a voice assistant client
//!
//! Turns text phrases into audible output through interchangeable
//! synthesis engines, caching rendered audio on disk and managing the
//! access tokens of network-backed engines.

pub mod config;
pub mod error;
pub mod platform;
pub mod speech;

pub use error::{Result, VsayError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "vsay";
