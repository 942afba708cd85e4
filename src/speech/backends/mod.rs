//! Speech engine implementations

// Logging-only engine, always available
pub mod logging;

// Baidu network synthesis engine
pub mod baidu;
