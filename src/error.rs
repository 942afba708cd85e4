//! Error types for vsay

use std::io;
use thiserror::Error;

/// Main error type for vsay
#[derive(Error, Debug)]
pub enum VsayError {
    /// Missing or invalid engine credentials/settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// No engine is registered under the requested slug
    #[error("No TTS engine found for slug '{0}'")]
    NotFound(String),

    /// The engine exists but its platform prerequisites are missing
    #[error("TTS engine '{0}' is not available (missing dependencies, no network, etc.)")]
    Unavailable(String),

    /// Several registered engines share one slug
    #[error("Multiple TTS engines registered for slug '{0}'")]
    AmbiguousSlug(String),

    /// Token exchange with the provider failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Remote rendering failed or returned an error body
    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("INI parse error: {0}")]
    IniParse(String),
}

/// Result type alias for vsay operations
pub type Result<T> = std::result::Result<T, VsayError>;
