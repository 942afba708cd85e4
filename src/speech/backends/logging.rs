//! Logging engine
//!
//! Always available and never produces audio: `speak` only writes the
//! phrase to the log. Useful on headless machines and in tests.

use crate::speech::engine::{Engine, EngineContext, RenderedAudio, SpeakOutcome};
use crate::{Result, VsayError};
use log::info;

pub const SLUG: &str = "log-tts";

/// Slug older profiles use for this engine
pub const LEGACY_SLUG: &str = "mp3-player";

/// Engine that logs phrases instead of speaking them
#[derive(Debug, Default)]
pub struct LogEngine;

impl LogEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn probe(_ctx: &EngineContext) -> bool {
        true
    }

    pub fn build(_ctx: &EngineContext) -> Result<Box<dyn Engine>> {
        Ok(Box::new(Self::new()))
    }
}

impl Engine for LogEngine {
    fn slug(&self) -> &str {
        SLUG
    }

    fn is_available(&self) -> bool {
        true
    }

    fn render(&mut self, _phrase: &str) -> Result<RenderedAudio> {
        Err(VsayError::Synthesis(format!("{} produces no audio", SLUG)))
    }

    fn speak(&mut self, phrase: &str, _use_cache: bool) -> Result<SpeakOutcome> {
        info!("{}", phrase);
        Ok(SpeakOutcome::Logged)
    }
}
