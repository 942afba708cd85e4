//! Engine contract
//!
//! Every synthesis backend implements [`Engine`]. File-producing engines
//! render a phrase into a scratch audio file and hand it to the shared
//! MP3 pipeline for playback and caching.

use crate::config::Config;
use crate::speech::cache::SynthesisCache;
use crate::speech::mp3::Mp3Output;
use crate::speech::player::{AudioPlayer, CommandPlayer, Playback};
use crate::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempPath;

/// Extension of the audio files produced by the file-based engines
pub const AUDIO_EXTENSION: &str = "mp3";

/// Text-to-speech backend
pub trait Engine: Send {
    /// Unique identifier of this engine variant
    fn slug(&self) -> &str;

    /// Whether the platform prerequisites of this engine are met
    ///
    /// Must not have side effects beyond probing.
    fn is_available(&self) -> bool;

    /// Turn a phrase into an audio file
    fn render(&mut self, phrase: &str) -> Result<RenderedAudio>;

    /// Speak a phrase, optionally through the synthesis cache
    fn speak(&mut self, phrase: &str, use_cache: bool) -> Result<SpeakOutcome>;
}

/// What a successful `speak` call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// Audio was played to the user
    Played {
        /// Cache entry holding the audio; `None` when the rendered file was
        /// discarded after playback
        path: Option<PathBuf>,
        /// The audio came from the cache rather than a fresh render
        from_cache: bool,
        playback: Playback,
    },
    /// The engine only logged the phrase
    Logged,
}

/// Freshly rendered audio in a scratch location
///
/// The file is deleted when this value is dropped unless it was moved into
/// the cache first.
#[derive(Debug)]
pub struct RenderedAudio {
    path: TempPath,
}

impl RenderedAudio {
    /// Write `bytes` to a new scratch file in `dir`
    pub fn write_new(dir: &Path, bytes: &[u8]) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let mut file = tempfile::Builder::new()
            .prefix("vsay-")
            .suffix(&format!(".{}", AUDIO_EXTENSION))
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.as_file().sync_all()?;
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_temp_path(self) -> TempPath {
        self.path
    }
}

/// Shared services handed to engine constructors
pub struct EngineContext {
    /// Profile the engine reads its settings from
    pub config: Config,

    /// Player used for every rendered or cached file
    pub player: Arc<dyn AudioPlayer>,

    /// Cache of rendered audio
    pub cache: SynthesisCache,
}

impl EngineContext {
    /// Build the context with the player named in the profile
    pub fn from_config(config: Config) -> Self {
        let player: Arc<dyn AudioPlayer> = Arc::new(CommandPlayer::new(&config.player()));
        Self::with_player(config, player)
    }

    /// Build the context around an explicit player
    pub fn with_player(config: Config, player: Arc<dyn AudioPlayer>) -> Self {
        let cache = SynthesisCache::new(config.cache_dir(), AUDIO_EXTENSION);
        Self {
            config,
            player,
            cache,
        }
    }

    /// Playback/caching pipeline for file-producing engines
    pub fn mp3_output(&self) -> Mp3Output {
        Mp3Output::new(self.player.clone(), self.cache.clone())
    }
}
