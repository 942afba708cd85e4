//! MP3 playback adapter
//!
//! Shared by every engine that renders phrases into audio files: text
//! normalization, and the cache-check / render / play / store pipeline
//! behind `Engine::speak`.

use crate::speech::cache::SynthesisCache;
use crate::speech::engine::{RenderedAudio, SpeakOutcome};
use crate::speech::player::AudioPlayer;
use crate::Result;
use log::{debug, error, info, warn};
use std::sync::Arc;

/// Characters removed from phrases before rendering
pub const UNSAFE_CHARS: &[char] = &[',', '/', ':', '\\', '@', '%', '&', '*', '(', ')', '{', '}'];

/// Strip characters that are unsafe in file names or confuse engines
pub fn normalize(phrase: &str) -> String {
    phrase.chars().filter(|c| !UNSAFE_CHARS.contains(c)).collect()
}

/// Playback and caching for file-producing engines
#[derive(Clone)]
pub struct Mp3Output {
    player: Arc<dyn AudioPlayer>,
    cache: SynthesisCache,
}

impl Mp3Output {
    pub fn new(player: Arc<dyn AudioPlayer>, cache: SynthesisCache) -> Self {
        Self { player, cache }
    }

    /// Whether the player can run on this machine
    pub fn player_installed(&self) -> bool {
        self.player.is_installed()
    }

    /// Speak `phrase` for engine `slug`, calling `render` on a cache miss
    ///
    /// With `use_cache` unset the cache is neither read nor written and the
    /// rendered file is deleted after playback. Failed renders are never
    /// cached. A failing player only produces a warning.
    pub fn speak<F>(
        &self,
        slug: &str,
        phrase: &str,
        use_cache: bool,
        render: F,
    ) -> Result<SpeakOutcome>
    where
        F: FnOnce(&str) -> Result<RenderedAudio>,
    {
        debug!("Saying '{}' with '{}'", phrase, slug);

        let key = if use_cache {
            let key = SynthesisCache::key(slug, phrase);
            if let Some(path) = self.cache.lookup(&key) {
                info!("Found speech in cache, playing... [{}]", path.display());
                let playback = self.player.play(&path);
                return Ok(SpeakOutcome::Played {
                    path: Some(path),
                    from_cache: true,
                    playback,
                });
            }
            Some(key)
        } else {
            None
        };

        let audio = render(phrase).map_err(|e| {
            error!("Engine '{}' failed to render '{}': {}", slug, phrase, e);
            e
        })?;

        let playback = self.player.play(audio.path());

        let Some(key) = key else {
            drop(audio);
            return Ok(SpeakOutcome::Played {
                path: None,
                from_cache: false,
                playback,
            });
        };

        info!("Speech not found in cache, caching... [{}]", key);
        let path = match self.cache.store(&key, audio) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Failed to cache speech for '{}' ({}): {}", phrase, slug, e);
                None
            }
        };
        Ok(SpeakOutcome::Played {
            path,
            from_cache: false,
            playback,
        })
    }
}
