//! Integration tests for the speak pipeline
//!
//! A counting engine renders phrases into scratch files; a recording
//! player stands in for the external audio player.

mod common;

use common::{context, failing_context, file_count, speech_section};
use std::path::PathBuf;
use vsay::config::Config;
use vsay::speech::{
    Engine, EngineContext, Mp3Output, Playback, RenderedAudio, SpeakOutcome, SynthesisCache,
};
use vsay::{Result, VsayError};

/// Engine whose audio is the phrase text itself
struct CountingEngine {
    output: Mp3Output,
    scratch_dir: PathBuf,
    renders: usize,
    fail: bool,
}

impl CountingEngine {
    fn new(ctx: &EngineContext) -> Self {
        Self {
            output: ctx.mp3_output(),
            scratch_dir: ctx.config.scratch_dir(),
            renders: 0,
            fail: false,
        }
    }
}

impl Engine for CountingEngine {
    fn slug(&self) -> &str {
        "counting-tts"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn render(&mut self, phrase: &str) -> Result<RenderedAudio> {
        self.renders += 1;
        if self.fail {
            return Err(VsayError::Synthesis("simulated failure".to_string()));
        }
        RenderedAudio::write_new(&self.scratch_dir, phrase.as_bytes())
    }

    fn speak(&mut self, phrase: &str, use_cache: bool) -> Result<SpeakOutcome> {
        let output = self.output.clone();
        output.speak("counting-tts", phrase, use_cache, |p| self.render(p))
    }
}

#[test]
fn test_second_cached_speak_is_a_cache_hit() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, player) = context(&speech_section(dir.path()));
    let mut engine = CountingEngine::new(&ctx);

    let first = engine.speak("hello world", true).unwrap();
    let second = engine.speak("hello world", true).unwrap();

    assert_eq!(engine.renders, 1);
    assert_eq!(player.count(), 2);

    let path = match &first {
        SpeakOutcome::Played {
            from_cache: false,
            path: Some(path),
            ..
        } => path.clone(),
        other => panic!("expected a freshly cached playback, got {:?}", other),
    };
    assert_eq!(
        second,
        SpeakOutcome::Played {
            path: Some(path.clone()),
            from_cache: true,
            playback: Playback::Completed,
        }
    );

    // Both playbacks heard the same audio, and it now lives in the cache
    assert_eq!(player.contents(), vec![b"hello world".to_vec(), b"hello world".to_vec()]);
    assert_eq!(ctx.cache.lookup(&SynthesisCache::key("counting-tts", "hello world")), Some(path));
    assert_eq!(file_count(&dir.path().join("scratch")), 0);
}

#[test]
fn test_uncached_speak_discards_audio() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, player) = context(&speech_section(dir.path()));
    let mut engine = CountingEngine::new(&ctx);

    let outcome = engine.speak("hello", false).unwrap();
    engine.speak("hello", false).unwrap();

    assert_eq!(
        outcome,
        SpeakOutcome::Played {
            path: None,
            from_cache: false,
            playback: Playback::Completed,
        }
    );
    assert_eq!(engine.renders, 2);
    assert_eq!(player.count(), 2);
    assert_eq!(player.contents()[0], b"hello");
    for path in player.paths() {
        assert!(!path.exists(), "scratch file {:?} was left behind", path);
    }
    assert_eq!(file_count(&dir.path().join("cache")), 0);
}

#[test]
fn test_uncached_speak_ignores_existing_entry() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, _player) = context(&speech_section(dir.path()));
    let mut engine = CountingEngine::new(&ctx);

    engine.speak("hello", true).unwrap();
    engine.speak("hello", false).unwrap();

    assert_eq!(engine.renders, 2);
}

#[test]
fn test_failed_render_is_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, player) = context(&speech_section(dir.path()));
    let mut engine = CountingEngine::new(&ctx);
    engine.fail = true;

    let result = engine.speak("hello", true);
    assert!(matches!(result, Err(VsayError::Synthesis(_))));
    assert_eq!(player.count(), 0);
    assert!(ctx.cache.lookup(&SynthesisCache::key("counting-tts", "hello")).is_none());

    // No negative caching: the next request renders again
    engine.fail = false;
    let outcome = engine.speak("hello", true).unwrap();
    assert_eq!(engine.renders, 2);
    assert!(matches!(
        outcome,
        SpeakOutcome::Played {
            from_cache: false,
            path: Some(_),
            ..
        }
    ));
}

#[test]
fn test_phrases_are_cached_separately() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, player) = context(&speech_section(dir.path()));
    let mut engine = CountingEngine::new(&ctx);

    engine.speak("one", true).unwrap();
    engine.speak("two", true).unwrap();
    engine.speak("one", true).unwrap();

    assert_eq!(engine.renders, 2);
    assert_eq!(file_count(&dir.path().join("cache")), 2);
    assert_eq!(player.contents()[2], b"one");
}

#[test]
fn test_failing_player_still_caches() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, player) = failing_context(&speech_section(dir.path()));
    let mut engine = CountingEngine::new(&ctx);

    let first = engine.speak("hello", true).unwrap();
    let second = engine.speak("hello", true).unwrap();

    assert!(matches!(
        first,
        SpeakOutcome::Played {
            from_cache: false,
            path: Some(_),
            playback: Playback::Warning(_),
        }
    ));
    assert!(matches!(
        second,
        SpeakOutcome::Played {
            from_cache: true,
            playback: Playback::Warning(_),
            ..
        }
    ));
    assert_eq!(engine.renders, 1);
    assert_eq!(player.count(), 2);
}

#[cfg(unix)]
#[test]
fn test_nonzero_exit_of_command_player_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let profile = format!("{}player = false\n", speech_section(dir.path()));
    let ctx = EngineContext::from_config(Config::from_ini_str(&profile).unwrap());
    let mut engine = CountingEngine::new(&ctx);

    engine.speak("hello", true).unwrap();
    let second = engine.speak("hello", true).unwrap();

    assert_eq!(engine.renders, 1);
    assert!(matches!(
        second,
        SpeakOutcome::Played {
            from_cache: true,
            playback: Playback::Warning(_),
            ..
        }
    ));
}
