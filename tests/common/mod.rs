//! Shared test doubles

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use vsay::config::Config;
use vsay::speech::{AudioPlayer, EngineContext, Playback};

/// Player that records what it was asked to play
#[derive(Default)]
pub struct RecordingPlayer {
    played: Mutex<Vec<(PathBuf, Vec<u8>)>>,
}

impl RecordingPlayer {
    /// Paths played so far, in order
    pub fn paths(&self) -> Vec<PathBuf> {
        self.played.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }

    /// File contents at the time each playback happened
    pub fn contents(&self) -> Vec<Vec<u8>> {
        self.played.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.played.lock().unwrap().len()
    }
}

impl AudioPlayer for RecordingPlayer {
    fn play(&self, path: &Path) -> Playback {
        let contents = std::fs::read(path).unwrap_or_default();
        self.played
            .lock()
            .unwrap()
            .push((path.to_path_buf(), contents));
        Playback::Completed
    }
}

/// Player that always fails, like an unplugged audio device
#[derive(Default)]
pub struct FailingPlayer {
    plays: AtomicUsize,
}

impl FailingPlayer {
    pub fn count(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

impl AudioPlayer for FailingPlayer {
    fn play(&self, _path: &Path) -> Playback {
        self.plays.fetch_add(1, Ordering::SeqCst);
        Playback::Warning("player exited with exit status: 1".to_string())
    }
}

/// `[speech]` section pointing every path into `dir`
pub fn speech_section(dir: &Path) -> String {
    format!(
        "[speech]\ncache_dir = {}\nscratch_dir = {}\ncredential_file = {}\ntimeout_secs = 5\n",
        dir.join("cache").display(),
        dir.join("scratch").display(),
        dir.join("token.cfg").display(),
    )
}

/// Context over `profile` with a recording player
pub fn context(profile: &str) -> (EngineContext, Arc<RecordingPlayer>) {
    let config = Config::from_ini_str(profile).expect("valid test profile");
    let player = Arc::new(RecordingPlayer::default());
    let ctx = EngineContext::with_player(config, player.clone());
    (ctx, player)
}

/// Context over `profile` whose player always fails
pub fn failing_context(profile: &str) -> (EngineContext, Arc<FailingPlayer>) {
    let config = Config::from_ini_str(profile).expect("valid test profile");
    let player = Arc::new(FailingPlayer::default());
    let ctx = EngineContext::with_player(config, player.clone());
    (ctx, player)
}

/// Number of files directly inside `dir` (0 when it does not exist)
pub fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).filter(|e| e.path().is_file()).count())
        .unwrap_or(0)
}
