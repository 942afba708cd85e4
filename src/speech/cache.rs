//! Synthesis cache
//!
//! Content-addressed store of rendered audio, one file per
//! (engine slug, phrase) pair. Entries are trusted without verification and
//! are never evicted; the directory grows with every new phrase.

use crate::speech::engine::RenderedAudio;
use crate::Result;
use log::debug;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Identity of a cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    slug: String,
    digest: String,
}

impl CacheKey {
    /// Hash of the slug and the UTF-8 bytes of the phrase
    ///
    /// Stable across process restarts.
    pub fn new(slug: &str, phrase: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(slug.as_bytes());
        hasher.update([0u8]);
        hasher.update(phrase.as_bytes());
        Self {
            slug: slug.to_string(),
            digest: hex::encode(hasher.finalize()),
        }
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.slug, self.digest)
    }
}

/// On-disk cache of rendered audio
#[derive(Debug, Clone)]
pub struct SynthesisCache {
    dir: PathBuf,
    extension: String,
}

impl SynthesisCache {
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.to_string(),
        }
    }

    /// Cache key of a phrase spoken by `slug`
    pub fn key(slug: &str, phrase: &str) -> CacheKey {
        CacheKey::new(slug, phrase)
    }

    /// Location an entry is stored at
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.{}", key, self.extension))
    }

    /// Path of a cached entry, if present
    pub fn lookup(&self, key: &CacheKey) -> Option<PathBuf> {
        let path = self.path_for(key);
        if path.is_file() {
            debug!("Cache hit for {}", key);
            Some(path)
        } else {
            debug!("Cache miss for {}", key);
            None
        }
    }

    /// Move rendered audio into the cache under `key`
    ///
    /// The entry appears atomically; concurrent stores of the same key leave
    /// whichever finished last. On failure the scratch file is removed.
    pub fn store(&self, key: &CacheKey, audio: RenderedAudio) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let dest = self.path_for(key);

        match audio.into_temp_path().persist(&dest) {
            Ok(()) => {}
            Err(e) => {
                // Rename fails across filesystems; copy into the cache
                // directory and rename from there instead.
                debug!("Rename into cache failed ({}), copying", e.error);
                self.copy_into(&e.path, &dest)?;
            }
        }

        debug!("Stored {} at {}", key, dest.display());
        Ok(dest)
    }

    fn copy_into(&self, src: &Path, dest: &Path) -> io::Result<()> {
        let mut staged = NamedTempFile::new_in(&self.dir)?;
        io::copy(&mut File::open(src)?, &mut staged)?;
        staged.as_file().sync_all()?;
        staged.persist(dest).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic() {
        assert_eq!(
            SynthesisCache::key("baidu-tts", "你好"),
            SynthesisCache::key("baidu-tts", "你好")
        );
    }

    #[test]
    fn test_key_depends_on_phrase_and_slug() {
        let a = SynthesisCache::key("baidu-tts", "hello");
        assert_ne!(a, SynthesisCache::key("baidu-tts", "hello!"));
        assert_ne!(a, SynthesisCache::key("other-tts", "hello"));
        // The separator keeps slug/phrase boundaries distinct
        assert_ne!(
            SynthesisCache::key("ab", "c").digest(),
            SynthesisCache::key("a", "bc").digest()
        );
    }

    #[test]
    fn test_key_file_name() {
        let cache = SynthesisCache::new("/cache", "mp3");
        let key = SynthesisCache::key("baidu-tts", "hi");
        let path = cache.path_for(&key);
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("baidu-tts-"));
        assert!(name.ends_with(".mp3"));
        assert_eq!(key.digest().len(), 64);
    }

    #[test]
    fn test_store_moves_file() {
        let scratch = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let cache = SynthesisCache::new(dir.path().join("audio"), "mp3");
        let key = SynthesisCache::key("baidu-tts", "hi");
        assert!(cache.lookup(&key).is_none());

        let audio = RenderedAudio::write_new(scratch.path(), b"frames").unwrap();
        let scratch_path = audio.path().to_path_buf();
        let stored = cache.store(&key, audio).unwrap();

        assert!(!scratch_path.exists());
        assert_eq!(cache.lookup(&key), Some(stored.clone()));
        assert_eq!(fs::read(stored).unwrap(), b"frames");
    }

    #[test]
    fn test_store_overwrites_existing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SynthesisCache::new(dir.path(), "mp3");
        let key = SynthesisCache::key("baidu-tts", "hi");

        cache
            .store(&key, RenderedAudio::write_new(dir.path(), b"one").unwrap())
            .unwrap();
        let path = cache
            .store(&key, RenderedAudio::write_new(dir.path(), b"two").unwrap())
            .unwrap();

        assert_eq!(fs::read(path).unwrap(), b"two");
    }
}
