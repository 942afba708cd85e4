//! Configuration management
//!
//! The profile is an INI file (~/.vsay.cfg). The `[speech]` section holds
//! pipeline settings; every other section holds the settings of one engine
//! and is handed to that engine's constructor as a key/value mapping.

use crate::{Result, VsayError};
use ini::Ini;
use log::{debug, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Engine used when the profile does not name one
pub const DEFAULT_ENGINE: &str = "log-tts";

/// Player executable used when the profile does not name one
pub const DEFAULT_PLAYER: &str = "play";

/// Network timeout used when the profile does not set one
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Application configuration
pub struct Config {
    /// INI configuration storage
    ini: Ini,

    /// Config file path, `None` for in-memory configs
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from ~/.vsay.cfg, creating a default file if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path, creating it if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(path)
                .map_err(|e| VsayError::IniParse(format!("Failed to load config: {}", e)))?
        } else {
            info!("Config file not found, creating default at {:?}", path);
            let default = Self::default_config();
            default
                .write_to_file(path)
                .map_err(|e| VsayError::IniParse(format!("Failed to write config: {}", e)))?;
            default
        };

        Ok(Self {
            ini,
            path: Some(path.to_path_buf()),
        })
    }

    /// Parse configuration from INI text
    pub fn from_ini_str(text: &str) -> Result<Self> {
        let ini = Ini::load_from_str(text)
            .map_err(|e| VsayError::IniParse(format!("Failed to parse config: {}", e)))?;
        Ok(Self { ini, path: None })
    }

    /// Save configuration to the file it was loaded from
    pub fn save(&self) -> Result<()> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| VsayError::Config("Config has no backing file".to_string()))?;
        debug!("Saving config to {:?}", path);
        self.ini
            .write_to_file(path)
            .map_err(|e| VsayError::Config(format!("Failed to save config: {}", e)))
    }

    /// Get config file path (~/.vsay.cfg)
    fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".vsay.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create default configuration
    fn default_config() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("speech"))
            .set("engine", DEFAULT_ENGINE)
            .set("player", DEFAULT_PLAYER)
            .set("timeout_secs", DEFAULT_TIMEOUT_SECS.to_string());

        ini.with_section(Some("baidu_yuyin"))
            .set("api_key", "")
            .set("secret_key", "")
            .set("per", "0");

        ini
    }

    /// Get a string value from config
    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .unwrap_or(default)
            .to_string()
    }

    /// Get an integer value from config
    pub fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Set a value in config
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
    }

    /// Key/value settings of one engine section
    ///
    /// A missing section yields an empty mapping; engines decide which keys
    /// they require.
    pub fn section(&self, name: &str) -> EngineSettings {
        let values = self
            .ini
            .section(Some(name))
            .map(|s| {
                s.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            })
            .unwrap_or_default();
        EngineSettings::new(name, values)
    }

    /// Slug of the engine to speak with
    pub fn engine(&self) -> String {
        self.get_string("speech", "engine", DEFAULT_ENGINE)
    }

    /// Directory holding cached audio
    pub fn cache_dir(&self) -> PathBuf {
        match self.ini.get_from(Some("speech"), "cache_dir") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(crate::APP_NAME),
        }
    }

    /// Directory for freshly rendered audio before it is played
    pub fn scratch_dir(&self) -> PathBuf {
        self.ini
            .get_from(Some("speech"), "scratch_dir")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Audio player executable
    pub fn player(&self) -> String {
        self.get_string("speech", "player", DEFAULT_PLAYER)
    }

    /// Bound on every network call
    pub fn timeout(&self) -> Duration {
        let secs = self.get_int("speech", "timeout_secs", DEFAULT_TIMEOUT_SECS as i64);
        Duration::from_secs(secs.max(1) as u64)
    }

    /// File holding the persisted access token
    pub fn credential_file(&self) -> PathBuf {
        self.ini
            .get_from(Some("speech"), "credential_file")
            .map(PathBuf::from)
            .unwrap_or_else(|| self.cache_dir().join("baidu_token.cfg"))
    }
}

/// Settings mapping handed to an engine constructor
#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    section: String,
    values: HashMap<String, String>,
}

impl EngineSettings {
    pub fn new(section: &str, values: HashMap<String, String>) -> Self {
        Self {
            section: section.to_string(),
            values,
        }
    }

    /// Optional value; blank values count as absent
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Required value, `Config` error when absent
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| {
            VsayError::Config(format!(
                "Missing required key '{}' in section [{}]",
                key, self.section
            ))
        })
    }

    /// Optional typed value, `Config` error when present but unparsable
    pub fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|_| {
                VsayError::Config(format!(
                    "Invalid value '{}' for key '{}' in section [{}]",
                    raw, key, self.section
                ))
            }),
        }
    }
}
