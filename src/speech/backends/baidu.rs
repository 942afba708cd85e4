//! Baidu network synthesis engine
//!
//! Authenticates with an API key / secret key pair through the
//! [`TokenManager`], then posts each sentence of the phrase to the
//! text2audio endpoint. The MP3 segments are concatenated in order into a
//! single scratch file.
//!
//! Profile section:
//!
//! ```ini
//! [baidu_yuyin]
//! api_key = LMFYhLdXSSthxCNLR7uxFszQ
//! secret_key = 14dbd10057xu7b256e537455698c0e4e
//! per = 0
//! ```

use crate::config::EngineSettings;
use crate::platform::{check_network_connection, device_id, truncate_device_id};
use crate::speech::engine::{Engine, EngineContext, RenderedAudio, SpeakOutcome};
use crate::speech::mp3::{normalize, Mp3Output};
use crate::speech::token::TokenManager;
use crate::{Result, VsayError};
use log::{debug, error};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const SLUG: &str = "baidu-tts";

/// Profile section holding the engine settings
pub const SECTION: &str = "baidu_yuyin";

const DEFAULT_TOKEN_URL: &str = "https://openapi.baidu.com/oauth/2.0/token";
const DEFAULT_TTS_URL: &str = "https://tsn.baidu.com/text2audio";
const DEFAULT_PROBE_HOST: &str = "tsn.baidu.com:443";
const DEFAULT_LANGUAGE: &str = "zh";

/// Upper bound of the reachability probe
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Sentence-ending punctuation, ASCII and full-width
static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.。;；\n]").expect("sentence regex is valid"));

/// Split text into sentences, dropping empty pieces
pub fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE_END
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Settings read from the `[baidu_yuyin]` profile section
#[derive(Debug, Clone)]
pub struct BaiduSettings {
    pub api_key: String,
    pub secret_key: String,
    /// Voice style
    pub per: u32,
    /// Language tag
    pub lan: String,
    /// Per-device identifier
    pub cuid: String,
    pub token_url: String,
    pub tts_url: String,
    /// `host:port` probed by the availability check
    pub probe_host: String,
}

impl BaiduSettings {
    /// Read settings; `api_key` and `secret_key` are required
    pub fn from_settings(settings: &EngineSettings) -> Result<Self> {
        Ok(Self {
            api_key: settings.require("api_key")?.to_string(),
            secret_key: settings.require("secret_key")?.to_string(),
            per: settings.parse_or("per", 0)?,
            lan: settings.get("lan").unwrap_or(DEFAULT_LANGUAGE).to_string(),
            cuid: settings
                .get("cuid")
                .map(truncate_device_id)
                .unwrap_or_else(device_id),
            token_url: settings
                .get("token_url")
                .unwrap_or(DEFAULT_TOKEN_URL)
                .to_string(),
            tts_url: settings.get("tts_url").unwrap_or(DEFAULT_TTS_URL).to_string(),
            probe_host: settings
                .get("probe_host")
                .unwrap_or(DEFAULT_PROBE_HOST)
                .to_string(),
        })
    }
}

/// Error payload returned instead of audio
#[derive(Debug, Deserialize)]
struct ErrorBody {
    err_no: Option<i64>,
    err_msg: Option<String>,
}

/// Engine backed by Baidu's speech synthesis service
pub struct BaiduEngine {
    settings: BaiduSettings,
    tokens: TokenManager,
    client: Client,
    output: Mp3Output,
    scratch_dir: PathBuf,
}

impl BaiduEngine {
    /// Create the engine with explicit settings
    pub fn new(settings: BaiduSettings, ctx: &EngineContext) -> Result<Self> {
        let client = Client::builder()
            .timeout(ctx.config.timeout())
            .build()
            .map_err(|e| VsayError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let tokens = TokenManager::new(
            ctx.config.credential_file(),
            &settings.token_url,
            client.clone(),
        );

        Ok(Self {
            settings,
            tokens,
            client,
            output: ctx.mp3_output(),
            scratch_dir: ctx.config.scratch_dir(),
        })
    }

    /// Create the engine from the profile's `[baidu_yuyin]` section
    pub fn from_context(ctx: &EngineContext) -> Result<Self> {
        let settings = BaiduSettings::from_settings(&ctx.config.section(SECTION))?;
        Self::new(settings, ctx)
    }

    pub fn build(ctx: &EngineContext) -> Result<Box<dyn Engine>> {
        Ok(Box::new(Self::from_context(ctx)?))
    }

    /// Availability before construction: the player must be installed and
    /// the provider reachable
    pub fn probe(ctx: &EngineContext) -> bool {
        if !ctx.player.is_installed() {
            debug!("{} unavailable: audio player not installed", SLUG);
            return false;
        }
        let settings = ctx.config.section(SECTION);
        let host = settings.get("probe_host").unwrap_or(DEFAULT_PROBE_HOST);
        check_network_connection(host, PROBE_TIMEOUT)
    }

    /// Synthesize one sentence into MP3 bytes
    fn synthesize(&self, token: &str, text: &str) -> Result<Vec<u8>> {
        let per = self.settings.per.to_string();
        let form = [
            ("tex", text),
            ("lan", self.settings.lan.as_str()),
            ("tok", token),
            ("ctp", "1"),
            ("cuid", self.settings.cuid.as_str()),
            ("per", per.as_str()),
        ];

        let response = self
            .client
            .post(&self.settings.tts_url)
            .form(&form)
            .send()
            .map_err(|e| VsayError::Synthesis(format!("request failed: {}", e)))?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("json"))
            .unwrap_or(false);
        let body = response
            .bytes()
            .map_err(|e| VsayError::Synthesis(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(VsayError::Synthesis(format!(
                "{} returned {}: {}",
                SLUG,
                status,
                String::from_utf8_lossy(&body)
            )));
        }

        // Errors come back as 2xx JSON; audio never parses as a JSON object
        if let Ok(err) = serde_json::from_slice::<ErrorBody>(&body) {
            return Err(VsayError::Synthesis(format!(
                "{} error {}: {}",
                SLUG,
                err.err_no.unwrap_or_default(),
                err.err_msg.unwrap_or_else(|| "unknown error".to_string())
            )));
        }
        if is_json {
            return Err(VsayError::Synthesis(format!(
                "{} returned a JSON body instead of audio: {}",
                SLUG,
                String::from_utf8_lossy(&body)
            )));
        }
        if body.is_empty() {
            return Err(VsayError::Synthesis(format!("{} returned no audio", SLUG)));
        }

        Ok(body.to_vec())
    }
}

impl Engine for BaiduEngine {
    fn slug(&self) -> &str {
        SLUG
    }

    fn is_available(&self) -> bool {
        self.output.player_installed()
            && check_network_connection(&self.settings.probe_host, PROBE_TIMEOUT)
    }

    fn render(&mut self, phrase: &str) -> Result<RenderedAudio> {
        let text = normalize(phrase);
        let sentences = split_sentences(&text);
        if sentences.is_empty() {
            return Err(VsayError::Synthesis(format!(
                "nothing to say in '{}'",
                phrase
            )));
        }

        let token = self
            .tokens
            .get_token(&self.settings.api_key, &self.settings.secret_key)?;

        let mut audio = Vec::new();
        for sentence in &sentences {
            debug!("Synthesizing '{}'", sentence);
            let segment = self.synthesize(&token, sentence).map_err(|e| {
                error!("{} failed for '{}': {}", SLUG, sentence, e);
                e
            })?;
            audio.extend_from_slice(&segment);
        }
        debug!(
            "Rendered {} sentence(s), {} bytes",
            sentences.len(),
            audio.len()
        );

        RenderedAudio::write_new(&self.scratch_dir, &audio)
    }

    fn speak(&mut self, phrase: &str, use_cache: bool) -> Result<SpeakOutcome> {
        let output = self.output.clone();
        output.speak(SLUG, phrase, use_cache, |p| self.render(p))
    }
}
