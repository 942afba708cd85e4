//! Access tokens for network engines
//!
//! Tokens come from an OAuth2 client-credentials exchange and are persisted
//! as a small versioned record:
//!
//! ```text
//! # vsay credential v1 LMFYhLdXSSthxCNLR7uxFszQ
//! 2026-10-19T08:30:00+00:00
//! 24.6c5e1ff107f0e8bcef8c46d3424a0e78.2592000.1485516651.282335-8574074
//! ```
//!
//! The header names the client id the token was issued to; a token is only
//! reused for that client. The legacy form without the header line
//! (timestamp line, token line) is also read and accepted for any client.
//! Only the first record in the file is authoritative.

use crate::{Result, VsayError};
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use log::{debug, error, info, warn};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Tokens are refreshed after this many days (providers grant about a month)
pub const TOKEN_LIFETIME_DAYS: i64 = 29;

const RECORD_HEADER: &str = "# vsay credential v1";

/// Persisted token and the time it was issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    /// API key the token was issued to, unknown for legacy records
    pub client_id: Option<String>,
}

impl CredentialRecord {
    pub fn new(token: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            issued_at,
            client_id: None,
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Whether the token belongs to `api_key`
    pub fn is_for(&self, api_key: &str) -> bool {
        self.client_id.as_deref().map_or(true, |id| id == api_key)
    }

    /// Whether the token may still be used at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now - self.issued_at < Duration::days(TOKEN_LIFETIME_DAYS)
    }

    /// Parse the first record of a credential file
    pub fn parse(text: &str) -> Option<Self> {
        let lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

        let mut client_id = None;
        let mut fields = Vec::with_capacity(2);
        for line in lines {
            if let Some(rest) = line.strip_prefix(RECORD_HEADER) {
                if fields.is_empty() {
                    client_id = Some(rest.trim()).filter(|id| !id.is_empty());
                }
            } else if !line.starts_with('#') {
                fields.push(line);
                if fields.len() == 2 {
                    break;
                }
            }
        }

        let [timestamp, token] = fields.as_slice() else {
            return None;
        };
        let mut record = Self::new(*token, parse_timestamp(timestamp)?);
        record.client_id = client_id.map(str::to_string);
        Some(record)
    }

    /// Serialized file contents
    pub fn to_file_string(&self) -> String {
        let header = match &self.client_id {
            Some(id) => format!("{} {}", RECORD_HEADER, id),
            None => RECORD_HEADER.to_string(),
        };
        format!("{}\n{}\n{}\n", header, self.issued_at.to_rfc3339(), self.token)
    }
}

/// RFC 3339, or a naive local `YYYY-MM-DD HH:MM:SS[.ffffff]` timestamp
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Body of the token endpoint's response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Acquires, persists and refreshes an access token
///
/// Records are tagged with the API key they were issued to, so a manager
/// asked for another client's token performs a fresh exchange.
pub struct TokenManager {
    /// Credential record location
    record_path: PathBuf,

    /// OAuth token endpoint
    token_url: String,

    client: Client,

    /// Last record read or issued by this manager
    cached: Option<CredentialRecord>,
}

impl TokenManager {
    pub fn new(record_path: impl Into<PathBuf>, token_url: &str, client: Client) -> Self {
        Self {
            record_path: record_path.into(),
            token_url: token_url.to_string(),
            client,
            cached: None,
        }
    }

    /// Current token, exchanging credentials only when none is valid
    pub fn get_token(&mut self, api_key: &str, secret_key: &str) -> Result<String> {
        self.get_token_at(api_key, secret_key, Utc::now())
    }

    /// [`get_token`](Self::get_token) evaluated at an explicit time
    pub fn get_token_at(
        &mut self,
        api_key: &str,
        secret_key: &str,
        now: DateTime<Utc>,
    ) -> Result<String> {
        if let Some(record) = self
            .cached
            .as_ref()
            .filter(|r| r.is_valid_at(now) && r.is_for(api_key))
        {
            return Ok(record.token.clone());
        }

        if let Some(record) = self.read_record() {
            if !record.is_for(api_key) {
                info!("Stored token belongs to another client, refreshing");
            } else if record.is_valid_at(now) {
                debug!("Reusing token issued at {}", record.issued_at);
                let token = record.token.clone();
                self.cached = Some(record);
                return Ok(token);
            } else {
                info!("Token issued at {} has expired, refreshing", record.issued_at);
            }
        }

        let token = self.exchange(api_key, secret_key)?;
        let record = CredentialRecord::new(token.clone(), now).with_client_id(api_key);
        if let Err(e) = self.write_record(&record) {
            warn!(
                "Failed to persist token to {}: {}",
                self.record_path.display(),
                e
            );
        }
        self.cached = Some(record);
        Ok(token)
    }

    /// Read the persisted record, if any
    pub fn read_record(&self) -> Option<CredentialRecord> {
        let text = fs::read_to_string(&self.record_path).ok()?;
        let record = CredentialRecord::parse(&text);
        if record.is_none() {
            warn!(
                "Ignoring malformed credential file {}",
                self.record_path.display()
            );
        }
        record
    }

    /// Replace the persisted record atomically
    pub fn write_record(&self, record: &CredentialRecord) -> Result<()> {
        let dir = match self.record_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(record.to_file_string().as_bytes())?;
        staged.as_file().sync_all()?;
        staged
            .persist(&self.record_path)
            .map_err(|e| VsayError::Io(e.error))?;
        debug!("Saved token to {}", self.record_path.display());
        Ok(())
    }

    /// Client-credentials exchange against the token endpoint
    fn exchange(&self, api_key: &str, secret_key: &str) -> Result<String> {
        debug!("Requesting token from {}", self.token_url);

        let response = self
            .client
            .get(&self.token_url)
            .query(&[
                ("grant_type", "client_credentials"),
                ("client_id", api_key),
                ("client_secret", secret_key),
            ])
            .send()
            .map_err(|e| {
                error!("Token request failed: {}", e);
                VsayError::Auth(format!("token request failed: {}", e))
            })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| VsayError::Auth(format!("failed to read token response: {}", e)))?;

        if !status.is_success() {
            error!("Token request failed with response: {} {}", status, body);
            return Err(VsayError::Auth(format!("token endpoint returned {}: {}", status, body)));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Malformed token response: {}", body);
            VsayError::Auth(format!("malformed token response: {}", e))
        })?;

        if let Some(err) = parsed.error {
            let description = parsed.error_description.unwrap_or_default();
            error!("Token request rejected: {} {}", err, description);
            return Err(VsayError::Auth(format!("{}: {}", err, description)));
        }

        parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| VsayError::Auth("token response has no access_token".to_string()))
    }
}
