//! Access token loading.
//!
//! Token acquisition and refresh happen outside icsbridge. The token file is
//! re-read before every cycle so an external refresher can rotate it.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

/// An OAuth access token read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The bearer token.
    pub token: String,
    /// When the token expires, if the file says so.
    pub expiry: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Returns true if the token is known to be expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_some_and(|expiry| now >= expiry)
    }
}

/// On-disk layout. Accepts the Google authorized-user format
/// (`token`) as well as a raw OAuth response (`access_token`).
#[derive(Debug, Deserialize)]
struct TokenFileContent {
    #[serde(alias = "access_token")]
    token: Option<String>,
    expiry: Option<String>,
}

/// A JSON token file.
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    /// Creates a token file handle for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current access token.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file is missing or malformed and
    /// an authentication error if the token has expired.
    pub fn load(&self) -> ProviderResult<AccessToken> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            ProviderError::configuration(format!(
                "failed to read token file {}: {}",
                self.path.display(),
                e
            ))
            .with_source(e)
        })?;

        let token = parse_token(&content)?;
        if token.is_expired_at(Utc::now()) {
            return Err(ProviderError::authentication(format!(
                "access token in {} expired",
                self.path.display()
            )));
        }

        debug!(path = %self.path.display(), "loaded access token");
        Ok(token)
    }
}

fn parse_token(content: &str) -> ProviderResult<AccessToken> {
    let file: TokenFileContent = serde_json::from_str(content).map_err(|e| {
        ProviderError::configuration(format!("failed to parse token file: {}", e))
    })?;

    let token = file
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ProviderError::configuration("token file has no access token"))?;

    Ok(AccessToken {
        token,
        expiry: file.expiry.as_deref().and_then(parse_expiry),
    })
}

/// Parses an expiry timestamp, with or without an offset.
fn parse_expiry(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}
