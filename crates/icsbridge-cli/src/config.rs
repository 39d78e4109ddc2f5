//! Client configuration.
//!
//! Settings are read from `~/.config/icsbridge/config.toml` by default:
//!
//! ```toml
//! [feed]
//! url = "https://school.example/calendar.ics"
//! source_title = "School ICS"
//!
//! [target]
//! calendar_id = "primary"
//! token_path = "/var/lib/icsbridge/token.json"
//!
//! [sync]
//! lookahead_days = 30
//! title_prefix = "[School]"
//!
//! [schedule]
//! poll_seconds = 900
//! ```
//!
//! Environment variables override the file: `ICS_URL`,
//! `GOOGLE_CALENDAR_ID`, `SYNC_LOOKAHEAD_DAYS`, `SYNC_LOOKBACK_DAYS`,
//! `POLL_SECONDS`, `SUMMARY_PREFIX` and `BUSY_BLOCKERS`.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use icsbridge_providers::MirrorSource;
use icsbridge_providers::google::GoogleConfig;
use icsbridge_providers::ics::IcsFeedConfig;
use icsbridge_server::SchedulerConfig;
use icsbridge_sync::{MirrorSettings, SyncConfig};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Configuration for the icsbridge binary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Feed settings.
    pub feed: FeedSettings,

    /// Target calendar settings.
    pub target: TargetSettings,

    /// Mirroring settings.
    pub sync: SyncSettings,

    /// Scheduler settings.
    pub schedule: ScheduleSettings,
}

/// Where events are read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// ICS feed URL; `webcal://` is accepted.
    pub url: Option<String>,

    /// Title of the `source` link attached to each mirror.
    pub source_title: String,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            url: None,
            source_title: "ICS feed".to_string(),
        }
    }
}

/// Where mirrors are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSettings {
    /// Google calendar identifier.
    pub calendar_id: String,

    /// OAuth token file; defaults to the data directory.
    pub token_path: Option<PathBuf>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TargetSettings {
    fn default() -> Self {
        Self {
            calendar_id: GoogleConfig::DEFAULT_CALENDAR_ID.to_string(),
            token_path: None,
            timeout_secs: GoogleConfig::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Window and rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub lookback_days: u32,
    pub lookahead_days: u32,
    pub title_prefix: String,
    pub busy_blockers: bool,
    pub fallback_title: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            lookback_days: SyncConfig::DEFAULT_LOOKBACK_DAYS,
            lookahead_days: SyncConfig::DEFAULT_LOOKAHEAD_DAYS,
            title_prefix: String::new(),
            busy_blockers: false,
            fallback_title: MirrorSettings::DEFAULT_FALLBACK_TITLE.to_string(),
        }
    }
}

/// Scheduler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    /// Seconds between the end of one cycle and the start of the next.
    pub poll_seconds: u64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            poll_seconds: SchedulerConfig::DEFAULT_POLL_INTERVAL.as_secs(),
        }
    }
}

impl ClientConfig {
    /// Loads the default configuration file, if any, then applies the
    /// environment.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::read(&path)?
        } else {
            Self::default()
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Loads a specific configuration file, then applies the environment.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let mut config = Self::read(path)?;
        config.apply_env()?;
        Ok(config)
    }

    fn read(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ClientError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("icsbridge")
    }

    /// Overrides settings from the process environment.
    pub fn apply_env(&mut self) -> ClientResult<()> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Overrides settings from `lookup`, which maps a variable name to its
    /// value.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ClientResult<()> {
        if let Some(url) = lookup("ICS_URL") {
            self.feed.url = Some(url);
        }
        if let Some(calendar_id) = lookup("GOOGLE_CALENDAR_ID") {
            self.target.calendar_id = calendar_id;
        }
        if let Some(days) = lookup("SYNC_LOOKAHEAD_DAYS") {
            self.sync.lookahead_days = parse_var("SYNC_LOOKAHEAD_DAYS", &days)?;
        }
        if let Some(days) = lookup("SYNC_LOOKBACK_DAYS") {
            self.sync.lookback_days = parse_var("SYNC_LOOKBACK_DAYS", &days)?;
        }
        if let Some(seconds) = lookup("POLL_SECONDS") {
            self.schedule.poll_seconds = parse_var("POLL_SECONDS", &seconds)?;
        }
        if let Some(prefix) = lookup("SUMMARY_PREFIX") {
            self.sync.title_prefix = prefix.trim().to_string();
        }
        if let Some(flag) = lookup("BUSY_BLOCKERS") {
            self.sync.busy_blockers = flag.trim().eq_ignore_ascii_case("true");
        }
        Ok(())
    }

    /// Checks the settings a sync needs.
    pub fn validate(&self) -> ClientResult<()> {
        let raw = self
            .feed
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                ClientError::Config("feed url is not set (use [feed] url or ICS_URL)".to_string())
            })?;
        let url = self.feed_config_for(raw)?.url;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "feed url must use http, https or webcal: {}",
                raw
            )));
        }
        if url.host_str().is_none() {
            return Err(ClientError::Config(format!("feed url has no host: {}", raw)));
        }
        if self.target.calendar_id.trim().is_empty() {
            return Err(ClientError::Config("calendar_id must not be empty".to_string()));
        }
        for (name, days) in [
            ("lookback_days", self.sync.lookback_days),
            ("lookahead_days", self.sync.lookahead_days),
        ] {
            if days > SyncConfig::MAX_WINDOW_DAYS {
                return Err(ClientError::Config(format!(
                    "{} must be at most {} (got {})",
                    name,
                    SyncConfig::MAX_WINDOW_DAYS,
                    days
                )));
            }
        }
        if self.schedule.poll_seconds == 0 {
            return Err(ClientError::Config("poll_seconds must be greater than zero".to_string()));
        }
        Ok(())
    }

    /// Builds the feed source configuration.
    pub fn feed_config(&self) -> ClientResult<IcsFeedConfig> {
        let raw = self
            .feed
            .url
            .as_deref()
            .ok_or_else(|| ClientError::Config("feed url is not set".to_string()))?;
        self.feed_config_for(raw)
    }

    fn feed_config_for(&self, raw: &str) -> ClientResult<IcsFeedConfig> {
        IcsFeedConfig::new(raw)
            .map(|config| config.with_timeout(Duration::from_secs(self.target.timeout_secs)))
            .map_err(|e| ClientError::Config(format!("invalid feed url '{}': {}", raw, e)))
    }

    /// Builds the Google Calendar client configuration.
    pub fn google_config(&self) -> GoogleConfig {
        let mut config = GoogleConfig::new(&self.target.calendar_id)
            .with_timeout(Duration::from_secs(self.target.timeout_secs));
        if let Some(ref path) = self.target.token_path {
            config = config.with_token_path(path);
        }
        config
    }

    /// Builds the engine configuration.
    pub fn sync_config(&self) -> SyncConfig {
        let source = self.feed.url.as_deref().and_then(|raw| {
            // Only a well-formed link is attached; validation reports the rest.
            Url::parse(raw).ok().map(|_| MirrorSource {
                title: self.feed.source_title.clone(),
                url: raw.to_string(),
            })
        });
        SyncConfig::new(&self.target.calendar_id)
            .with_window_days(self.sync.lookback_days, self.sync.lookahead_days)
            .with_mirror(MirrorSettings {
                title_prefix: self.sync.title_prefix.clone(),
                busy_blockers: self.sync.busy_blockers,
                fallback_title: self.sync.fallback_title.clone(),
                source,
            })
    }

    /// Builds the scheduler configuration.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::new(Duration::from_secs(self.schedule.poll_seconds))
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> ClientResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ClientError::Config(format!("invalid {} '{}': {}", name, value, e)))
}
