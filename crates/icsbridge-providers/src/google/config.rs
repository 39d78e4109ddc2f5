//! Google Calendar target configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Base URL for Google Calendar API v3.
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Configuration for the Google Calendar target.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Calendar that receives the mirrors. Defaults to `"primary"`.
    pub calendar_id: String,

    /// Path of the JSON file holding the OAuth access token.
    ///
    /// Defaults to `~/.local/share/icsbridge/token.json`.
    pub token_path: PathBuf,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string for API requests.
    pub user_agent: String,
}

impl GoogleConfig {
    /// Default calendar identifier.
    pub const DEFAULT_CALENDAR_ID: &'static str = "primary";

    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a configuration targeting `calendar_id`.
    pub fn new(calendar_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            token_path: Self::default_token_path(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("icsbridge/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Returns the default token file location.
    pub fn default_token_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("icsbridge")
            .join("token.json")
    }

    /// Sets the token file path.
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the events collection URL of the target calendar.
    pub fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            CALENDAR_API_BASE,
            urlencoding::encode(&self.calendar_id)
        )
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CALENDAR_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = GoogleConfig::default();
        assert_eq!(config.calendar_id, "primary");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.token_path.ends_with("icsbridge/token.json"));
    }

    #[test]
    fn events_url_encodes_calendar_id() {
        let config = GoogleConfig::new("family#school@group.calendar.google.com");
        assert_eq!(
            config.events_url(),
            "https://www.googleapis.com/calendar/v3/calendars/family%23school%40group.calendar.google.com/events"
        );
    }
}
