//! ICS feed configuration.

use std::time::Duration;
use url::Url;

/// Configuration for the ICS feed source.
#[derive(Debug, Clone)]
pub struct IcsFeedConfig {
    /// Location of the feed. `webcal://` URLs are fetched over HTTPS.
    pub url: Url,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl IcsFeedConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a new feed configuration for the given URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(url: impl AsRef<str>) -> Result<Self, url::ParseError> {
        let raw = url.as_ref().trim();
        let parsed = match raw.strip_prefix("webcal://") {
            Some(rest) => Url::parse(&format!("https://{}", rest))?,
            None => Url::parse(raw)?,
        };
        Ok(Self {
            url: parsed,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("icsbridge/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the feed URL as a string.
    pub fn url_str(&self) -> &str {
        self.url.as_str()
    }
}
