//! Sync error types.

use icsbridge_providers::ProviderError;
use thiserror::Error;

/// Errors that fail a whole sync cycle.
///
/// Per-item failures never surface here; they are logged and skipped by the
/// applier.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The feed could not be fetched or parsed.
    #[error("feed fetch failed: {0}")]
    Feed(#[source] ProviderError),

    /// The existing mirrors could not be listed.
    #[error("mirror inventory failed: {0}")]
    Inventory(#[source] ProviderError),

    /// The target calendar rejected our credentials.
    #[error("target calendar authentication failed: {0}")]
    Authentication(#[source] ProviderError),

    /// Another cycle is already in progress.
    #[error("a sync cycle is already running")]
    AlreadyRunning,
}

impl SyncError {
    /// Returns true if the cycle was rejected rather than attempted.
    pub fn is_already_running(&self) -> bool {
        matches!(self, Self::AlreadyRunning)
    }

    /// Returns the underlying provider error, if any.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::Feed(e) | Self::Inventory(e) | Self::Authentication(e) => Some(e),
            Self::AlreadyRunning => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let err = SyncError::Feed(ProviderError::feed("HTTP 503").with_provider("ics"));
        assert_eq!(err.to_string(), "feed fetch failed: [ics] feed_error: HTTP 503");
        assert!(!err.is_already_running());
        assert!(err.provider_error().is_some());

        let err = SyncError::AlreadyRunning;
        assert_eq!(err.to_string(), "a sync cycle is already running");
        assert!(err.provider_error().is_none());
    }
}
