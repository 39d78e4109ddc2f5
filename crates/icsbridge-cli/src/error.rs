//! Client error types.

use std::fmt;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// Feed or calendar client could not be built.
    Provider(String),
    /// A sync cycle failed.
    Sync(String),
    /// The scheduler could not be started or stopped.
    Server(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Provider(msg) => write!(f, "provider error: {}", msg),
            Self::Sync(msg) => write!(f, "sync failed: {}", msg),
            Self::Server(msg) => write!(f, "scheduler error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<icsbridge_providers::ProviderError> for ClientError {
    fn from(err: icsbridge_providers::ProviderError) -> Self {
        Self::Provider(err.to_string())
    }
}

impl From<icsbridge_sync::SyncError> for ClientError {
    fn from(err: icsbridge_sync::SyncError) -> Self {
        Self::Sync(err.to_string())
    }
}

impl From<icsbridge_server::ServerError> for ClientError {
    fn from(err: icsbridge_server::ServerError) -> Self {
        Self::Server(err.to_string())
    }
}
