//! Error types for the deployment notifier

use thiserror::Error;

/// Main error type for the deployment notifier
#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Credential error: {0}")]
    CredentialError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Remote error: {0}")]
    RemoteError(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("{0}")]
    NotifyFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NotifierError {
    /// Whether this error must fail the enclosing build outright
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            NotifierError::ConfigError(_) | NotifierError::NotifyFailed(_)
        )
    }
}

// reqwest errors include the request URL, never its headers
impl From<reqwest::Error> for NotifierError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            NotifierError::ProtocolError(err.to_string())
        } else {
            NotifierError::RemoteError(err.to_string())
        }
    }
}
