//! Error types for memobridge.

use thiserror::Error;

/// Result type alias using memobridge's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for memobridge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced note, tag, resource or session is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// The remote service answered with a non-success status
    #[error("Remote rejected request ({status}): {message}")]
    RemoteRejected { status: u16, message: String },

    /// Transport-level failure (connect, timeout, broken stream)
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// Credential string does not have the expected shape
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// Annotation ranges do not match the text they annotate
    #[error("Parse inconsistency: {0}")]
    ParseInconsistency(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a `RemoteRejected` from a status code and response text.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Error::RemoteRejected {
            status,
            message: message.into(),
        }
    }

    /// HTTP status carried by a rejection, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RemoteRejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error originated on the remote side of the wire.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::RemoteRejected { .. } | Error::RemoteUnavailable(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::RemoteUnavailable(e.to_string())
    }
}
