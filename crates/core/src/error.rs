//! Error types for kbrag.
//!
//! One enum covers every failure the client can surface: local configuration
//! problems, invalid query arguments, failures reported by the remote
//! retrieve-and-generate service, and (de)serialization errors.

use thiserror::Error;

/// Unified error type for kbrag.
///
/// All fallible functions return `Result<T, AppError>`. Messages coming back
/// from the remote service are kept verbatim.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required identifier is missing or malformed.
    ///
    /// Raised locally before any network call, or when the remote service
    /// rejects the request with a validation failure.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Network, authorization, throttling or server-side failure.
    ///
    /// `status` is `None` when no HTTP response was received at all
    /// (connect failure, timeout).
    #[error("Remote service error{}: {message}", status_suffix(.status))]
    RemoteService {
        status: Option<u16>,
        message: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" ({})", code)).unwrap_or_default()
}

impl AppError {
    /// Build a `RemoteService` error from an HTTP status and response body.
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        AppError::RemoteService {
            status,
            message: message.into(),
        }
    }

    /// Whether this failure belongs to the throttling / transient class.
    ///
    /// Only these are eligible for a retry; validation and authorization
    /// failures never are.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::RemoteService { status: None, .. } => true,
            AppError::RemoteService {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
