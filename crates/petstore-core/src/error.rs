//! Error types for the Petstore client.
//!
//! Every failure the library can produce is a [`PetstoreError`]. Views catch
//! these at their boundary and turn them into display strings; nothing here is
//! meant to terminate the application except [`PetstoreError::Config`] at
//! startup.

use crate::cancel::CancelledError;
use crate::views::FormErrors;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Main error type for the Petstore client.
///
/// `Clone` so that one in-flight request's failure can be handed to every
/// caller waiting on it; underlying sources are kept behind `Arc` for that.
#[derive(Debug, Clone, Error)]
pub enum PetstoreError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    /// Non-2xx response. `message` is already normalized from the body.
    #[error("{message}")]
    Api { status: u16, message: String },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<Arc<serde_json::Error>>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<Arc<std::io::Error>>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Sign-up is not available when fixed credentials are configured")]
    SignupUnavailable,

    // Validation errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid pet form: {0}")]
    Form(FormErrors),

    #[error("Operation was cancelled")]
    Cancelled,
}

/// Result type alias for Petstore operations.
pub type Result<T> = std::result::Result<T, PetstoreError>;

impl From<std::io::Error> for PetstoreError {
    fn from(err: std::io::Error) -> Self {
        PetstoreError::Io {
            message: err.to_string(),
            path: None,
            source: Some(Arc::new(err)),
        }
    }
}

impl From<serde_json::Error> for PetstoreError {
    fn from(err: serde_json::Error) -> Self {
        PetstoreError::Json {
            message: err.to_string(),
            source: Some(Arc::new(err)),
        }
    }
}

impl From<reqwest::Error> for PetstoreError {
    fn from(err: reqwest::Error) -> Self {
        PetstoreError::Network {
            message: err.to_string(),
            cause: std::error::Error::source(&err).map(|s| s.to_string()),
        }
    }
}

impl From<CancelledError> for PetstoreError {
    fn from(_: CancelledError) -> Self {
        PetstoreError::Cancelled
    }
}

impl PetstoreError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        PetstoreError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(Arc::new(err)),
        }
    }

    /// HTTP status of a failed remote call, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            PetstoreError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error came from talking to the remote service.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            PetstoreError::Network { .. } | PetstoreError::Api { .. } | PetstoreError::Json { .. }
        )
    }
}
