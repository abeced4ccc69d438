//! Error types for the tile explorer.

use thiserror::Error;

/// Result type alias using ExplorerError.
pub type ExplorerResult<T> = Result<T, ExplorerError>;

/// Primary error type for explorer operations.
#[derive(Debug, Error)]
pub enum ExplorerError {
    // === Transport Errors ===
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Server returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    // === Data Errors ===
    #[error("Unexpected response shape: {0}")]
    Decode(String),

    // === Selection Errors ===
    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Incomplete selection: {0}")]
    IncompleteSelection(String),

    // === Startup Errors ===
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExplorerError {
    /// HTTP status carried by this error, if it came from a server response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ExplorerError::Http { status, .. } => Some(*status),
            ExplorerError::NotFound(_) => Some(404),
            _ => None,
        }
    }

    /// Whether a session can carry on after this error.
    ///
    /// Only configuration problems stop the program; everything else is
    /// surfaced to the user and the session continues.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ExplorerError::Config(_))
    }
}

impl From<serde_json::Error> for ExplorerError {
    fn from(err: serde_json::Error) -> Self {
        ExplorerError::Decode(format!("JSON error: {}", err))
    }
}
