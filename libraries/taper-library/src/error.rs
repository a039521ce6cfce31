//! Error types for the recording library.

use taper_core::TaperError;
use thiserror::Error;

/// Errors that can occur while loading catalog data or talking to the archive.
#[derive(Error, Debug)]
pub enum LibraryError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Archive answered with a non-success status
    #[error("Archive error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Archive is offline or unreachable
    #[error("Archive unreachable: {0}")]
    ServerUnreachable(String),

    /// Invalid archive base URL
    #[error("Invalid archive URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse an archive response or catalog snapshot
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl From<LibraryError> for TaperError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::ParseError(msg) => TaperError::Parse(msg),
            other => TaperError::Network(other.to_string()),
        }
    }
}

/// Result type for library operations.
pub type Result<T> = std::result::Result<T, LibraryError>;
