/// Core error types for Taper
use thiserror::Error;

/// Result type alias using `TaperError`
pub type Result<T> = std::result::Result<T, TaperError>;

/// Core error type for Taper
#[derive(Error, Debug)]
pub enum TaperError {
    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A media id that matches none of the known shapes
    #[error("Invalid media id: {0}")]
    InvalidMediaId(String),

    /// Remote catalog could not be reached or answered with an error
    #[error("Network error: {0}")]
    Network(String),

    /// Remote payload did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TaperError {
    /// Shorthand for a `NotFound` error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}
