/// Service error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Recording library error: {0}")]
    Library(#[from] taper_library::LibraryError),

    #[error("Playback service is no longer running")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, ServiceError>;
