//! Error types for playback management

use thiserror::Error;

/// Playback errors
///
/// Errors travel inside engine and session events, so they are `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// Audio focus could not be acquired, the play attempt was aborted
    #[error("Audio focus request denied")]
    FocusDenied,

    /// The platform player refused the media source
    #[error("Failed to load {media_id}: {reason}")]
    MediaLoad { media_id: String, reason: String },

    /// Decode or runtime error reported by a prepared player
    #[error("Media playback error {what} ({extra})")]
    PlatformPlayer { what: i32, extra: i32 },

    /// Queue creation with zero items
    #[error("Queue is empty")]
    EmptyQueue,

    /// Queue lookup or recording resolution miss
    #[error("Not found: {0}")]
    NotFound(String),

    /// Recording store failure other than a miss
    #[error("Recording store error: {0}")]
    Store(String),
}

impl From<taper_core::TaperError> for PlaybackError {
    fn from(err: taper_core::TaperError) -> Self {
        match err {
            taper_core::TaperError::NotFound { entity, id } => {
                Self::NotFound(format!("{entity} {id}"))
            }
            taper_core::TaperError::InvalidMediaId(id) => Self::NotFound(id),
            other => Self::Store(other.to_string()),
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
