/// Core traits for Taper
use crate::error::Result;
use crate::types::{MediaItem, Recording};
use async_trait::async_trait;

/// Source of recordings and the browse hierarchy
///
/// The playback service only talks to the catalog through this trait.
/// Implementations may hit a local store, a cache or the network, so
/// calls are async and must not run on the playback context.
#[async_trait]
pub trait RecordingStore: Send + Sync {
    /// Resolve a playable or recording media id to the recording it
    /// belongs to, with its tracks ordered by track number.
    ///
    /// # Errors
    /// `InvalidMediaId` for ids that name no recording, `NotFound` when
    /// the recording is unknown.
    async fn resolve_media_id(&self, media_id: &str) -> Result<Recording>;

    /// Children of a browsable media id
    async fn children(&self, parent_id: &str) -> Result<Vec<MediaItem>>;
}
