//! Browse hierarchy and recording resolution
//!
//! Years -> shows -> recordings -> tracks. Catalog data comes from the
//! [`MemoryCatalog`], track listings from a [`TrackFetcher`], and every
//! recording touched passes through the [`RecordingCache`] so a later
//! queue build does not hit the network again.

use async_trait::async_trait;
use std::sync::Arc;
use taper_core::{
    MediaId, MediaItem, Recording, RecordingStore, Result, TaperError, Track,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::archive::TrackFetcher;
use crate::cache::RecordingCache;
use crate::catalog::MemoryCatalog;

pub struct MusicLoader {
    catalog: MemoryCatalog,
    fetcher: Arc<dyn TrackFetcher>,
    cache: Mutex<RecordingCache>,
}

impl MusicLoader {
    pub fn new(
        catalog: MemoryCatalog,
        fetcher: Arc<dyn TrackFetcher>,
        cache_capacity: usize,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            cache: Mutex::new(RecordingCache::new(cache_capacity)),
        }
    }

    pub fn catalog(&self) -> &MemoryCatalog {
        &self.catalog
    }

    /// Children of a browsable media id
    ///
    /// Track ids have no children and yield an empty list.
    pub async fn children(&self, parent_id: &str) -> Result<Vec<MediaItem>> {
        let parent = MediaId::parse(parent_id)?;
        debug!(parent = %parent_id, "Loading children");

        let items: Vec<MediaItem> = match parent {
            MediaId::Root | MediaId::Years => self
                .catalog
                .years()
                .iter()
                .map(MediaItem::for_year)
                .collect(),
            MediaId::ShowsByYear { year } => self
                .catalog
                .shows_by_year(&year)
                .iter()
                .map(MediaItem::for_show)
                .collect(),
            MediaId::Show { id } => {
                let recordings = self.catalog.recordings_for_show(id);
                let items: Vec<MediaItem> =
                    recordings.iter().map(MediaItem::for_recording).collect();

                let mut cache = self.cache.lock().await;
                for recording in recordings {
                    cache.insert(recording);
                }
                items
            }
            MediaId::Recording { identifier } => self
                .recording_with_tracks(&identifier)
                .await?
                .tracks
                .iter()
                .map(MediaItem::for_track)
                .collect(),
            MediaId::Track { .. } => Vec::new(),
        };

        Ok(items)
    }

    /// Recording with its track list, fetching tracks when none are known
    pub async fn recording_with_tracks(&self, identifier: &str) -> Result<Recording> {
        let cached = self.cache.lock().await.get(identifier);
        let mut recording = match cached {
            Some(recording) => recording,
            None => self
                .catalog
                .recording(identifier)
                .cloned()
                .ok_or_else(|| TaperError::not_found("Recording", identifier))?,
        };

        if !recording.has_tracks() {
            let tracks = self.fetcher.fetch_tracks(identifier).await?;
            if tracks.is_empty() {
                warn!(identifier, "Archive listed no MP3 tracks for recording");
            }
            recording.set_tracks(tracks);
        }

        self.cache.lock().await.insert(recording.clone());
        Ok(recording)
    }

    /// Recording a playable or recording media id belongs to
    pub async fn resolve_media_id(&self, media_id: &str) -> Result<Recording> {
        let parsed = MediaId::parse(media_id)?;
        let identifier = parsed
            .recording_identifier()
            .ok_or_else(|| TaperError::InvalidMediaId(media_id.to_string()))?;
        self.recording_with_tracks(identifier).await
    }

    /// Tracks of the recording `track_media_id` belongs to, from the cache only
    pub async fn tracks_for_queue(&self, track_media_id: &str) -> Vec<Track> {
        let identifier = MediaId::parse(track_media_id)
            .ok()
            .and_then(|id| id.recording_identifier().map(str::to_string));
        let Some(identifier) = identifier else {
            return Vec::new();
        };

        match self.cache.lock().await.get(&identifier) {
            Some(recording) => recording.tracks,
            None => {
                warn!(media_id = track_media_id, "No cached recording for queue");
                Vec::new()
            }
        }
    }

    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
        info!("Recording cache cleared");
    }

    pub async fn cached_recordings(&self) -> usize {
        self.cache.lock().await.len()
    }
}

#[async_trait]
impl RecordingStore for MusicLoader {
    async fn resolve_media_id(&self, media_id: &str) -> Result<Recording> {
        MusicLoader::resolve_media_id(self, media_id).await
    }

    async fn children(&self, parent_id: &str) -> Result<Vec<MediaItem>> {
        MusicLoader::children(self, parent_id).await
    }
}

impl std::fmt::Debug for MusicLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MusicLoader")
            .field("shows", &self.catalog.show_count())
            .field("recordings", &self.catalog.recording_count())
            .finish_non_exhaustive()
    }
}
