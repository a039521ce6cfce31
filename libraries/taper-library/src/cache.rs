use lru::LruCache;
use std::num::NonZeroUsize;
use taper_core::Recording;

/// Recently used recordings, keyed by archive identifier
///
/// Catalog rows come without tracks, archive lookups come with them. A
/// recording re-inserted without tracks keeps the ones already cached.
pub struct RecordingCache {
    entries: LruCache<String, Recording>,
}

impl RecordingCache {
    /// Create a cache holding at most `capacity` recordings (0 is treated as 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn insert(&mut self, mut recording: Recording) {
        if let Some(existing) = self.entries.pop(&recording.identifier) {
            if !recording.has_tracks() && existing.has_tracks() {
                recording.tracks = existing.tracks;
            }
        }
        self.entries.put(recording.identifier.clone(), recording);
    }

    /// Cached copy of a recording, marking it as recently used
    pub fn get(&mut self, identifier: &str) -> Option<Recording> {
        self.entries.get(identifier).cloned()
    }

    pub fn remove(&mut self, identifier: &str) -> Option<Recording> {
        self.entries.pop(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains(identifier)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

impl std::fmt::Debug for RecordingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.entries.cap())
            .finish()
    }
}
