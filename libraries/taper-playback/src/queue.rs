//! Play queue
//!
//! Ordered tracks of one recording plus a cursor. The whole queue is
//! replaced by [`PlayQueue::create_queue`]; afterwards only the cursor
//! moves. Skips clamp at both ends, they never wrap.

use tracing::debug;

use crate::error::{PlaybackError, Result};
use crate::events::QueueEvent;
use crate::types::QueueItem;

/// Play queue for one recording
#[derive(Debug, Clone, Default)]
pub struct PlayQueue {
    /// Media id of the recording the items came from
    recording_id: Option<String>,

    title: String,

    items: Vec<QueueItem>,

    /// `Some` exactly when `items` is non-empty
    current_index: Option<usize>,

    pending_events: Vec<QueueEvent>,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue
    ///
    /// The cursor starts at `start_media_id` when it is one of the items,
    /// otherwise at the first item. An empty item list is rejected and
    /// leaves the existing queue untouched.
    pub fn create_queue(
        &mut self,
        recording_id: impl Into<String>,
        title: impl Into<String>,
        items: Vec<QueueItem>,
        start_media_id: Option<&str>,
    ) -> Result<()> {
        if items.is_empty() {
            return Err(PlaybackError::EmptyQueue);
        }

        let index = start_media_id
            .and_then(|id| items.iter().position(|item| item.media_id == id))
            .unwrap_or(0);

        self.recording_id = Some(recording_id.into());
        self.title = title.into();
        self.items = items;

        debug!(title = %self.title, len = self.items.len(), index, "Queue created");
        self.move_to(index);
        Ok(())
    }

    pub fn current_item(&self) -> Option<&QueueItem> {
        self.current_index.and_then(|i| self.items.get(i))
    }

    pub fn next_item(&self) -> Option<&QueueItem> {
        self.current_index.and_then(|i| self.items.get(i + 1))
    }

    /// Move the cursor to the item with `media_id`
    pub fn set_current_by_media_id(&mut self, media_id: &str) -> Result<&QueueItem> {
        let index = self
            .items
            .iter()
            .position(|item| item.media_id == media_id)
            .ok_or_else(|| PlaybackError::NotFound(media_id.to_string()))?;
        self.move_to(index);
        Ok(&self.items[index])
    }

    /// Move the cursor to the item with `queue_id`
    pub fn set_current_by_queue_id(&mut self, queue_id: u64) -> Result<&QueueItem> {
        let index = self
            .items
            .iter()
            .position(|item| item.queue_id == queue_id)
            .ok_or_else(|| PlaybackError::NotFound(format!("queue item {queue_id}")))?;
        self.move_to(index);
        Ok(&self.items[index])
    }

    /// Move the cursor by `delta`, clamped to the queue bounds
    ///
    /// Returns `false` (and fires nothing) when the clamped target is the
    /// current index, e.g. `skip(1)` on the last item.
    pub fn skip(&mut self, delta: i64) -> bool {
        let Some(index) = self.current_index else {
            return false;
        };

        let last = self.items.len() as i64 - 1;
        let target = (index as i64).saturating_add(delta).clamp(0, last) as usize;

        if target == index {
            return false;
        }
        self.move_to(target);
        true
    }

    /// Whether `media_id` is one of the items or the recording itself
    pub fn contains_media_id(&self, media_id: &str) -> bool {
        self.is_recording(media_id) || self.items.iter().any(|item| item.media_id == media_id)
    }

    /// Whether `media_id` names the recording this queue was built from
    pub fn is_recording(&self, media_id: &str) -> bool {
        self.recording_id.as_deref() == Some(media_id)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn recording_id(&self) -> Option<&str> {
        self.recording_id.as_deref()
    }

    pub fn drain_events(&mut self) -> Vec<QueueEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn move_to(&mut self, index: usize) {
        self.current_index = Some(index);
        let item = self.items[index].clone();
        self.pending_events
            .push(QueueEvent::CurrentChanged { index, item });
    }
}
