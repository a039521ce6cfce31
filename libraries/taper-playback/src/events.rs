//! Playback Events
//!
//! Components do not call back into each other. Each one queues events
//! that its owner drains synchronously after every call:
//! - the engine queues [`EngineEvent`]s, drained by the manager
//! - the play queue queues [`QueueEvent`]s, drained by the manager
//! - the manager queues [`SessionEvent`]s, drained by the session host

use serde::Serialize;

use crate::error::PlaybackError;
use crate::types::{PlaybackSnapshot, PlaybackState, QueueItem};

/// Events emitted by the playback engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Engine state changed
    StateChanged { state: PlaybackState },

    /// The current track finished
    ///
    /// `next_queued` is true when the pre-buffered slot took over.
    PlaybackComplete { next_queued: bool },

    /// The pre-buffered slot became current
    NextStarting { media_id: String },

    /// The pre-buffered slot is ready and chained behind the current one
    NextPrepared { media_id: String },

    /// Current-slot failure
    Error(PlaybackError),

    /// Stream buffering progress of the current slot
    BufferProgress { percent: u8 },

    /// Focus was lost permanently; the host may want to shut down
    LostAudioFocus,
}

/// Events emitted by the play queue
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    /// The cursor moved (or the queue was replaced)
    CurrentChanged { index: usize, item: QueueItem },
}

/// Events for the session host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SessionEvent {
    /// A new queue replaced the old one
    QueueCreated { title: String, items: Vec<QueueItem> },

    /// Reported state changed
    PlaybackStateChanged(PlaybackSnapshot),

    /// The active queue item changed
    MetadataChanged(QueueItem),

    /// The host must resolve `media_id` through the recording store and
    /// report back with the loaded recording
    LoadRequested { media_id: String },

    /// Focus was lost permanently
    LostAudioFocus,

    BufferProgress { percent: u8 },
}
