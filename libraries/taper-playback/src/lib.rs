//! Taper - Playback Management
//!
//! Platform-agnostic playback core for streaming live recordings.
//!
//! This crate provides:
//! - A playback engine driving a current player plus a pre-buffered next
//!   player, with audio focus, wake lock and "becoming noisy" handling
//! - Gapless handoff between the two players
//! - A play queue with clamped skipping
//! - A playback manager turning transport commands into engine calls and
//!   engine events into session state
//!
//! # Architecture
//!
//! Nothing in this crate blocks or spawns. The host owns one
//! [`PlaybackManager`] on a single execution context, feeds it transport
//! commands and platform callbacks, and drains [`SessionEvent`]s after each
//! call. Media players, audio focus and the wake lock come from a
//! [`Platform`] implementation.
//!
//! # Example
//!
//! ```rust,no_run
//! use taper_playback::{PlaybackConfig, PlaybackManager, Platform, SessionEvent};
//!
//! fn run(platform: Box<dyn Platform>) {
//!     let mut manager = PlaybackManager::new(platform, PlaybackConfig::default());
//!
//!     manager.on_play_from_media_id("content://taper.recordings/recordings/fromArchiveId/gd1977-05-08");
//!
//!     for event in manager.drain_events() {
//!         if let SessionEvent::LoadRequested { media_id } = event {
//!             // resolve through the recording store, then:
//!             // manager.on_recording_loaded(&media_id, result)
//!             let _ = media_id;
//!         }
//!     }
//! }
//! ```

mod engine;
mod error;
mod events;
mod manager;
mod platform;
mod queue;
mod slot;
pub mod types;

// Public exports
pub use engine::PlaybackEngine;
pub use error::{PlaybackError, Result};
pub use events::{EngineEvent, QueueEvent, SessionEvent};
pub use manager::PlaybackManager;
pub use platform::{MediaPlayer, Platform, SlotId};
pub use queue::PlayQueue;
pub use slot::{MediaSlot, SlotRole, Slots};
pub use types::{
    FocusChange, FocusState, PlaybackActions, PlaybackConfig, PlaybackSnapshot, PlaybackState,
    PlayerEvent, PlayerEventKind, QueueItem,
};
