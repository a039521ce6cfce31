//! Core types for playback management

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use taper_core::types::{CATALOG_ARTIST, CATALOG_GENRE};
use taper_core::Track;

/// Volume while we hold full focus
pub const VOLUME_NORMAL: f32 = 1.0;

/// Volume while another app is allowed to duck us
pub const VOLUME_DUCK: f32 = 0.2;

/// Entry of the play queue
///
/// Built once from a catalog track and never mutated afterwards.
/// `media_id` is the opaque load target handed to the platform player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Ordinal position at queue creation, stable for the queue's lifetime
    pub queue_id: u64,

    pub media_id: String,

    pub title: String,

    /// Running time as published (`mm:ss`)
    pub subtitle: Option<String>,

    pub album: String,

    pub artist: String,

    pub genre: String,

    pub duration: Duration,

    pub track_number: u32,

    /// Number of tracks in the owning recording
    pub total_tracks: u32,
}

impl QueueItem {
    pub fn from_track(queue_id: u64, track: &Track, total_tracks: usize) -> Self {
        Self {
            queue_id,
            media_id: track.media_id().to_string(),
            title: track.title.clone(),
            subtitle: Some(track.length.clone()),
            album: track.album.clone(),
            artist: CATALOG_ARTIST.to_string(),
            genre: CATALOG_GENRE.to_string(),
            duration: track.duration(),
            track_number: track.number,
            total_tracks: u32::try_from(total_tracks).unwrap_or(u32::MAX),
        }
    }
}

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Nothing has been played yet
    #[default]
    None,

    /// Idle; nothing loaded or playback torn down
    Stopped,

    /// Waiting for a player to become ready, or for a seek to land
    Buffering,

    Playing,

    Paused,

    /// Current player failed; a fresh transport command is needed
    Error,
}

impl PlaybackState {
    /// States in which the host should keep the session active
    pub fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Buffering)
    }
}

/// Audio focus held by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FocusState {
    #[default]
    None,
    /// Another app is speaking; keep playing at reduced volume
    Duck,
    Focused,
}

/// Focus notification delivered by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusChange {
    Gain,
    /// Permanent loss; focus will not come back on its own
    Loss,
    LossTransient,
    LossTransientCanDuck,
}

/// Callback kinds delivered by a platform player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerEventKind {
    Prepared,
    Completed,
    Error { what: i32, extra: i32 },
    SeekComplete,
    BufferingUpdate { percent: u8 },
}

/// Platform player callback tagged with the slot that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerEvent {
    pub slot: crate::platform::SlotId,
    pub kind: PlayerEventKind,
}

impl PlayerEvent {
    pub fn new(slot: crate::platform::SlotId, kind: PlayerEventKind) -> Self {
        Self { slot, kind }
    }
}

bitflags! {
    /// Transport actions a controller may offer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PlaybackActions: u32 {
        const PLAY = 0x01;
        const PAUSE = 0x02;
        const PLAY_FROM_MEDIA_ID = 0x04;
        const SKIP_TO_PREVIOUS = 0x08;
        const SKIP_TO_NEXT = 0x10;
    }
}

impl PlaybackActions {
    /// Actions offered in `state`; pause is only offered while playing
    pub fn for_state(state: PlaybackState) -> Self {
        let mut actions = Self::PLAY
            | Self::PLAY_FROM_MEDIA_ID
            | Self::SKIP_TO_PREVIOUS
            | Self::SKIP_TO_NEXT;
        if state == PlaybackState::Playing {
            actions |= Self::PAUSE;
        }
        actions
    }
}

/// Externally reported playback state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub position_ms: u64,
    pub actions: PlaybackActions,
    pub active_queue_item_id: Option<u64>,
    pub error_message: Option<String>,
}

/// Playback configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Pre-buffer the next queue item while the current one plays
    pub gapless: bool,

    /// Volume applied while focused
    pub normal_volume: f32,

    /// Volume applied while ducked
    pub duck_volume: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            gapless: true,
            normal_volume: VOLUME_NORMAL,
            duck_volume: VOLUME_DUCK,
        }
    }
}
