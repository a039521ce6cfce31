//! Platform seam
//!
//! The engine never talks to an OS media stack directly. A host supplies a
//! [`Platform`] that creates [`MediaPlayer`]s and owns the process-wide
//! audio focus, wake lock and "becoming noisy" registration.
//!
//! Players load asynchronously. They report back (ready, completion,
//! error, seek complete, buffering progress) by posting a
//! [`PlayerEvent`](crate::types::PlayerEvent) tagged with the [`SlotId`]
//! they were created for. The engine drops callbacks for slots it has
//! already superseded.

use std::fmt;

use crate::error::Result;

/// Identity of one load of one player
///
/// Every load gets a fresh id, so a late callback from a released player
/// can never be mistaken for the slot that replaced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u64);

impl SlotId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

/// A platform media player
///
/// Mirrors the lifecycle of a streaming player: set a source, prepare it
/// asynchronously, then start/pause/seek. Preparation, completion, seek
/// completion and errors are reported out of band as player events.
pub trait MediaPlayer: Send {
    /// Point the player at a load target (a track URL)
    ///
    /// # Errors
    /// `MediaLoad` when the source cannot be opened
    fn set_data_source(&mut self, media_id: &str) -> Result<()>;

    /// Start preparing; completion is reported as `Prepared`
    fn prepare_async(&mut self);

    fn start(&mut self);

    fn pause(&mut self);

    fn stop(&mut self);

    /// Return to the idle state, dropping the source
    fn reset(&mut self);

    /// Free platform resources; the player is unusable afterwards
    fn release(&mut self);

    /// Seek in milliseconds; completion is reported as `SeekComplete`
    fn seek_to(&mut self, position_ms: u64);

    fn set_volume(&mut self, volume: f32);

    fn is_playing(&self) -> bool;

    /// Current position in milliseconds
    fn current_position(&self) -> u64;

    /// Chain a prepared player to start the moment this one completes
    ///
    /// `None` detaches any previous chaining.
    fn set_next_player(&mut self, next: Option<SlotId>);
}

/// Process-wide platform services used by the engine
pub trait Platform: Send {
    /// Create a player whose callbacks will carry `slot`
    fn create_player(&mut self, slot: SlotId) -> Box<dyn MediaPlayer>;

    /// Ask for exclusive audio focus; `true` when granted
    fn request_audio_focus(&mut self) -> bool;

    fn abandon_audio_focus(&mut self);

    /// Keep the device awake (and networking up) while streaming
    fn acquire_wake_lock(&mut self);

    fn release_wake_lock(&mut self);

    /// Start receiving "audio becoming noisy" (headphones unplugged)
    fn register_noisy_receiver(&mut self);

    fn unregister_noisy_receiver(&mut self);
}

/// Player that accepts every call and never reports back
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct NullPlayer {
    pub playing: bool,
    pub released: bool,
    pub next: Option<SlotId>,
}

#[cfg(test)]
impl MediaPlayer for NullPlayer {
    fn set_data_source(&mut self, _media_id: &str) -> Result<()> {
        Ok(())
    }

    fn prepare_async(&mut self) {}

    fn start(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn reset(&mut self) {
        self.playing = false;
    }

    fn release(&mut self) {
        self.released = true;
    }

    fn seek_to(&mut self, _position_ms: u64) {}

    fn set_volume(&mut self, _volume: f32) {}

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn current_position(&self) -> u64 {
        0
    }

    fn set_next_player(&mut self, next: Option<SlotId>) {
        self.next = next;
    }
}
