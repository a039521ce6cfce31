//! Player slots
//!
//! The engine drives at most two players: the one being heard and one
//! pre-buffering the following track. Both live in [`Slots`], which owns
//! them outright; the gapless handoff is a single [`Slots::swap`].

use crate::platform::{MediaPlayer, SlotId};

/// One loaded player and what it was loaded with
pub struct MediaSlot {
    id: SlotId,
    media_id: String,
    player: Box<dyn MediaPlayer>,
    prepared: bool,
}

impl MediaSlot {
    pub fn new(id: SlotId, media_id: impl Into<String>, player: Box<dyn MediaPlayer>) -> Self {
        Self {
            id,
            media_id: media_id.into(),
            player,
            prepared: false,
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn media_id(&self) -> &str {
        &self.media_id
    }

    /// Whether the player reported ready
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn mark_prepared(&mut self) {
        self.prepared = true;
    }

    pub fn player(&self) -> &dyn MediaPlayer {
        self.player.as_ref()
    }

    pub fn player_mut(&mut self) -> &mut dyn MediaPlayer {
        self.player.as_mut()
    }

    /// Detach, stop and free the underlying player
    pub fn release(mut self) {
        self.player.set_next_player(None);
        if self.player.is_playing() {
            self.player.stop();
        }
        self.player.reset();
        self.player.release();
    }
}

impl std::fmt::Debug for MediaSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaSlot")
            .field("id", &self.id)
            .field("media_id", &self.media_id)
            .field("prepared", &self.prepared)
            .finish_non_exhaustive()
    }
}

/// Which slot a callback belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRole {
    Current,
    Next,
}

/// The current and next slots
#[derive(Debug, Default)]
pub struct Slots {
    current: Option<MediaSlot>,
    next: Option<MediaSlot>,
}

impl Slots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&MediaSlot> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut MediaSlot> {
        self.current.as_mut()
    }

    pub fn next(&self) -> Option<&MediaSlot> {
        self.next.as_ref()
    }

    pub fn next_mut(&mut self) -> Option<&mut MediaSlot> {
        self.next.as_mut()
    }

    /// Install a new current slot, returning the one it replaces
    pub fn replace_current(&mut self, slot: MediaSlot) -> Option<MediaSlot> {
        self.current.replace(slot)
    }

    /// Install a new next slot, returning the one it replaces
    pub fn replace_next(&mut self, slot: MediaSlot) -> Option<MediaSlot> {
        self.next.replace(slot)
    }

    pub fn take_current(&mut self) -> Option<MediaSlot> {
        self.current.take()
    }

    pub fn take_next(&mut self) -> Option<MediaSlot> {
        self.next.take()
    }

    /// Promote next to current
    ///
    /// Returns the previous current slot for the caller to release. The
    /// next slot is empty afterwards. No-op returning `None` when there
    /// is no next slot.
    pub fn swap(&mut self) -> Option<MediaSlot> {
        let next = self.next.take()?;
        self.current.replace(next)
    }

    /// Resolve a callback's slot id against the live slots
    pub fn role_of(&self, id: SlotId) -> Option<SlotRole> {
        if self.current.as_ref().is_some_and(|s| s.id == id) {
            Some(SlotRole::Current)
        } else if self.next.as_ref().is_some_and(|s| s.id == id) {
            Some(SlotRole::Next)
        } else {
            None
        }
    }

    /// Release both slots
    pub fn clear(&mut self) {
        if let Some(slot) = self.current.take() {
            slot.release();
        }
        if let Some(slot) = self.next.take() {
            slot.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::NullPlayer;

    fn slot(id: u64, media_id: &str) -> MediaSlot {
        MediaSlot::new(SlotId::new(id), media_id, Box::new(NullPlayer::default()))
    }

    #[test]
    fn test_swap_promotes_next() {
        let mut slots = Slots::new();
        slots.replace_current(slot(1, "a"));
        slots.replace_next(slot(2, "b"));

        let old = slots.swap().expect("previous current");

        assert_eq!(old.media_id(), "a");
        assert_eq!(slots.current().map(MediaSlot::media_id), Some("b"));
        assert!(slots.next().is_none());
    }

    #[test]
    fn test_swap_without_next_keeps_current() {
        let mut slots = Slots::new();
        slots.replace_current(slot(1, "a"));

        assert!(slots.swap().is_none());
        assert_eq!(slots.current().map(MediaSlot::id), Some(SlotId::new(1)));
    }

    #[test]
    fn test_role_of_ignores_stale_ids() {
        let mut slots = Slots::new();
        slots.replace_current(slot(3, "a"));
        slots.replace_next(slot(4, "b"));

        assert_eq!(slots.role_of(SlotId::new(3)), Some(SlotRole::Current));
        assert_eq!(slots.role_of(SlotId::new(4)), Some(SlotRole::Next));
        assert_eq!(slots.role_of(SlotId::new(1)), None);

        slots.swap();
        assert_eq!(slots.role_of(SlotId::new(3)), None);
        assert_eq!(slots.role_of(SlotId::new(4)), Some(SlotRole::Current));
    }
}
