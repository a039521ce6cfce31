//! Playback engine
//!
//! Drives one audible player plus an optional pre-buffered successor and
//! reconciles their asynchronous callbacks with the requested state.
//!
//! ```text
//!            play(id)                ready                  complete + next
//!  Stopped ───────────► Buffering ─────────► Playing ────────────────────────┐
//!     ▲                    │  ▲                │  ▲                          │
//!     │ stop()      pause()│  │seek (playing)  │  │ play(same id)            │
//!     │                    ▼  │                ▼  │                          │
//!     └──────────────── Paused ◄────────── pause()/focus loss/noisy          │
//!                                                                            │
//!  Playing/Buffering ◄────────── swap next→current ◄─────────────────────────┘
//! ```
//!
//! The engine is the only writer of playback state, audio focus and the
//! wake lock. It never calls out; everything it has to say is queued as an
//! [`EngineEvent`] and drained by its owner.

use tracing::{debug, info, trace, warn};

use crate::error::PlaybackError;
use crate::events::EngineEvent;
use crate::platform::{Platform, SlotId};
use crate::slot::{MediaSlot, SlotRole, Slots};
use crate::types::{
    FocusChange, FocusState, PlaybackConfig, PlaybackState, PlayerEvent, PlayerEventKind,
};

/// Playback engine
pub struct PlaybackEngine {
    platform: Box<dyn Platform>,
    config: PlaybackConfig,

    slots: Slots,
    slot_counter: u64,

    state: PlaybackState,

    /// Media id of the last `play` request, kept across failed loads
    current_media_id: Option<String>,

    /// Last known position of the current media, in ms
    current_position: u64,

    focus: FocusState,
    play_on_focus_gain: bool,

    /// Set by a seek issued while playing; the seek-complete callback resumes
    resume_after_seek: bool,

    wake_lock_held: bool,
    noisy_registered: bool,

    pending_events: Vec<EngineEvent>,
}

impl PlaybackEngine {
    pub fn new(platform: Box<dyn Platform>, config: PlaybackConfig) -> Self {
        Self {
            platform,
            config,
            slots: Slots::new(),
            slot_counter: 0,
            state: PlaybackState::None,
            current_media_id: None,
            current_position: 0,
            focus: FocusState::None,
            play_on_focus_gain: false,
            resume_after_seek: false,
            wake_lock_held: false,
            noisy_registered: false,
            pending_events: Vec::new(),
        }
    }

    // ===== Transport =====

    /// Play `media_id`
    ///
    /// - same media while paused: resume without reloading
    /// - media already pre-buffered in the next slot: promote that slot
    /// - anything else (including the same media while playing): full reload
    pub fn play(&mut self, media_id: &str) {
        self.play_on_focus_gain = false;
        let media_changed = self.current_media_id.as_deref() != Some(media_id);

        if !media_changed && self.state == PlaybackState::Paused {
            debug!(media_id, "Resuming paused media");
            self.start_playback();
            return;
        }

        if media_changed && self.slots.next().is_some_and(|s| s.media_id() == media_id) {
            self.hand_off_to_next();
            return;
        }

        self.reload(media_id);
    }

    /// Pause playback
    ///
    /// From `Buffering` this cancels the pending auto-start; the prepared
    /// player stays loaded and a later `play` of the same media resumes it.
    pub fn pause(&mut self) {
        match self.state {
            PlaybackState::Playing => {
                if let Some(slot) = self.slots.current_mut() {
                    let player = slot.player_mut();
                    if player.is_playing() {
                        player.pause();
                    }
                    self.current_position = player.current_position();
                }
                self.set_state(PlaybackState::Paused);
            }
            PlaybackState::Buffering => {
                self.resume_after_seek = false;
                // A player mid-seek is still audible
                if let Some(slot) = self.slots.current_mut().filter(|s| s.is_prepared()) {
                    let player = slot.player_mut();
                    if player.is_playing() {
                        player.pause();
                    }
                    self.current_position = player.current_position();
                }
                self.set_state(PlaybackState::Paused);
            }
            _ => {}
        }

        self.release_wake_lock();
        self.unregister_noisy();
    }

    /// Tear everything down
    pub fn stop(&mut self) {
        self.slots.clear();
        self.current_media_id = None;
        self.current_position = 0;
        self.resume_after_seek = false;
        self.play_on_focus_gain = false;
        self.set_state(PlaybackState::Stopped);
        self.abandon_focus();
        self.unregister_noisy();
        self.release_wake_lock();
    }

    /// Seek within the current media
    ///
    /// Without a ready player the position is only remembered and applied
    /// once the player is prepared. While playing the engine goes through
    /// `Buffering` until the seek lands.
    pub fn seek_to(&mut self, position_ms: u64) {
        let Some(slot) = self.slots.current_mut().filter(|s| s.is_prepared()) else {
            self.current_position = position_ms;
            return;
        };

        let was_playing = slot.player().is_playing();
        slot.player_mut().seek_to(position_ms);

        if was_playing {
            self.resume_after_seek = true;
            self.set_state(PlaybackState::Buffering);
        }
    }

    /// Pre-buffer `media_id` in the next slot
    ///
    /// Failures are not reported; the current track keeps playing and the
    /// queue will load the item normally when it becomes current.
    pub fn buffer_next(&mut self, media_id: &str) {
        self.drop_next();

        let id = self.allocate_slot_id();
        let mut player = self.platform.create_player(id);

        if let Err(e) = player.set_data_source(media_id) {
            debug!(media_id, error = %e, "Could not pre-buffer next track");
            player.release();
            return;
        }

        player.prepare_async();
        self.slots.replace_next(MediaSlot::new(id, media_id, player));
        debug!(media_id, slot = %id, "Pre-buffering next track");
    }

    // ===== Platform callbacks =====

    /// Dispatch a player callback; callbacks from superseded slots are dropped
    pub fn handle_player_event(&mut self, event: PlayerEvent) {
        let Some(role) = self.slots.role_of(event.slot) else {
            trace!(slot = %event.slot, kind = ?event.kind, "Ignoring callback from stale slot");
            return;
        };

        match event.kind {
            PlayerEventKind::Prepared => self.on_prepared(role),
            PlayerEventKind::Completed => self.on_completion(role),
            PlayerEventKind::Error { what, extra } => self.on_error(role, what, extra),
            PlayerEventKind::SeekComplete => self.on_seek_complete(role),
            PlayerEventKind::BufferingUpdate { percent } => {
                if role == SlotRole::Current {
                    self.emit(EngineEvent::BufferProgress { percent });
                }
            }
        }
    }

    pub fn handle_focus_change(&mut self, change: FocusChange) {
        debug!(?change, state = ?self.state, "Audio focus changed");

        match change {
            FocusChange::Loss | FocusChange::LossTransient => {
                self.focus = FocusState::None;
                let seeking = self.state == PlaybackState::Buffering && self.resume_after_seek;
                if self.state == PlaybackState::Playing || seeking {
                    self.play_on_focus_gain = true;
                    self.pause();
                }
                if change == FocusChange::Loss {
                    self.emit(EngineEvent::LostAudioFocus);
                }
            }
            FocusChange::Gain => self.focus = FocusState::Focused,
            FocusChange::LossTransientCanDuck => self.focus = FocusState::Duck,
        }

        if self.state == PlaybackState::Playing {
            self.apply_volume();
        } else if self.play_on_focus_gain && self.focus != FocusState::None {
            self.play_on_focus_gain = false;
            self.start_playback();
        }
    }

    /// Audio output is about to switch to the speaker
    ///
    /// Pauses, and makes sure a later focus gain does not resume.
    pub fn handle_becoming_noisy(&mut self) {
        if matches!(
            self.state,
            PlaybackState::Playing | PlaybackState::Buffering
        ) {
            info!("Audio becoming noisy, pausing");
            self.pause();
            self.play_on_focus_gain = false;
        }
    }

    fn on_prepared(&mut self, role: SlotRole) {
        match role {
            SlotRole::Current => {
                let position = self.current_position;
                let Some(slot) = self.slots.current_mut() else {
                    return;
                };
                slot.mark_prepared();
                if position > 0 {
                    slot.player_mut().seek_to(position);
                }
                debug!(media_id = slot.media_id(), "Current player ready");

                if self.state == PlaybackState::Buffering {
                    self.start_playback();
                }
            }
            SlotRole::Next => {
                let active = self.is_active();
                let Some(next) = self.slots.next_mut() else {
                    return;
                };
                next.mark_prepared();
                let next_id = next.id();
                let media_id = next.media_id().to_string();

                if active {
                    if let Some(current) = self.slots.current_mut() {
                        current.player_mut().set_next_player(Some(next_id));
                    }
                }
                debug!(media_id = %media_id, chained = active, "Next player ready");
                self.emit(EngineEvent::NextPrepared { media_id });
            }
        }
    }

    fn on_completion(&mut self, role: SlotRole) {
        if role == SlotRole::Next {
            trace!("Ignoring completion from next slot");
            return;
        }

        let next_queued = self.slots.next().is_some();

        if next_queued {
            let still_buffering = self.slots.next().is_some_and(|s| !s.is_prepared());
            if let Some(old) = self.slots.swap() {
                old.release();
            }
            self.current_position = 0;
            self.current_media_id = self.slots.current().map(|s| s.media_id().to_string());

            if let Some(media_id) = self.current_media_id.clone() {
                info!(media_id = %media_id, "Next track starting");
                self.emit(EngineEvent::NextStarting { media_id });
            }

            if still_buffering {
                self.set_state(PlaybackState::Buffering);
            } else {
                self.apply_volume();
                self.set_state(PlaybackState::Playing);
            }
        } else {
            self.current_position = 0;
        }

        self.emit(EngineEvent::PlaybackComplete { next_queued });
    }

    fn on_error(&mut self, role: SlotRole, what: i32, extra: i32) {
        match role {
            SlotRole::Next => {
                warn!(what, extra, "Next player failed, discarding pre-buffer");
                self.drop_next();
            }
            SlotRole::Current => {
                warn!(what, extra, "Current player failed");
                self.slots.clear();
                self.resume_after_seek = false;
                self.release_wake_lock();
                self.unregister_noisy();
                self.set_state(PlaybackState::Error);
                self.emit(EngineEvent::Error(PlaybackError::PlatformPlayer { what, extra }));
            }
        }
    }

    fn on_seek_complete(&mut self, role: SlotRole) {
        if role != SlotRole::Current {
            return;
        }
        let Some(slot) = self.slots.current_mut() else {
            return;
        };
        self.current_position = slot.player().current_position();

        if self.resume_after_seek && self.state == PlaybackState::Buffering {
            self.resume_after_seek = false;
            self.start_playback();
        }
    }

    // ===== Internals =====

    /// Load `media_id` into a fresh current slot, starting from the top
    fn reload(&mut self, media_id: &str) {
        info!(media_id, "Loading media");

        self.current_position = 0;
        self.current_media_id = Some(media_id.to_string());

        // Reset silently so that the Buffering transition below is always reported.
        let previous = self.state;
        self.state = PlaybackState::Stopped;
        self.resume_after_seek = false;
        self.release_wake_lock();
        self.unregister_noisy();
        self.slots.clear();

        if !self.request_focus() {
            warn!(media_id, "Audio focus denied, not starting playback");
            self.emit(EngineEvent::Error(PlaybackError::FocusDenied));
            self.report_stopped_since(previous);
            return;
        }

        let id = self.allocate_slot_id();
        let mut player = self.platform.create_player(id);

        if let Err(e) = player.set_data_source(media_id) {
            warn!(media_id, error = %e, "Failed to set data source");
            player.release();
            self.emit(EngineEvent::Error(e));
            self.report_stopped_since(previous);
            return;
        }

        player.prepare_async();
        self.slots.replace_current(MediaSlot::new(id, media_id, player));
        self.set_state(PlaybackState::Buffering);
        self.acquire_wake_lock();
    }

    fn report_stopped_since(&mut self, previous: PlaybackState) {
        if previous != PlaybackState::Stopped {
            self.emit(EngineEvent::StateChanged {
                state: PlaybackState::Stopped,
            });
        }
    }

    /// Promote a pre-buffered next slot requested explicitly
    fn hand_off_to_next(&mut self) {
        if let Some(old) = self.slots.swap() {
            old.release();
        }
        self.current_position = 0;
        self.resume_after_seek = false;
        self.current_media_id = self.slots.current().map(|s| s.media_id().to_string());
        debug!(media_id = ?self.current_media_id, "Handing off to pre-buffered slot");

        if self.slots.current().is_some_and(MediaSlot::is_prepared) {
            self.start_playback();
        } else if self.request_focus() {
            self.set_state(PlaybackState::Buffering);
            self.acquire_wake_lock();
        } else {
            self.emit(EngineEvent::Error(PlaybackError::FocusDenied));
        }
    }

    /// Start or resume the current player
    fn start_playback(&mut self) {
        if !self.request_focus() {
            warn!("Tried to start playback without audio focus");
            self.emit(EngineEvent::Error(PlaybackError::FocusDenied));
            return;
        }

        let Some(slot) = self.slots.current() else {
            return;
        };
        if !slot.is_prepared() {
            self.set_state(PlaybackState::Buffering);
            self.acquire_wake_lock();
            return;
        }

        self.acquire_wake_lock();
        self.apply_volume();
        self.register_noisy();

        if let Some(slot) = self.slots.current_mut() {
            if !slot.player().is_playing() {
                slot.player_mut().start();
            }
            self.set_state(PlaybackState::Playing);
        }
    }

    fn drop_next(&mut self) {
        if let Some(next) = self.slots.take_next() {
            next.release();
        }
        if let Some(current) = self.slots.current_mut() {
            current.player_mut().set_next_player(None);
        }
    }

    fn allocate_slot_id(&mut self) -> SlotId {
        self.slot_counter += 1;
        SlotId::new(self.slot_counter)
    }

    /// Request focus unless some focus (full or ducked) is already held
    fn request_focus(&mut self) -> bool {
        if self.focus != FocusState::None {
            return true;
        }
        if self.platform.request_audio_focus() {
            self.focus = FocusState::Focused;
            true
        } else {
            false
        }
    }

    fn abandon_focus(&mut self) {
        if self.focus != FocusState::None {
            self.platform.abandon_audio_focus();
            self.focus = FocusState::None;
        }
    }

    fn apply_volume(&mut self) {
        let volume = if self.focus == FocusState::Duck {
            self.config.duck_volume
        } else {
            self.config.normal_volume
        };
        if let Some(slot) = self.slots.current_mut() {
            slot.player_mut().set_volume(volume);
        }
    }

    fn acquire_wake_lock(&mut self) {
        if !self.wake_lock_held {
            self.platform.acquire_wake_lock();
            self.wake_lock_held = true;
        }
    }

    fn release_wake_lock(&mut self) {
        if self.wake_lock_held {
            self.platform.release_wake_lock();
            self.wake_lock_held = false;
        }
    }

    fn register_noisy(&mut self) {
        if !self.noisy_registered {
            self.platform.register_noisy_receiver();
            self.noisy_registered = true;
        }
    }

    fn unregister_noisy(&mut self) {
        if self.noisy_registered {
            self.platform.unregister_noisy_receiver();
            self.noisy_registered = false;
        }
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            trace!(from = ?self.state, to = ?state, "Engine state change");
            self.state = state;
            self.emit(EngineEvent::StateChanged { state });
        }
    }

    fn emit(&mut self, event: EngineEvent) {
        self.pending_events.push(event);
    }

    // ===== Getters =====

    /// Take all events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Position in ms; live while playing, last known otherwise
    pub fn position(&self) -> u64 {
        match self.slots.current() {
            Some(slot) if self.state == PlaybackState::Playing && slot.is_prepared() => {
                slot.player().current_position()
            }
            _ => self.current_position,
        }
    }

    pub fn current_media_id(&self) -> Option<&str> {
        self.current_media_id.as_deref()
    }

    pub fn next_media_id(&self) -> Option<&str> {
        self.slots.next().map(MediaSlot::media_id)
    }

    /// A next slot exists and has not reported ready yet
    pub fn is_next_buffering(&self) -> bool {
        self.slots.next().is_some_and(|s| !s.is_prepared())
    }

    pub fn focus(&self) -> FocusState {
        self.focus
    }

    pub fn play_on_focus_gain(&self) -> bool {
        self.play_on_focus_gain
    }

    /// A player is loaded and playback has started, is paused or is buffering
    pub fn is_active(&self) -> bool {
        self.slots.current().is_some()
            && matches!(
                self.state,
                PlaybackState::Buffering | PlaybackState::Playing | PlaybackState::Paused
            )
    }

    /// Audible now, or waiting to resume when focus returns
    pub fn is_playing(&self) -> bool {
        self.play_on_focus_gain || self.slots.current().is_some_and(|s| s.player().is_playing())
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn current_slot_id(&self) -> Option<SlotId> {
        self.slots.current().map(MediaSlot::id)
    }

    pub fn next_slot_id(&self) -> Option<SlotId> {
        self.slots.next().map(MediaSlot::id)
    }
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("state", &self.state)
            .field("slots", &self.slots)
            .field("current_media_id", &self.current_media_id)
            .field("focus", &self.focus)
            .finish_non_exhaustive()
    }
}
