//! Shared fake platform for integration tests
//!
//! Records every platform call and keeps a little state per player so tests
//! can check what is audible. Callbacks are never fired on their own; tests
//! deliver them explicitly with the helpers below.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use taper_core::{Recording, Track};
use taper_playback::{
    MediaPlayer, PlaybackError, Platform, PlayerEvent, PlayerEventKind, QueueItem, SlotId,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreatePlayer(SlotId),
    SetDataSource(SlotId, String),
    Prepare(SlotId),
    Start(SlotId),
    Pause(SlotId),
    Stop(SlotId),
    Reset(SlotId),
    Release(SlotId),
    Seek(SlotId, u64),
    Volume(SlotId, f32),
    SetNext(SlotId, Option<SlotId>),
    RequestFocus,
    AbandonFocus,
    AcquireWakeLock,
    ReleaseWakeLock,
    RegisterNoisy,
    UnregisterNoisy,
}

#[derive(Debug, Default, Clone)]
pub struct FakePlayerState {
    pub media_id: Option<String>,
    pub playing: bool,
    pub position: u64,
    pub volume: Option<f32>,
    pub next: Option<SlotId>,
    pub released: bool,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub calls: Vec<Call>,
    pub deny_focus: bool,
    pub failing_sources: HashSet<String>,
    pub players: HashMap<SlotId, FakePlayerState>,
    pub wake_lock_held: bool,
    pub noisy_registered: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FakePlatform {
    state: Arc<Mutex<FakeState>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn Platform> {
        Box::new(self.clone())
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn deny_focus(&self, deny: bool) {
        self.state().deny_focus = deny;
    }

    pub fn fail_source(&self, media_id: &str) {
        self.state().failing_sources.insert(media_id.to_string());
    }

    pub fn player(&self, slot: SlotId) -> FakePlayerState {
        self.state().players.get(&slot).cloned().unwrap_or_default()
    }

    pub fn is_playing(&self, slot: SlotId) -> bool {
        self.player(slot).playing
    }

    /// Slots whose player is currently audible
    pub fn audible(&self) -> Vec<SlotId> {
        let state = self.state();
        let mut slots: Vec<SlotId> = state
            .players
            .iter()
            .filter(|(_, p)| p.playing && !p.released)
            .map(|(id, _)| *id)
            .collect();
        slots.sort();
        slots
    }

    pub fn set_position(&self, slot: SlotId, position: u64) {
        if let Some(p) = self.state().players.get_mut(&slot) {
            p.position = position;
        }
    }

    pub fn wake_lock_held(&self) -> bool {
        self.state().wake_lock_held
    }

    pub fn noisy_registered(&self) -> bool {
        self.state().noisy_registered
    }

    /// Simulate `slot` reaching its end
    ///
    /// Like a real player, a chained successor starts on its own.
    pub fn finish(&self, slot: SlotId) -> PlayerEvent {
        let mut state = self.state();
        let next = state.players.get_mut(&slot).and_then(|p| {
            p.playing = false;
            p.next
        });
        if let Some(next) = next {
            if let Some(p) = state.players.get_mut(&next) {
                p.playing = true;
            }
        }
        PlayerEvent::new(slot, PlayerEventKind::Completed)
    }
}

impl Platform for FakePlatform {
    fn create_player(&mut self, slot: SlotId) -> Box<dyn MediaPlayer> {
        let mut state = self.state();
        state.calls.push(Call::CreatePlayer(slot));
        state.players.insert(slot, FakePlayerState::default());
        Box::new(FakePlayer {
            slot,
            state: Arc::clone(&self.state),
        })
    }

    fn request_audio_focus(&mut self) -> bool {
        let mut state = self.state();
        state.calls.push(Call::RequestFocus);
        !state.deny_focus
    }

    fn abandon_audio_focus(&mut self) {
        self.state().calls.push(Call::AbandonFocus);
    }

    fn acquire_wake_lock(&mut self) {
        let mut state = self.state();
        state.calls.push(Call::AcquireWakeLock);
        state.wake_lock_held = true;
    }

    fn release_wake_lock(&mut self) {
        let mut state = self.state();
        state.calls.push(Call::ReleaseWakeLock);
        state.wake_lock_held = false;
    }

    fn register_noisy_receiver(&mut self) {
        let mut state = self.state();
        state.calls.push(Call::RegisterNoisy);
        state.noisy_registered = true;
    }

    fn unregister_noisy_receiver(&mut self) {
        let mut state = self.state();
        state.calls.push(Call::UnregisterNoisy);
        state.noisy_registered = false;
    }
}

struct FakePlayer {
    slot: SlotId,
    state: Arc<Mutex<FakeState>>,
}

impl FakePlayer {
    fn with<R>(&self, f: impl FnOnce(&mut FakePlayerState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(state.players.entry(self.slot).or_default())
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl MediaPlayer for FakePlayer {
    fn set_data_source(&mut self, media_id: &str) -> taper_playback::Result<()> {
        self.record(Call::SetDataSource(self.slot, media_id.to_string()));
        if self.state.lock().unwrap().failing_sources.contains(media_id) {
            return Err(PlaybackError::MediaLoad {
                media_id: media_id.to_string(),
                reason: "unreachable".to_string(),
            });
        }
        self.with(|p| p.media_id = Some(media_id.to_string()));
        Ok(())
    }

    fn prepare_async(&mut self) {
        self.record(Call::Prepare(self.slot));
    }

    fn start(&mut self) {
        self.record(Call::Start(self.slot));
        self.with(|p| p.playing = true);
    }

    fn pause(&mut self) {
        self.record(Call::Pause(self.slot));
        self.with(|p| p.playing = false);
    }

    fn stop(&mut self) {
        self.record(Call::Stop(self.slot));
        self.with(|p| p.playing = false);
    }

    fn reset(&mut self) {
        self.record(Call::Reset(self.slot));
        self.with(|p| {
            p.playing = false;
            p.media_id = None;
        });
    }

    fn release(&mut self) {
        self.record(Call::Release(self.slot));
        self.with(|p| {
            p.playing = false;
            p.released = true;
        });
    }

    fn seek_to(&mut self, position_ms: u64) {
        self.record(Call::Seek(self.slot, position_ms));
        self.with(|p| p.position = position_ms);
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(Call::Volume(self.slot, volume));
        self.with(|p| p.volume = Some(volume));
    }

    fn is_playing(&self) -> bool {
        self.with(|p| p.playing)
    }

    fn current_position(&self) -> u64 {
        self.with(|p| p.position)
    }

    fn set_next_player(&mut self, next: Option<SlotId>) {
        self.record(Call::SetNext(self.slot, next));
        self.with(|p| p.next = next);
    }
}

// ===== Domain fixtures =====

pub fn media_id(identifier: &str, n: u32) -> String {
    format!("https://archive.org/download/{identifier}/t{n:02}.mp3")
}

pub fn create_test_track(identifier: &str, n: u32) -> Track {
    Track {
        recording_identifier: identifier.to_string(),
        filename: format!("t{n:02}.mp3"),
        title: format!("Track {n}"),
        number: n,
        album: format!("{identifier} album"),
        bitrate: "unknown".to_string(),
        length: "05:00".to_string(),
        format: "VBR MP3".to_string(),
        size: 0,
        md5: String::new(),
    }
}

pub fn create_test_recording(identifier: &str, tracks: u32) -> Recording {
    Recording {
        identifier: identifier.to_string(),
        show_id: 1,
        date: chrono::NaiveDate::from_ymd_opt(1977, 5, 8).unwrap(),
        title: "Barton Hall".to_string(),
        location: "Ithaca, NY".to_string(),
        setlist: None,
        rating: 5.0,
        num_reviews: 0,
        downloads: 0,
        publisher: None,
        source: None,
        soundboard: true,
        tracks: (1..=tracks).map(|n| create_test_track(identifier, n)).collect(),
    }
}

pub fn create_test_items(identifier: &str, count: u32) -> Vec<QueueItem> {
    (1..=count)
        .map(|n| QueueItem::from_track(u64::from(n - 1), &create_test_track(identifier, n), count as usize))
        .collect()
}

pub fn prepared(slot: SlotId) -> PlayerEvent {
    PlayerEvent::new(slot, PlayerEventKind::Prepared)
}

pub fn seek_complete(slot: SlotId) -> PlayerEvent {
    PlayerEvent::new(slot, PlayerEventKind::SeekComplete)
}

pub fn player_error(slot: SlotId, what: i32, extra: i32) -> PlayerEvent {
    PlayerEvent::new(slot, PlayerEventKind::Error { what, extra })
}
