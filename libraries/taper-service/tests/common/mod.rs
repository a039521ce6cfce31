//! Shared fakes for service tests
//!
//! The platform fake only tracks what the service tests need: which player
//! slots exist and whether they are playing. The store fake serves a fixed
//! set of recordings and can be told to hold a load until released.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use taper_core::{MediaId, MediaItem, Recording, RecordingStore, TaperError, Track};
use taper_playback::{MediaPlayer, Platform, PlayerEvent, PlayerEventKind, SlotId};
use taper_service::HostEvent;
use tokio::sync::{mpsc, Notify};

// ===== Platform =====

#[derive(Debug, Default)]
struct PlatformState {
    slots: Vec<SlotId>,
    playing: HashMap<SlotId, bool>,
    wake_lock_held: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FakePlatform {
    state: Arc<Mutex<PlatformState>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn Platform> {
        Box::new(self.clone())
    }

    /// Most recently created player slot
    pub fn last_slot(&self) -> Option<SlotId> {
        self.state.lock().unwrap().slots.last().copied()
    }

    /// Player slots in creation order
    pub fn slots(&self) -> Vec<SlotId> {
        self.state.lock().unwrap().slots.clone()
    }

    pub fn is_playing(&self, slot: SlotId) -> bool {
        self.state
            .lock()
            .unwrap()
            .playing
            .get(&slot)
            .copied()
            .unwrap_or(false)
    }

    pub fn wake_lock_held(&self) -> bool {
        self.state.lock().unwrap().wake_lock_held
    }
}

impl Platform for FakePlatform {
    fn create_player(&mut self, slot: SlotId) -> Box<dyn MediaPlayer> {
        self.state.lock().unwrap().slots.push(slot);
        Box::new(FakePlayer {
            slot,
            state: Arc::clone(&self.state),
        })
    }

    fn request_audio_focus(&mut self) -> bool {
        true
    }

    fn abandon_audio_focus(&mut self) {}

    fn acquire_wake_lock(&mut self) {
        self.state.lock().unwrap().wake_lock_held = true;
    }

    fn release_wake_lock(&mut self) {
        self.state.lock().unwrap().wake_lock_held = false;
    }

    fn register_noisy_receiver(&mut self) {}

    fn unregister_noisy_receiver(&mut self) {}
}

struct FakePlayer {
    slot: SlotId,
    state: Arc<Mutex<PlatformState>>,
}

impl FakePlayer {
    fn set_playing(&self, playing: bool) {
        self.state.lock().unwrap().playing.insert(self.slot, playing);
    }
}

impl MediaPlayer for FakePlayer {
    fn set_data_source(&mut self, _media_id: &str) -> taper_playback::Result<()> {
        Ok(())
    }

    fn prepare_async(&mut self) {}

    fn start(&mut self) {
        self.set_playing(true);
    }

    fn pause(&mut self) {
        self.set_playing(false);
    }

    fn stop(&mut self) {
        self.set_playing(false);
    }

    fn reset(&mut self) {
        self.set_playing(false);
    }

    fn release(&mut self) {
        self.set_playing(false);
    }

    fn seek_to(&mut self, _position_ms: u64) {}

    fn set_volume(&mut self, _volume: f32) {}

    fn is_playing(&self) -> bool {
        self.state
            .lock()
            .unwrap()
            .playing
            .get(&self.slot)
            .copied()
            .unwrap_or(false)
    }

    fn current_position(&self) -> u64 {
        0
    }

    fn set_next_player(&mut self, _next: Option<SlotId>) {}
}

pub fn prepared(slot: SlotId) -> PlayerEvent {
    PlayerEvent::new(slot, PlayerEventKind::Prepared)
}

pub fn completed(slot: SlotId) -> PlayerEvent {
    PlayerEvent::new(slot, PlayerEventKind::Completed)
}

// ===== Store =====

#[derive(Default)]
pub struct FakeStore {
    recordings: HashMap<String, Recording>,
    /// Identifiers whose load waits for `release`
    held: Mutex<HashMap<String, Arc<Notify>>>,
}

impl FakeStore {
    pub fn with_recordings(recordings: Vec<Recording>) -> Self {
        Self {
            recordings: recordings
                .into_iter()
                .map(|r| (r.identifier.clone(), r))
                .collect(),
            held: Mutex::default(),
        }
    }

    /// Make loads of `identifier` wait until `release` is called
    pub fn hold(&self, identifier: &str) {
        self.held
            .lock()
            .unwrap()
            .insert(identifier.to_string(), Arc::new(Notify::new()));
    }

    pub fn release(&self, identifier: &str) {
        if let Some(notify) = self.held.lock().unwrap().get(identifier) {
            notify.notify_one();
        }
    }
}

#[async_trait]
impl RecordingStore for FakeStore {
    async fn resolve_media_id(&self, media_id: &str) -> taper_core::Result<Recording> {
        let parsed = MediaId::parse(media_id)?;
        let identifier = parsed
            .recording_identifier()
            .ok_or_else(|| TaperError::InvalidMediaId(media_id.to_string()))?
            .to_string();

        let gate = self.held.lock().unwrap().get(&identifier).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.recordings
            .get(&identifier)
            .cloned()
            .ok_or_else(|| TaperError::not_found("Recording", identifier))
    }

    async fn children(&self, parent_id: &str) -> taper_core::Result<Vec<MediaItem>> {
        match MediaId::parse(parent_id)? {
            MediaId::Recording { identifier } => Ok(self
                .recordings
                .get(&identifier)
                .map(|r| r.tracks.iter().map(MediaItem::for_track).collect())
                .unwrap_or_default()),
            _ => Ok(self.recordings.values().map(MediaItem::for_recording).collect()),
        }
    }
}

// ===== Fixtures =====

pub fn recording_uri(identifier: &str) -> String {
    format!("content://taper.recordings/recordings/fromArchiveId/{identifier}")
}

pub fn track_url(identifier: &str, n: u32) -> String {
    format!("https://archive.org/download/{identifier}/t{n:02}.mp3")
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
        tracks: (1..=tracks)
            .map(|n| Track {
                recording_identifier: identifier.to_string(),
                filename: format!("t{n:02}.mp3"),
                title: format!("Track {n}"),
                number: n,
                album: "Cornell 77".to_string(),
                bitrate: "unknown".to_string(),
                length: "05:00".to_string(),
                format: "mp3".to_string(),
                size: 0,
                md5: String::new(),
            })
            .collect(),
    }
}

/// Receive host events until one matches, failing after a second
pub async fn expect_event(
    rx: &mut mpsc::UnboundedReceiver<HostEvent>,
    pred: impl Fn(&HostEvent) -> bool,
) -> HostEvent {
    let wait = async {
        while let Some(event) = rx.recv().await {
            if pred(&event) {
                return event;
            }
        }
        panic!("host event channel closed");
    };
    tokio::time::timeout(Duration::from_secs(1), wait)
        .await
        .expect("timed out waiting for host event")
}

/// Everything already queued on the host channel
pub fn drain(rx: &mut mpsc::UnboundedReceiver<HostEvent>) -> Vec<HostEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
