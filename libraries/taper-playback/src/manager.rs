//! Playback manager - core orchestration
//!
//! Single entry point for transport commands. Drives the play queue and the
//! engine, reacts to their events, and derives the state reported to the
//! session host.

use tracing::{debug, info, warn};

use taper_core::Recording;

use crate::{
    engine::PlaybackEngine,
    error::{PlaybackError, Result},
    events::{EngineEvent, QueueEvent, SessionEvent},
    platform::Platform,
    queue::PlayQueue,
    types::{
        FocusChange, PlaybackActions, PlaybackConfig, PlaybackSnapshot, PlaybackState,
        PlayerEvent, QueueItem,
    },
};

/// Playback manager
///
/// Owns the engine and the queue. Every public method runs to completion
/// and leaves the resulting [`SessionEvent`]s queued for
/// [`drain_events`](Self::drain_events).
pub struct PlaybackManager {
    engine: PlaybackEngine,
    queue: PlayQueue,
    config: PlaybackConfig,

    /// Error surfaced until the next transport command
    last_error: Option<PlaybackError>,

    /// Most recent play-from-media-id request; older loads are discarded
    pending_request: Option<String>,

    last_snapshot: Option<PlaybackSnapshot>,
    pending_events: Vec<SessionEvent>,
}

impl PlaybackManager {
    pub fn new(platform: Box<dyn Platform>, config: PlaybackConfig) -> Self {
        Self {
            engine: PlaybackEngine::new(platform, config.clone()),
            queue: PlayQueue::new(),
            config,
            last_error: None,
            pending_request: None,
            last_snapshot: None,
            pending_events: Vec::new(),
        }
    }

    // ===== Queue =====

    /// Replace the queue with `recording`'s tracks and play
    ///
    /// Playback starts at `start_media_id` when it names one of the tracks,
    /// otherwise at the first track.
    pub fn start_playback(
        &mut self,
        recording: &Recording,
        start_media_id: Option<&str>,
    ) -> Result<()> {
        let total = recording.number_of_tracks();
        let items: Vec<QueueItem> = recording
            .tracks
            .iter()
            .zip(0u64..)
            .map(|(track, queue_id)| QueueItem::from_track(queue_id, track, total))
            .collect();

        let title = format!("{} {}", recording.display_date(), recording.title);
        self.queue.create_queue(
            recording.media_id().to_string(),
            title.clone(),
            items,
            start_media_id,
        )?;

        info!(identifier = %recording.identifier, tracks = total, "Starting playback of recording");
        self.emit(SessionEvent::QueueCreated {
            title,
            items: self.queue.items().to_vec(),
        });

        self.play_current();
        Ok(())
    }

    // ===== Transport commands =====

    /// Resume, or replay the current queue item
    ///
    /// Does nothing while the current item is already playing or loading.
    pub fn on_play(&mut self) {
        self.clear_error();
        if self.is_current_item_running() {
            debug!("Current item already running, ignoring play");
            self.publish_snapshot(self.engine.state());
            return;
        }
        self.play_current();
    }

    pub fn on_pause(&mut self) {
        self.clear_error();
        self.engine.pause();
        self.process_events();
    }

    pub fn on_stop(&mut self) {
        self.clear_error();
        self.pending_request = None;
        self.engine.stop();
        self.process_events();
    }

    pub fn on_seek_to(&mut self, position_ms: u64) {
        self.clear_error();
        self.engine.seek_to(position_ms);
        self.process_events();
    }

    /// Returns `false` at the end of the queue
    pub fn on_skip_to_next(&mut self) -> bool {
        self.clear_error();
        self.skip_and_play(1)
    }

    /// Returns `false` at the start of the queue
    pub fn on_skip_to_previous(&mut self) -> bool {
        self.clear_error();
        self.skip_and_play(-1)
    }

    pub fn on_skip_to_queue_item(&mut self, queue_id: u64) -> Result<()> {
        self.clear_error();
        let found = self.queue.set_current_by_queue_id(queue_id).map(|_| ());
        if let Err(e) = found {
            self.process_events();
            return Err(e);
        }
        self.play_current();
        Ok(())
    }

    /// Play a track or recording by media id
    ///
    /// Media already in the queue plays immediately. Anything else is
    /// handed to the host as [`SessionEvent::LoadRequested`]; the host
    /// answers with [`on_recording_loaded`](Self::on_recording_loaded).
    pub fn on_play_from_media_id(&mut self, media_id: &str) {
        self.clear_error();
        self.pending_request = Some(media_id.to_string());

        if self.queue.contains_media_id(media_id) {
            debug!(media_id, "Requested media already queued");
            if !self.queue.is_recording(media_id) {
                // Cannot miss: contains_media_id matched an item.
                let _ = self.queue.set_current_by_media_id(media_id);
            }
            self.pending_request = None;
            self.play_current();
        } else {
            debug!(media_id, "Requesting recording load");
            self.emit(SessionEvent::LoadRequested {
                media_id: media_id.to_string(),
            });
        }
    }

    /// Result of a load requested through `LoadRequested`
    ///
    /// Dropped unless `media_id` is still the most recent request.
    pub fn on_recording_loaded(
        &mut self,
        media_id: &str,
        result: Result<Recording>,
    ) -> Result<()> {
        if self.pending_request.as_deref() != Some(media_id) {
            debug!(media_id, "Discarding stale load result");
            return Ok(());
        }
        self.pending_request = None;

        let outcome = result.and_then(|recording| {
            let start = recording
                .tracks
                .iter()
                .any(|t| t.media_id().to_string() == media_id)
                .then_some(media_id);
            self.start_playback(&recording, start)
        });

        if let Err(e) = &outcome {
            warn!(media_id, error = %e, "Could not play requested media");
            self.last_error = Some(e.clone());
            self.publish_snapshot(self.engine.state());
        }
        outcome
    }

    // ===== Platform input =====

    pub fn on_player_event(&mut self, event: PlayerEvent) {
        self.engine.handle_player_event(event);
        self.process_events();
    }

    pub fn on_audio_focus_change(&mut self, change: FocusChange) {
        self.engine.handle_focus_change(change);
        self.process_events();
    }

    pub fn on_becoming_noisy(&mut self) {
        self.engine.handle_becoming_noisy();
        self.process_events();
    }

    // ===== State =====

    /// Current externally visible state
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.build_snapshot(self.engine.state())
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn queue(&self) -> &PlayQueue {
        &self.queue
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    pub fn last_error(&self) -> Option<&PlaybackError> {
        self.last_error.as_ref()
    }

    pub fn pending_request(&self) -> Option<&str> {
        self.pending_request.as_deref()
    }

    /// Audible, or about to resume on focus gain
    pub fn is_playing(&self) -> bool {
        self.engine.is_playing()
    }

    // ===== Internals =====

    fn skip_and_play(&mut self, delta: i64) -> bool {
        let moved = self.queue.skip(delta);
        if moved {
            self.play_current();
        }
        moved
    }

    fn is_current_item_running(&self) -> bool {
        matches!(
            self.engine.state(),
            PlaybackState::Playing | PlaybackState::Buffering
        ) && self
            .queue
            .current_item()
            .is_some_and(|item| self.engine.current_media_id() == Some(item.media_id.as_str()))
    }

    fn play_current(&mut self) {
        if let Some(item) = self.queue.current_item() {
            let media_id = item.media_id.clone();
            self.engine.play(&media_id);
        }
        self.process_events();
        if self.engine.state() == PlaybackState::Playing {
            self.buffer_next_if_needed();
        }
    }

    /// Drain engine and queue until both are quiet
    fn process_events(&mut self) {
        loop {
            let engine_events = self.engine.drain_events();
            let queue_events = self.queue.drain_events();
            if engine_events.is_empty() && queue_events.is_empty() {
                break;
            }

            for event in queue_events {
                self.handle_queue_event(event);
            }
            for event in engine_events {
                self.handle_engine_event(event);
            }
        }
    }

    fn handle_queue_event(&mut self, event: QueueEvent) {
        match event {
            QueueEvent::CurrentChanged { index, item } => {
                debug!(index, media_id = %item.media_id, "Queue cursor moved");
                self.emit(SessionEvent::MetadataChanged(item));
                self.publish_snapshot(self.engine.state());
            }
        }
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::StateChanged { state } => {
                self.publish_snapshot(state);
                if state == PlaybackState::Playing {
                    self.buffer_next_if_needed();
                }
            }
            EngineEvent::PlaybackComplete { next_queued } => {
                if !next_queued {
                    if self.queue.skip(1) {
                        self.play_current();
                    } else {
                        info!("Reached end of queue");
                        self.engine.stop();
                    }
                }
            }
            EngineEvent::NextStarting { media_id } => {
                if self.queue.set_current_by_media_id(&media_id).is_err() {
                    warn!(media_id = %media_id, "Engine advanced to media outside the queue");
                }
                if self.engine.state() == PlaybackState::Playing {
                    self.buffer_next_if_needed();
                }
            }
            EngineEvent::NextPrepared { media_id } => {
                debug!(media_id = %media_id, "Gapless successor ready");
            }
            EngineEvent::Error(e) => {
                warn!(error = %e, "Playback error");
                self.last_error = Some(e);
                self.publish_snapshot(self.engine.state());
            }
            EngineEvent::BufferProgress { percent } => {
                self.emit(SessionEvent::BufferProgress { percent });
            }
            EngineEvent::LostAudioFocus => {
                self.emit(SessionEvent::LostAudioFocus);
            }
        }
    }

    fn buffer_next_if_needed(&mut self) {
        if !self.config.gapless {
            return;
        }
        let Some(next) = self.queue.next_item() else {
            return;
        };
        if self.engine.next_media_id() == Some(next.media_id.as_str()) {
            return;
        }
        let media_id = next.media_id.clone();
        self.engine.buffer_next(&media_id);
    }

    fn build_snapshot(&self, state: PlaybackState) -> PlaybackSnapshot {
        let (state, error_message) = match &self.last_error {
            Some(e) => (PlaybackState::Error, Some(e.to_string())),
            None => (state, None),
        };

        PlaybackSnapshot {
            state,
            position_ms: self.engine.position(),
            actions: PlaybackActions::for_state(state),
            active_queue_item_id: self.queue.current_item().map(|item| item.queue_id),
            error_message,
        }
    }

    /// Emit a snapshot unless it equals the last one reported
    fn publish_snapshot(&mut self, state: PlaybackState) {
        let snapshot = self.build_snapshot(state);
        if self.last_snapshot.as_ref() == Some(&snapshot) {
            return;
        }
        self.last_snapshot = Some(snapshot.clone());
        self.emit(SessionEvent::PlaybackStateChanged(snapshot));
    }

    fn clear_error(&mut self) {
        self.last_error = None;
    }

    fn emit(&mut self, event: SessionEvent) {
        self.pending_events.push(event);
    }
}

impl std::fmt::Debug for PlaybackManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackManager")
            .field("engine", &self.engine)
            .field("queue_len", &self.queue.len())
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}
