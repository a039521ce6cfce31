//! Playback service
//!
//! One tokio task owns the [`PlaybackManager`] and serializes everything
//! that touches it: transport commands from the session host, platform
//! callbacks, and the results of recording loads. Loads run on their own
//! tasks and post back into the loop, so the playback context never waits
//! on the network.
//!
//! The host talks to the service through a [`ServiceHandle`] and receives
//! [`HostEvent`]s. Besides forwarding session events, the service derives
//! the session's active flag and foreground state from reported playback
//! state, and stops itself after a period without playback.

use std::sync::Arc;
use std::time::Duration;

use taper_core::{MediaItem, Recording, RecordingStore};
use taper_library::{ArchiveClient, MemoryCatalog, MusicLoader};
use taper_playback::{
    FocusChange, PlaybackConfig, PlaybackError, PlaybackManager, PlaybackState, Platform,
    PlayerEvent, SessionEvent,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};

// ===== Commands =====

/// Transport commands from the session host
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCommand {
    Play,
    Pause,
    Stop,
    SeekTo(u64),
    SkipToNext,
    SkipToPrevious,
    SkipToQueueItem(u64),
    PlayFromMediaId(String),
}

/// Everything the playback context consumes
#[derive(Debug)]
enum ServiceMessage {
    Command(ServiceCommand),
    Player(PlayerEvent),
    AudioFocus(FocusChange),
    BecomingNoisy,
    Shutdown,
}

/// Outcome of a recording load, posted back by the load task
#[derive(Debug)]
struct LoadResult {
    media_id: String,
    result: taper_playback::Result<Recording>,
}

// ===== Host events =====

/// How the host should run the service process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForegroundState {
    /// Playing: keep the service in the foreground with its notification
    Foreground,
    /// Paused: leave the foreground but keep the notification
    Background,
    /// Stopped: leave the foreground and drop the notification
    Stopped,
}

/// Why the service loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No playback for the configured idle timeout
    Idle,
    /// [`ServiceHandle::shutdown`] was called
    Requested,
    /// Every handle was dropped
    HandlesDropped,
}

/// Output of the service towards the session host
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Session(SessionEvent),
    ActiveChanged(bool),
    Foreground(ForegroundState),
    Stopped(StopReason),
}

// ===== Handle =====

/// Cloneable entry point into a running [`PlaybackService`]
#[derive(Clone)]
pub struct ServiceHandle {
    tx: mpsc::UnboundedSender<ServiceMessage>,
    store: Arc<dyn RecordingStore>,
}

impl ServiceHandle {
    pub fn send(&self, command: ServiceCommand) -> Result<()> {
        self.post(ServiceMessage::Command(command))
    }

    pub fn play(&self) -> Result<()> {
        self.send(ServiceCommand::Play)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(ServiceCommand::Pause)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(ServiceCommand::Stop)
    }

    pub fn seek_to(&self, position_ms: u64) -> Result<()> {
        self.send(ServiceCommand::SeekTo(position_ms))
    }

    pub fn skip_to_next(&self) -> Result<()> {
        self.send(ServiceCommand::SkipToNext)
    }

    pub fn skip_to_previous(&self) -> Result<()> {
        self.send(ServiceCommand::SkipToPrevious)
    }

    pub fn skip_to_queue_item(&self, queue_id: u64) -> Result<()> {
        self.send(ServiceCommand::SkipToQueueItem(queue_id))
    }

    pub fn play_from_media_id(&self, media_id: impl Into<String>) -> Result<()> {
        self.send(ServiceCommand::PlayFromMediaId(media_id.into()))
    }

    /// Deliver a media player callback
    pub fn player_event(&self, event: PlayerEvent) -> Result<()> {
        self.post(ServiceMessage::Player(event))
    }

    pub fn audio_focus_change(&self, change: FocusChange) -> Result<()> {
        self.post(ServiceMessage::AudioFocus(change))
    }

    /// Audio output is about to switch to the speaker
    pub fn becoming_noisy(&self) -> Result<()> {
        self.post(ServiceMessage::BecomingNoisy)
    }

    /// Stop playback and end the service loop
    pub fn shutdown(&self) -> Result<()> {
        self.post(ServiceMessage::Shutdown)
    }

    /// Browse children of `parent_id`
    ///
    /// Runs on the caller's task against the recording store; playback
    /// state is not involved.
    pub async fn children(&self, parent_id: &str) -> taper_core::Result<Vec<MediaItem>> {
        debug!(parent = %parent_id, "Request for children");
        self.store.children(parent_id).await
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    fn post(&self, message: ServiceMessage) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|_| ServiceError::ChannelClosed)
    }
}

impl std::fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

// ===== Service =====

/// The playback context
pub struct PlaybackService {
    manager: PlaybackManager,
    store: Arc<dyn RecordingStore>,

    rx: mpsc::UnboundedReceiver<ServiceMessage>,
    loaded_tx: mpsc::UnboundedSender<LoadResult>,
    loaded_rx: mpsc::UnboundedReceiver<LoadResult>,
    events: mpsc::UnboundedSender<HostEvent>,

    idle_timeout: Duration,
    idle_deadline: Option<Instant>,

    active: bool,
    foreground: Option<ForegroundState>,
}

impl PlaybackService {
    /// Create a service; run it with [`spawn`](Self::spawn) or [`run`](Self::run)
    pub fn new(
        platform: Box<dyn Platform>,
        store: Arc<dyn RecordingStore>,
        playback: PlaybackConfig,
        idle_timeout: Duration,
    ) -> (Self, ServiceHandle, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (loaded_tx, loaded_rx) = mpsc::unbounded_channel();
        let (events, host_rx) = mpsc::unbounded_channel();

        let handle = ServiceHandle {
            tx,
            store: Arc::clone(&store),
        };

        let service = Self {
            manager: PlaybackManager::new(platform, playback),
            store,
            rx,
            loaded_tx,
            loaded_rx,
            events,
            idle_timeout,
            idle_deadline: None,
            active: false,
            foreground: None,
        };

        (service, handle, host_rx)
    }

    pub fn from_config(
        platform: Box<dyn Platform>,
        store: Arc<dyn RecordingStore>,
        config: &ServiceConfig,
    ) -> (Self, ServiceHandle, mpsc::UnboundedReceiver<HostEvent>) {
        Self::new(
            platform,
            store,
            config.playback_config(),
            config.idle_timeout(),
        )
    }

    pub fn spawn(self) -> JoinHandle<StopReason> {
        tokio::spawn(self.run())
    }

    /// Process messages until shutdown, idle timeout, or every handle is gone
    pub async fn run(mut self) -> StopReason {
        info!(idle_timeout = ?self.idle_timeout, "Playback service started");
        self.arm_idle_timer();

        let reason = loop {
            let deadline = self.idle_deadline;
            let wake = tokio::select! {
                message = self.rx.recv() => Wake::Message(message),
                Some(loaded) = self.loaded_rx.recv() => Wake::Loaded(loaded),
                () = idle_elapsed(deadline) => Wake::Idle,
            };

            match wake {
                Wake::Message(None) => break StopReason::HandlesDropped,
                Wake::Message(Some(ServiceMessage::Shutdown)) => break StopReason::Requested,
                Wake::Message(Some(message)) => self.handle_message(message),
                Wake::Loaded(loaded) => self.handle_loaded(loaded),
                Wake::Idle => {
                    self.idle_deadline = None;
                    if self.manager.is_playing() {
                        debug!("Idle timer fired during playback, ignoring");
                    } else {
                        break StopReason::Idle;
                    }
                }
            }
            self.flush();
        };

        info!(?reason, "Stopping playback service");
        self.manager.on_stop();
        self.flush();
        self.send_host(HostEvent::Stopped(reason));
        reason
    }

    fn handle_message(&mut self, message: ServiceMessage) {
        match message {
            ServiceMessage::Command(command) => self.handle_command(command),
            ServiceMessage::Player(event) => self.manager.on_player_event(event),
            ServiceMessage::AudioFocus(change) => self.manager.on_audio_focus_change(change),
            ServiceMessage::BecomingNoisy => self.manager.on_becoming_noisy(),
            // Handled by the run loop
            ServiceMessage::Shutdown => {}
        }
    }

    fn handle_command(&mut self, command: ServiceCommand) {
        debug!(?command, "Transport command");
        match command {
            ServiceCommand::Play => self.manager.on_play(),
            ServiceCommand::Pause => self.manager.on_pause(),
            ServiceCommand::Stop => self.manager.on_stop(),
            ServiceCommand::SeekTo(position_ms) => self.manager.on_seek_to(position_ms),
            ServiceCommand::SkipToNext => {
                self.manager.on_skip_to_next();
            }
            ServiceCommand::SkipToPrevious => {
                self.manager.on_skip_to_previous();
            }
            ServiceCommand::SkipToQueueItem(queue_id) => {
                if let Err(e) = self.manager.on_skip_to_queue_item(queue_id) {
                    warn!(queue_id, error = %e, "Cannot skip to queue item");
                }
            }
            ServiceCommand::PlayFromMediaId(media_id) => {
                self.disarm_idle_timer();
                self.manager.on_play_from_media_id(&media_id);
            }
        }
    }

    fn handle_loaded(&mut self, loaded: LoadResult) {
        // Failures are already reported through the playback snapshot
        if let Err(e) = self
            .manager
            .on_recording_loaded(&loaded.media_id, loaded.result)
        {
            debug!(media_id = %loaded.media_id, error = %e, "Recording load did not start playback");
        }
    }

    /// Forward manager output to the host and act on it
    fn flush(&mut self) {
        for event in self.manager.drain_events() {
            match &event {
                SessionEvent::LoadRequested { media_id } => {
                    self.spawn_load(media_id.clone());
                    continue;
                }
                SessionEvent::PlaybackStateChanged(snapshot) => {
                    self.update_host_state(snapshot.state);
                }
                _ => {}
            }
            self.send_host(HostEvent::Session(event));
        }
    }

    fn spawn_load(&self, media_id: String) {
        debug!(media_id = %media_id, "Loading recording");
        let store = Arc::clone(&self.store);
        let tx = self.loaded_tx.clone();

        tokio::spawn(async move {
            let result = store
                .resolve_media_id(&media_id)
                .await
                .map_err(PlaybackError::from);
            // The service may have stopped in the meantime
            let _ = tx.send(LoadResult { media_id, result });
        });
    }

    fn update_host_state(&mut self, state: PlaybackState) {
        let active = match state {
            PlaybackState::Playing | PlaybackState::Buffering => Some(true),
            PlaybackState::Stopped => Some(false),
            _ => None,
        };
        if let Some(active) = active {
            if active != self.active {
                self.active = active;
                self.send_host(HostEvent::ActiveChanged(active));
            }
        }

        let foreground = match state {
            PlaybackState::Playing => Some(ForegroundState::Foreground),
            PlaybackState::Paused => Some(ForegroundState::Background),
            PlaybackState::Stopped => Some(ForegroundState::Stopped),
            _ => None,
        };
        if let Some(foreground) = foreground {
            if self.foreground != Some(foreground) {
                self.foreground = Some(foreground);
                self.send_host(HostEvent::Foreground(foreground));
            }
        }

        // Failed loads end in Error, never Stopped
        match state {
            PlaybackState::Playing => self.disarm_idle_timer(),
            PlaybackState::Stopped | PlaybackState::Error if self.idle_deadline.is_none() => {
                self.arm_idle_timer();
            }
            _ => {}
        }
    }

    fn arm_idle_timer(&mut self) {
        self.idle_deadline = Some(Instant::now() + self.idle_timeout);
    }

    fn disarm_idle_timer(&mut self) {
        self.idle_deadline = None;
    }

    fn send_host(&self, event: HostEvent) {
        if self.events.send(event).is_err() {
            debug!("Host event receiver dropped");
        }
    }
}

impl std::fmt::Debug for PlaybackService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackService")
            .field("manager", &self.manager)
            .field("active", &self.active)
            .field("foreground", &self.foreground)
            .field("idle_deadline", &self.idle_deadline)
            .finish_non_exhaustive()
    }
}

enum Wake {
    Message(Option<ServiceMessage>),
    Loaded(LoadResult),
    Idle,
}

async fn idle_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Recording store backed by the archive, wired from configuration
pub fn create_loader(config: &ServiceConfig, catalog: MemoryCatalog) -> Result<MusicLoader> {
    let archive = ArchiveClient::new(&config.archive.base_url, config.archive_timeout())?;
    Ok(MusicLoader::new(
        catalog,
        Arc::new(archive),
        config.cache.capacity,
    ))
}
