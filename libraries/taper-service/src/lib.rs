//! Taper - Playback Service
//!
//! Hosts the playback core on a tokio runtime:
//!
//! - [`PlaybackService`]: the single task that owns playback state
//! - [`ServiceHandle`]: commands and platform callbacks in, browse queries
//! - [`HostEvent`]: session events plus session activity, foreground state
//!   and service shutdown out
//! - [`ServiceConfig`]: `taper.toml` and `TAPER_*` environment configuration
//! - [`logging::init`]: tracing subscriber setup
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taper_library::MemoryCatalog;
//! use taper_playback::Platform;
//! use taper_service::{create_loader, logging, HostEvent, PlaybackService, ServiceConfig};
//!
//! # async fn example(platform: Box<dyn Platform>) -> taper_service::Result<()> {
//! let config = ServiceConfig::load()?;
//! config.validate()?;
//! logging::init(&config.logging.filter)?;
//!
//! let store = Arc::new(create_loader(&config, MemoryCatalog::new())?);
//! let (service, handle, mut events) = PlaybackService::from_config(platform, store, &config);
//! service.spawn();
//!
//! handle.play_from_media_id("content://taper.recordings/recordings/fromArchiveId/gd1977-05-08")?;
//! while let Some(event) = events.recv().await {
//!     if let HostEvent::Stopped(_) = event {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
mod error;
pub mod logging;
mod service;

pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use service::{
    create_loader, ForegroundState, HostEvent, PlaybackService, ServiceCommand, ServiceHandle,
    StopReason,
};
