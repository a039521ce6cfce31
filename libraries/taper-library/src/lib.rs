//! Taper - Recording Library
//!
//! Everything the playback service needs to know about recordings:
//!
//! - [`MemoryCatalog`]: shows and recordings known locally
//! - [`ArchiveClient`]: track listings from the archive's details endpoint
//! - [`RecordingCache`]: recently used recordings, tracks included
//! - [`MusicLoader`]: the browse hierarchy and media id resolution, exposed
//!   as a [`taper_core::RecordingStore`]
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use taper_library::{ArchiveClient, MemoryCatalog, MusicLoader};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let archive = ArchiveClient::new("https://archive.org", Duration::from_secs(30))?;
//! let loader = MusicLoader::new(MemoryCatalog::new(), Arc::new(archive), 64);
//!
//! for item in loader.children("content://taper.recordings/shows").await? {
//!     println!("{} ({:?})", item.title, item.subtitle);
//! }
//! # Ok(())
//! # }
//! ```

mod archive;
mod cache;
mod catalog;
mod error;
mod loader;

pub use archive::{parse_details, ArchiveClient, TrackFetcher, DEFAULT_BASE_URL};
pub use cache::RecordingCache;
pub use catalog::MemoryCatalog;
pub use error::{LibraryError, Result};
pub use loader::MusicLoader;
