//! Taper Core
//!
//! Domain types, media id grammar and the recording store seam shared by
//! the playback, library and service crates.
//!
//! # Example
//!
//! ```rust
//! use taper_core::MediaId;
//!
//! let id: MediaId = "https://archive.org/download/gd1977-05-08/d1t01.mp3"
//!     .parse()
//!     .unwrap();
//! assert_eq!(id.recording_identifier(), Some("gd1977-05-08"));
//! assert!(!id.is_browsable());
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod media_id;
pub mod traits;
pub mod types;

pub use error::{Result, TaperError};
pub use media_id::MediaId;
pub use traits::RecordingStore;
pub use types::{MediaItem, MediaItemKind, Recording, Show, Track, YearSummary};
