//! Catalog types: shows, recordings, tracks and browse items

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::media_id::MediaId;

/// Display format shared by shows and recordings.
pub const DISPLAY_DATE_FORMAT: &str = "%m-%d-%Y";

/// Artist tag applied to every track in the catalog.
pub const CATALOG_ARTIST: &str = "Grateful Dead";

/// Genre tag applied to every track in the catalog.
pub const CATALOG_GENRE: &str = "Live";

/// A concert on a given date. One show has one or more recordings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    pub id: i64,
    pub date: NaiveDate,
    pub title: String,
    pub location: String,
    pub setlist: Option<String>,
    pub soundboard: bool,
    pub downloads: u32,
    pub recordings_count: u32,
}

impl Show {
    /// Date formatted as `MM-dd-yyyy`
    pub fn display_date(&self) -> String {
        self.date.format(DISPLAY_DATE_FORMAT).to_string()
    }

    /// Four digit year of the show, used by the year listing
    pub fn year(&self) -> String {
        self.date.format("%Y").to_string()
    }
}

/// One taping of a show, identified by its archive identifier.
///
/// `tracks` is empty until the track list has been fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub identifier: String,
    pub show_id: i64,
    pub date: NaiveDate,
    pub title: String,
    pub location: String,
    pub setlist: Option<String>,
    pub rating: f32,
    pub num_reviews: u32,
    pub downloads: u32,
    pub publisher: Option<String>,
    pub source: Option<String>,
    pub soundboard: bool,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Recording {
    pub fn display_date(&self) -> String {
        self.date.format(DISPLAY_DATE_FORMAT).to_string()
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    pub fn number_of_tracks(&self) -> usize {
        self.tracks.len()
    }

    /// Replace the track list, keeping it ordered by track number
    pub fn set_tracks(&mut self, mut tracks: Vec<Track>) {
        tracks.sort_by_key(|t| t.number);
        self.tracks = tracks;
    }

    /// Store id that resolves back to this recording
    pub fn media_id(&self) -> MediaId {
        MediaId::Recording {
            identifier: self.identifier.clone(),
        }
    }
}

/// A single audio file of a recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub recording_identifier: String,
    pub filename: String,
    pub title: String,
    pub number: u32,
    pub album: String,
    pub bitrate: String,
    /// Running time as published, `mm:ss`
    pub length: String,
    pub format: String,
    pub size: u64,
    pub md5: String,
}

impl Track {
    /// Playable id of this track (its download URL)
    pub fn media_id(&self) -> MediaId {
        MediaId::Track {
            identifier: self.recording_identifier.clone(),
            filename: self.filename.clone(),
        }
    }

    /// Parsed running time; zero when `length` is not `mm:ss`
    pub fn duration(&self) -> Duration {
        parse_length(&self.length).unwrap_or_default()
    }
}

fn parse_length(length: &str) -> Option<Duration> {
    let (minutes, seconds) = length.trim().split_once(':')?;
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    Some(Duration::from_secs(minutes * 60 + seconds))
}

/// Year entry of the top browse level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSummary {
    pub year: String,
    pub show_count: u32,
}

/// Whether a browse entry has children or can be played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaItemKind {
    Browsable,
    Playable,
}

/// Entry of the browse hierarchy handed to the session host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub media_id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub kind: MediaItemKind,
}

impl MediaItem {
    pub fn for_year(summary: &YearSummary) -> Self {
        let noun = if summary.show_count == 1 { "show" } else { "shows" };
        Self {
            media_id: MediaId::ShowsByYear {
                year: summary.year.clone(),
            }
            .to_string(),
            title: summary.year.clone(),
            subtitle: Some(format!("{} {}", summary.show_count, noun)),
            description: None,
            kind: MediaItemKind::Browsable,
        }
    }

    pub fn for_show(show: &Show) -> Self {
        Self {
            media_id: MediaId::Show { id: show.id }.to_string(),
            title: format!("{} {}", show.display_date(), show.title),
            subtitle: Some(show.location.clone()),
            description: show.setlist.clone(),
            kind: MediaItemKind::Browsable,
        }
    }

    pub fn for_recording(recording: &Recording) -> Self {
        Self {
            media_id: recording.media_id().to_string(),
            title: format!("{} {}", recording.display_date(), recording.title),
            subtitle: Some(recording.location.clone()),
            description: recording.setlist.clone(),
            kind: MediaItemKind::Browsable,
        }
    }

    /// Track entries show the running time as subtitle and the album as description
    pub fn for_track(track: &Track) -> Self {
        Self {
            media_id: track.media_id().to_string(),
            title: track.title.clone(),
            subtitle: Some(track.length.clone()),
            description: Some(track.album.clone()),
            kind: MediaItemKind::Playable,
        }
    }

    pub fn is_browsable(&self) -> bool {
        self.kind == MediaItemKind::Browsable
    }
}
