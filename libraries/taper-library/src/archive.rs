//! Archive details client
//!
//! Fetches the file listing of a recording from the archive and turns its
//! MP3 entries into tracks.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use taper_core::Track;
use tracing::{debug, warn};

use crate::error::{LibraryError, Result};

/// Default archive endpoint
pub const DEFAULT_BASE_URL: &str = "https://archive.org";

/// Source of track listings for a recording
#[async_trait]
pub trait TrackFetcher: Send + Sync {
    /// Tracks of the recording `identifier`, ordered by track number
    async fn fetch_tracks(&self, identifier: &str) -> Result<Vec<Track>>;
}

/// HTTP client for the archive's `details` endpoint.
pub struct ArchiveClient {
    http: Client,
    base_url: String,
}

impl ArchiveClient {
    /// Create a client against `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        if base_url.is_empty() {
            return Err(LibraryError::InvalidUrl("URL cannot be empty".into()));
        }

        let base_url = base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(LibraryError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Taper/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch and parse the details document of a recording.
    pub async fn fetch_tracks(&self, identifier: &str) -> Result<Vec<Track>> {
        let url = format!("{}/details/{}", self.base_url, identifier);
        debug!(url = %url, "Fetching recording details");

        let response = self
            .http
            .get(&url)
            .query(&[("output", "json")])
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    LibraryError::ServerUnreachable(e.to_string())
                } else {
                    LibraryError::Request(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(identifier, status = status.as_u16(), "Archive rejected details request");
            return Err(LibraryError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let tracks = parse_details(identifier, &body)?;

        debug!(identifier, tracks = tracks.len(), "Fetched recording tracks");
        Ok(tracks)
    }
}

#[async_trait]
impl TrackFetcher for ArchiveClient {
    async fn fetch_tracks(&self, identifier: &str) -> Result<Vec<Track>> {
        ArchiveClient::fetch_tracks(self, identifier).await
    }
}

// ===== Details document =====

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    /// Keyed by file path; holds MP3s next to checksums, artwork, text files
    #[serde(default)]
    files: BTreeMap<String, FileEntry>,
}

/// Archive metadata values arrive as strings, numbers included
#[derive(Debug, Default, Deserialize)]
struct FileEntry {
    title: Option<String>,
    track: Option<String>,
    album: Option<String>,
    bitrate: Option<String>,
    length: Option<String>,
    format: Option<String>,
    size: Option<String>,
    md5: Option<String>,
}

/// Turn a details document into the recording's MP3 tracks
pub fn parse_details(identifier: &str, body: &str) -> Result<Vec<Track>> {
    let details: DetailsResponse = serde_json::from_str(body).map_err(|e| {
        LibraryError::ParseError(format!("Failed to parse details for {}: {}", identifier, e))
    })?;

    let mut tracks: Vec<Track> = details
        .files
        .into_iter()
        .filter(|(path, _)| is_mp3(path))
        .map(|(path, entry)| track_from_entry(identifier, &path, entry))
        .collect();

    tracks.sort_by_key(|t| t.number);
    Ok(tracks)
}

fn is_mp3(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"))
}

fn track_from_entry(identifier: &str, path: &str, entry: FileEntry) -> Track {
    Track {
        recording_identifier: identifier.to_string(),
        filename: path.trim_start_matches('/').to_string(),
        title: entry.title.unwrap_or_default(),
        number: entry.track.as_deref().map_or(0, parse_track_number),
        album: entry.album.unwrap_or_default(),
        bitrate: entry.bitrate.unwrap_or_else(|| "unknown".to_string()),
        length: entry.length.unwrap_or_else(|| "00:00".to_string()),
        format: entry.format.unwrap_or_else(|| "mp3".to_string()),
        size: entry
            .size
            .as_deref()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0),
        md5: entry.md5.unwrap_or_default(),
    }
}

/// `"7"`, `"07"` and `"7/19"` all mean track 7
fn parse_track_number(raw: &str) -> u32 {
    raw.split('/')
        .next()
        .and_then(|n| n.trim().parse().ok())
        .unwrap_or(0)
}
