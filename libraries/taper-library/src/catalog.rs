//! In-memory show and recording catalog
//!
//! The local side of the recording store. Shows and recordings are synced
//! from the archive elsewhere; this crate only reads them. A catalog can be
//! built programmatically or loaded from a JSON snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use taper_core::{Recording, Show, YearSummary};
use tracing::debug;

use crate::error::{LibraryError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryCatalog {
    #[serde(default)]
    shows: Vec<Show>,
    #[serde(default)]
    recordings: Vec<Recording>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(shows: Vec<Show>, recordings: Vec<Recording>) -> Self {
        Self { shows, recordings }
    }

    /// Load a catalog snapshot (`{"shows": [...], "recordings": [...]}`)
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json)
            .map_err(|e| LibraryError::ParseError(format!("Failed to parse catalog: {}", e)))?;
        debug!(
            shows = catalog.shows.len(),
            recordings = catalog.recordings.len(),
            "Loaded catalog snapshot"
        );
        Ok(catalog)
    }

    /// Insert or replace a show
    pub fn add_show(&mut self, show: Show) {
        self.shows.retain(|s| s.id != show.id);
        self.shows.push(show);
    }

    /// Insert or replace a recording
    pub fn add_recording(&mut self, recording: Recording) {
        self.recordings
            .retain(|r| r.identifier != recording.identifier);
        self.recordings.push(recording);
    }

    /// Years that have shows, newest first, with their show counts
    pub fn years(&self) -> Vec<YearSummary> {
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for show in &self.shows {
            *counts.entry(show.year()).or_default() += 1;
        }

        counts
            .into_iter()
            .rev()
            .map(|(year, show_count)| YearSummary { year, show_count })
            .collect()
    }

    /// Shows played in `year`, newest first
    pub fn shows_by_year(&self, year: &str) -> Vec<Show> {
        let mut shows: Vec<Show> = self
            .shows
            .iter()
            .filter(|s| s.year() == year)
            .cloned()
            .collect();
        shows.sort_by(|a, b| b.date.cmp(&a.date));
        shows
    }

    pub fn show(&self, id: i64) -> Option<&Show> {
        self.shows.iter().find(|s| s.id == id)
    }

    /// Recordings of a show, newest first
    pub fn recordings_for_show(&self, show_id: i64) -> Vec<Recording> {
        let mut recordings: Vec<Recording> = self
            .recordings
            .iter()
            .filter(|r| r.show_id == show_id)
            .cloned()
            .collect();
        recordings.sort_by(|a, b| b.date.cmp(&a.date));
        recordings
    }

    pub fn recording(&self, identifier: &str) -> Option<&Recording> {
        self.recordings.iter().find(|r| r.identifier == identifier)
    }

    pub fn show_count(&self) -> usize {
        self.shows.len()
    }

    pub fn recording_count(&self) -> usize {
        self.recordings.len()
    }
}
