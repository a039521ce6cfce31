//! Media id grammar
//!
//! Every browse entry and every queue item is addressed by a string id.
//! Browsable entries use store URIs under [`STORE_AUTHORITY`]; playable
//! tracks use the public download URL of the audio file.
//!
//! ```text
//! content://taper.recordings/shows                              root
//! content://taper.recordings/shows/by_date                      years
//! content://taper.recordings/shows/by_date/<year>               shows of a year
//! content://taper.recordings/shows/<id>[/recordings]            recordings of a show
//! content://taper.recordings/recordings/fromArchiveId/<ident>   tracks of a recording
//! https://archive.org/download/<ident>/<file>                   playable track
//! ```
//!
//! The playback engine never looks inside an id; only the recording store does.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::{Result, TaperError};

pub const STORE_SCHEME: &str = "content";
pub const STORE_AUTHORITY: &str = "taper.recordings";
pub const DOWNLOAD_BASE: &str = "https://archive.org";

/// Parsed form of a media id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaId {
    Root,
    Years,
    ShowsByYear { year: String },
    Show { id: i64 },
    Recording { identifier: String },
    Track { identifier: String, filename: String },
}

impl MediaId {
    /// Id of the top of the browse hierarchy
    pub fn root() -> Self {
        Self::Root
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|_| TaperError::InvalidMediaId(raw.to_string()))?;
        let invalid = || TaperError::InvalidMediaId(raw.to_string());

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        match url.scheme() {
            STORE_SCHEME => {
                if url.host_str() != Some(STORE_AUTHORITY) {
                    return Err(invalid());
                }
                Self::from_store_path(&segments).ok_or_else(invalid)
            }
            "http" | "https" => match segments.as_slice() {
                ["download", identifier, filename] => Ok(Self::Track {
                    identifier: (*identifier).to_string(),
                    filename: (*filename).to_string(),
                }),
                _ => Err(invalid()),
            },
            _ => Err(invalid()),
        }
    }

    fn from_store_path(segments: &[&str]) -> Option<Self> {
        match segments {
            ["shows"] => Some(Self::Root),
            ["shows", "by_date"] => Some(Self::Years),
            ["shows", "by_date", year] if is_year(year) => Some(Self::ShowsByYear {
                year: (*year).to_string(),
            }),
            ["shows", id] | ["shows", id, "recordings"] => {
                id.parse().ok().map(|id| Self::Show { id })
            }
            ["recordings", "fromArchiveId", identifier] => Some(Self::Recording {
                identifier: (*identifier).to_string(),
            }),
            _ => None,
        }
    }

    /// Store URIs have children, track URLs are playable
    pub fn is_browsable(&self) -> bool {
        !matches!(self, Self::Track { .. })
    }

    /// Archive identifier of the recording this id belongs to, if any
    pub fn recording_identifier(&self) -> Option<&str> {
        match self {
            Self::Recording { identifier } | Self::Track { identifier, .. } => Some(identifier),
            _ => None,
        }
    }
}

fn is_year(s: &str) -> bool {
    s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = format!("{STORE_SCHEME}://{STORE_AUTHORITY}");
        match self {
            Self::Root => write!(f, "{store}/shows"),
            Self::Years => write!(f, "{store}/shows/by_date"),
            Self::ShowsByYear { year } => write!(f, "{store}/shows/by_date/{year}"),
            Self::Show { id } => write!(f, "{store}/shows/{id}"),
            Self::Recording { identifier } => {
                write!(f, "{store}/recordings/fromArchiveId/{identifier}")
            }
            Self::Track {
                identifier,
                filename,
            } => write!(f, "{DOWNLOAD_BASE}/download/{identifier}/{filename}"),
        }
    }
}

impl FromStr for MediaId {
    type Err = TaperError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
