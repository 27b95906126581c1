use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    /// Suffix used in callback data, kept compatible with already-sent keyboards.
    pub fn callback_suffix(&self) -> &'static str {
        match self {
            MediaKind::Movie => "Movie",
            MediaKind::Series => "Serie",
        }
    }

    /// Label of the identifier line embedded in messages (`MovieId: 42`).
    pub fn id_label(&self) -> &'static str {
        match self {
            MediaKind::Movie => "MovieId",
            MediaKind::Series => "SerieId",
        }
    }

    pub fn noun(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "serie",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            MediaKind::Movie => "Movies",
            MediaKind::Series => "Series",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            MediaKind::Movie => "🎬",
            MediaKind::Series => "📺",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rating {
    /// Out of 10.
    pub value: f64,
    pub votes: u64,
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Season {
    pub number: u32,
    pub downloaded_episodes: u32,
    pub total_episodes: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaDetails {
    Movie {
        runtime_mins: u32,
        downloaded: bool,
        quality: Option<String>,
        size_on_disk_gb: f64,
    },
    Series {
        season_count: u32,
        seasons: Vec<Season>,
        size_on_disk_gb: f64,
    },
}

/// A normalized catalog entry, either from the library or from a lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    /// Id inside the catalog library, `None` when the item is not in the library.
    pub library_id: Option<i64>,
    /// TMDb id for movies, TVDb id for series.
    pub provider_id: i64,
    pub title: String,
    pub year: i32,
    pub in_library: bool,
    pub cover_image: Option<String>,
    pub rating: Rating,
    pub overview: String,
    pub genres: Vec<String>,
    pub studio: Option<String>,
    pub details: MediaDetails,
    /// Raw catalog payload, posted back when adding the item.
    pub payload: serde_json::Value,
}

impl MediaItem {
    pub fn kind(&self) -> MediaKind {
        match self.details {
            MediaDetails::Movie { .. } => MediaKind::Movie,
            MediaDetails::Series { .. } => MediaKind::Series,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityProfile {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueState {
    Downloading,
    ImportPending,
    Importing,
    Imported,
    FailedPending,
    Failed,
    Unknown(String),
}

impl QueueState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "downloading" => QueueState::Downloading,
            "importPending" => QueueState::ImportPending,
            "importing" => QueueState::Importing,
            "imported" => QueueState::Imported,
            "failedPending" => QueueState::FailedPending,
            "failed" => QueueState::Failed,
            other => QueueState::Unknown(other.to_string()),
        }
    }
}

/// One queue record as reported by a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueRecord {
    pub state: QueueState,
    pub size: f64,
    pub size_left: f64,
    pub eta: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadStatus {
    pub found: bool,
    pub library_id: i64,
    pub state: QueueState,
    /// Bytes.
    pub size: f64,
    /// Bytes.
    pub size_left: f64,
    pub eta: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl DownloadStatus {
    pub fn not_found(library_id: i64) -> Self {
        Self {
            found: false,
            library_id,
            state: QueueState::Unknown(String::new()),
            size: 0.0,
            size_left: 0.0,
            eta: None,
            error_message: None,
        }
    }

    /// Folds every queue record of one library item into a single status.
    pub fn from_records(library_id: i64, records: Vec<QueueRecord>) -> Self {
        if records.is_empty() {
            return Self::not_found(library_id);
        }

        let state = records
            .iter()
            .find(|r| r.state != QueueState::Imported)
            .map(|r| r.state.clone())
            .unwrap_or(QueueState::Imported);

        Self {
            found: true,
            library_id,
            state,
            size: records.iter().map(|r| r.size).sum(),
            size_left: records.iter().map(|r| r.size_left).sum(),
            eta: records.iter().filter_map(|r| r.eta).max(),
            error_message: records.iter().find_map(|r| r.error_message.clone()),
        }
    }

    pub fn is_imported(&self) -> bool {
        self.found && self.state == QueueState::Imported
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStatus {
    pub name: String,
    pub version: String,
    pub mode: String,
}

/// One volume as reported by a catalog, sizes in bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskSpace {
    pub path: String,
    pub free: u64,
    pub total: u64,
}

impl DiskSpace {
    /// 0 when the total is unknown.
    pub fn free_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.free as f64 / self.total as f64 * 100.0
    }
}
