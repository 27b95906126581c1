//! JSON shapes shared by the Radarr and Sonarr v3 APIs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{DiskSpace, QualityProfile, QueueRecord, QueueState, Rating, ServiceStatus};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Image {
    #[serde(default)]
    pub cover_type: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub remote_url: Option<String>,
}

/// Remote poster url, falling back to the local one.
pub(super) fn poster(images: &[Image]) -> Option<String> {
    images
        .iter()
        .find(|i| i.cover_type == "poster")
        .and_then(|i| i.remote_url.clone().or_else(|| i.url.clone()))
        .filter(|u| !u.is_empty())
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RatingValue {
    #[serde(default)]
    pub votes: u64,
    #[serde(default)]
    pub value: f64,
}

/// Radarr reports one entry per source, Sonarr a single value.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum Ratings {
    Sources(BTreeMap<String, RatingValue>),
    Single(RatingValue),
}

impl Ratings {
    pub fn to_rating(&self) -> Rating {
        let (source, entry) = match self {
            Ratings::Single(entry) => (None, Some(entry)),
            Ratings::Sources(sources) => {
                let picked = ["tmdb", "imdb"]
                    .iter()
                    .find_map(|name| sources.get_key_value(*name))
                    .or_else(|| sources.iter().next());
                match picked {
                    Some((name, entry)) => (Some(name.clone()), Some(entry)),
                    None => (None, None),
                }
            }
        };

        match entry {
            Some(entry) => Rating {
                // percentages are brought back to a /10 scale
                value: if entry.value > 10.0 { entry.value / 10.0 } else { entry.value },
                votes: entry.votes,
                source,
            },
            None => Rating::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct QualityProfileEntry {
    pub id: i64,
    pub name: String,
}

impl From<QualityProfileEntry> for QualityProfile {
    fn from(entry: QualityProfileEntry) -> Self {
        QualityProfile {
            id: entry.id,
            name: entry.name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct QueueEntry {
    #[serde(default)]
    pub size: f64,
    #[serde(default, rename = "sizeleft")]
    pub size_left: f64,
    #[serde(default)]
    pub estimated_completion_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tracked_download_state: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl From<QueueEntry> for QueueRecord {
    fn from(entry: QueueEntry) -> Self {
        QueueRecord {
            state: QueueState::parse(entry.tracked_download_state.as_deref().unwrap_or_default()),
            size: entry.size,
            size_left: entry.size_left,
            eta: entry.estimated_completion_time,
            error_message: entry.error_message.filter(|m| !m.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SystemStatusEntry {
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub mode: String,
}

impl SystemStatusEntry {
    pub fn into_status(self, fallback_name: &str) -> ServiceStatus {
        ServiceStatus {
            name: if self.app_name.is_empty() {
                fallback_name.to_string()
            } else {
                self.app_name
            },
            version: self.version,
            mode: self.mode,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DiskSpaceEntry {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub free_space: u64,
    #[serde(default)]
    pub total_space: u64,
}

impl From<DiskSpaceEntry> for DiskSpace {
    fn from(entry: DiskSpaceEntry) -> Self {
        DiskSpace {
            path: entry.path,
            free: entry.free_space,
            total: entry.total_space,
        }
    }
}
