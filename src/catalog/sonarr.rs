use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    in_library_matches,
    wire::{self, DiskSpaceEntry, Image, QualityProfileEntry, QueueEntry, Ratings, SystemStatusEntry},
    ArrClient, CatalogError, CatalogService, DiskSpace, DownloadStatus, MediaDetails, MediaItem, MediaKind,
    QualityProfile, Season, ServiceStatus,
};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SonarrSeries {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    tvdb_id: i64,
    title: String,
    #[serde(default)]
    year: i32,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    network: Option<String>,
    #[serde(default)]
    seasons: Vec<SonarrSeason>,
    #[serde(default)]
    statistics: Option<SeriesStatistics>,
    #[serde(default)]
    images: Vec<Image>,
    #[serde(default)]
    ratings: Option<Ratings>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SonarrSeason {
    season_number: u32,
    #[serde(default)]
    statistics: Option<SeasonStatistics>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeasonStatistics {
    #[serde(default)]
    episode_file_count: u32,
    #[serde(default)]
    total_episode_count: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesStatistics {
    #[serde(default)]
    season_count: u32,
    #[serde(default)]
    size_on_disk: u64,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: i64,
}

fn to_media_item(payload: Value) -> Result<MediaItem, CatalogError> {
    let series: SonarrSeries = serde_json::from_value(payload.clone())?;
    let statistics = series.statistics.unwrap_or_default();

    let seasons = series
        .seasons
        .into_iter()
        .map(|season| {
            let stats = season.statistics.unwrap_or_default();
            Season {
                number: season.season_number,
                downloaded_episodes: stats.episode_file_count,
                total_episodes: stats.total_episode_count,
            }
        })
        .collect::<Vec<_>>();

    let season_count = if statistics.season_count > 0 {
        statistics.season_count
    } else {
        seasons.iter().filter(|s| s.number > 0).count() as u32
    };

    Ok(MediaItem {
        library_id: (series.id > 0).then_some(series.id),
        provider_id: series.tvdb_id,
        title: series.title,
        year: series.year,
        in_library: series.id > 0,
        cover_image: wire::poster(&series.images),
        rating: series.ratings.map(|r| r.to_rating()).unwrap_or_default(),
        overview: series.overview.unwrap_or_default(),
        genres: series.genres,
        studio: series.network.filter(|n| !n.is_empty()),
        details: MediaDetails::Series {
            season_count,
            seasons,
            size_on_disk_gb: statistics.size_on_disk as f64 / BYTES_PER_GB,
        },
        payload,
    })
}

fn to_media_items(payloads: Vec<Value>) -> Result<Vec<MediaItem>, CatalogError> {
    payloads.into_iter().map(to_media_item).collect()
}

/// Series catalog backed by Sonarr.
#[derive(Clone, Debug)]
pub struct SonarrService {
    client: ArrClient,
    root_folder: String,
    language_profile_id: i64,
}

impl SonarrService {
    pub fn new(client: ArrClient, root_folder: impl Into<String>, language_profile_id: i64) -> Self {
        info!("Initializing SonarrService");
        Self {
            client,
            root_folder: root_folder.into(),
            language_profile_id,
        }
    }

    fn add_body(&self, item: &MediaItem, quality_profile_id: i64) -> Result<Value, CatalogError> {
        let mut body = item.payload.clone();
        let object = body
            .as_object_mut()
            .ok_or_else(|| CatalogError::InvalidPayload("series payload is not an object".into()))?;

        let root = self.root_folder.trim_end_matches('/');
        object.insert("qualityProfileId".into(), json!(quality_profile_id));
        object.insert("languageProfileId".into(), json!(self.language_profile_id));
        object.insert("rootFolderPath".into(), json!(root));
        object.insert("path".into(), json!(format!("{}/{} ({})", root, item.title, item.year)));
        object.insert("monitored".into(), json!(true));
        object.insert("seasonFolder".into(), json!(true));
        object.insert("addOptions".into(), json!({ "searchForMissingEpisodes": true }));

        Ok(body)
    }
}

#[async_trait]
impl CatalogService for SonarrService {
    fn kind(&self) -> MediaKind {
        MediaKind::Series
    }

    async fn list(&self) -> Result<Vec<MediaItem>, CatalogError> {
        debug!("Fetching sonarr series list");
        let payloads: Vec<Value> = self.client.fetch("api/v3/series").await?;
        to_media_items(payloads)
    }

    async fn lookup(&self, query: &str) -> Result<Vec<MediaItem>, CatalogError> {
        debug!("Looking up sonarr series: {}", query);
        let payloads: Vec<Value> = self.client.get("api/v3/series/lookup", &[("term", query)]).await?;
        to_media_items(payloads)
    }

    async fn details_in_library(&self, query: &str) -> Result<Vec<MediaItem>, CatalogError> {
        let lookup = self.lookup(query).await?;
        let library = self.list().await?;
        Ok(in_library_matches(lookup, &library))
    }

    async fn add(&self, item: &MediaItem, quality_profile_id: i64) -> Result<i64, CatalogError> {
        info!("Adding series {} (tvdb {}) to sonarr", item.title, item.provider_id);
        let body = self.add_body(item, quality_profile_id)?;
        let created: Created = self.client.post("api/v3/series", &body).await?;
        Ok(created.id)
    }

    async fn remove(&self, library_id: i64) -> Result<(), CatalogError> {
        info!("Removing series {} from sonarr", library_id);
        self.client
            .delete(&format!("api/v3/series/{}", library_id), &[("deleteFiles", "true")])
            .await
    }

    async fn quality_profiles(&self) -> Result<Vec<QualityProfile>, CatalogError> {
        let entries: Vec<QualityProfileEntry> = self.client.fetch("api/v3/qualityprofile").await?;
        Ok(entries.into_iter().map(Into::into).collect())
    }

    async fn download_status(&self, library_id: i64) -> Result<DownloadStatus, CatalogError> {
        let entries: Vec<QueueEntry> = self
            .client
            .get("api/v3/queue/details", &[("seriesId", library_id)])
            .await?;
        Ok(DownloadStatus::from_records(
            library_id,
            entries.into_iter().map(Into::into).collect(),
        ))
    }

    async fn system_status(&self) -> Result<ServiceStatus, CatalogError> {
        let entry: SystemStatusEntry = self.client.fetch("api/v3/system/status").await?;
        Ok(entry.into_status("Sonarr"))
    }

    async fn disk_space(&self) -> Result<Vec<DiskSpace>, CatalogError> {
        let entries: Vec<DiskSpaceEntry> = self.client.fetch("api/v3/diskspace").await?;
        Ok(entries.into_iter().map(Into::into).collect())
    }
}
