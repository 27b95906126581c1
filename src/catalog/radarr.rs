use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    in_library_matches,
    wire::{self, DiskSpaceEntry, Image, QualityProfileEntry, QueueEntry, Ratings, SystemStatusEntry},
    ArrClient, CatalogError, CatalogService, DiskSpace, DownloadStatus, MediaDetails, MediaItem, MediaKind,
    QualityProfile, ServiceStatus,
};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RadarrMovie {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    tmdb_id: i64,
    title: String,
    #[serde(default)]
    year: i32,
    #[serde(default)]
    runtime: u32,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    studio: Option<String>,
    #[serde(default)]
    has_file: bool,
    #[serde(default)]
    movie_file: Option<MovieFile>,
    #[serde(default)]
    images: Vec<Image>,
    #[serde(default)]
    ratings: Option<Ratings>,
}

#[derive(Debug, Deserialize)]
struct MovieFile {
    #[serde(default)]
    size: u64,
    #[serde(default)]
    quality: Option<QualityWrapper>,
}

#[derive(Debug, Deserialize)]
struct QualityWrapper {
    quality: QualityName,
}

#[derive(Debug, Deserialize)]
struct QualityName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: i64,
}

fn to_media_item(payload: Value) -> Result<MediaItem, CatalogError> {
    let movie: RadarrMovie = serde_json::from_value(payload.clone())?;

    let (quality, size_on_disk_gb) = match (&movie.movie_file, movie.has_file) {
        (Some(file), true) => (
            file.quality.as_ref().map(|q| q.quality.name.clone()),
            file.size as f64 / BYTES_PER_GB,
        ),
        _ => (None, 0.0),
    };

    Ok(MediaItem {
        library_id: (movie.id > 0).then_some(movie.id),
        provider_id: movie.tmdb_id,
        title: movie.title,
        year: movie.year,
        in_library: movie.id > 0,
        cover_image: wire::poster(&movie.images),
        rating: movie.ratings.map(|r| r.to_rating()).unwrap_or_default(),
        overview: movie.overview.unwrap_or_default(),
        genres: movie.genres,
        studio: movie.studio.filter(|s| !s.is_empty()),
        details: MediaDetails::Movie {
            runtime_mins: movie.runtime,
            downloaded: movie.has_file,
            quality,
            size_on_disk_gb,
        },
        payload,
    })
}

fn to_media_items(payloads: Vec<Value>) -> Result<Vec<MediaItem>, CatalogError> {
    payloads.into_iter().map(to_media_item).collect()
}

/// Movies catalog backed by Radarr.
#[derive(Clone, Debug)]
pub struct RadarrService {
    client: ArrClient,
    root_folder: String,
}

impl RadarrService {
    pub fn new(client: ArrClient, root_folder: impl Into<String>) -> Self {
        info!("Initializing RadarrService");
        Self {
            client,
            root_folder: root_folder.into(),
        }
    }

    fn add_body(&self, item: &MediaItem, quality_profile_id: i64) -> Result<Value, CatalogError> {
        let mut body = item.payload.clone();
        let object = body
            .as_object_mut()
            .ok_or_else(|| CatalogError::InvalidPayload("movie payload is not an object".into()))?;

        let root = self.root_folder.trim_end_matches('/');
        object.insert("qualityProfileId".into(), json!(quality_profile_id));
        object.insert("rootFolderPath".into(), json!(root));
        object.insert("path".into(), json!(format!("{}/{} ({})", root, item.title, item.year)));
        object.insert("monitored".into(), json!(true));
        object.insert("addOptions".into(), json!({ "searchForMovie": true }));

        Ok(body)
    }
}

#[async_trait]
impl CatalogService for RadarrService {
    fn kind(&self) -> MediaKind {
        MediaKind::Movie
    }

    async fn list(&self) -> Result<Vec<MediaItem>, CatalogError> {
        debug!("Fetching radarr movie list");
        let payloads: Vec<Value> = self.client.fetch("api/v3/movie").await?;
        to_media_items(payloads)
    }

    async fn lookup(&self, query: &str) -> Result<Vec<MediaItem>, CatalogError> {
        debug!("Looking up radarr movie: {}", query);
        let payloads: Vec<Value> = self.client.get("api/v3/movie/lookup", &[("term", query)]).await?;
        to_media_items(payloads)
    }

    async fn details_in_library(&self, query: &str) -> Result<Vec<MediaItem>, CatalogError> {
        let lookup = self.lookup(query).await?;
        let library = self.list().await?;
        Ok(in_library_matches(lookup, &library))
    }

    async fn add(&self, item: &MediaItem, quality_profile_id: i64) -> Result<i64, CatalogError> {
        info!("Adding movie {} (tmdb {}) to radarr", item.title, item.provider_id);
        let body = self.add_body(item, quality_profile_id)?;
        let created: Created = self.client.post("api/v3/movie", &body).await?;
        Ok(created.id)
    }

    async fn remove(&self, library_id: i64) -> Result<(), CatalogError> {
        info!("Removing movie {} from radarr", library_id);
        self.client
            .delete(
                &format!("api/v3/movie/{}", library_id),
                &[("deleteFiles", "true"), ("addImportExclusion", "false")],
            )
            .await
    }

    async fn quality_profiles(&self) -> Result<Vec<QualityProfile>, CatalogError> {
        let entries: Vec<QualityProfileEntry> = self.client.fetch("api/v3/qualityprofile").await?;
        Ok(entries.into_iter().map(Into::into).collect())
    }

    async fn download_status(&self, library_id: i64) -> Result<DownloadStatus, CatalogError> {
        let entries: Vec<QueueEntry> = self
            .client
            .get("api/v3/queue/details", &[("movieId", library_id)])
            .await?;
        Ok(DownloadStatus::from_records(
            library_id,
            entries.into_iter().map(Into::into).collect(),
        ))
    }

    async fn system_status(&self) -> Result<ServiceStatus, CatalogError> {
        let entry: SystemStatusEntry = self.client.fetch("api/v3/system/status").await?;
        Ok(entry.into_status("Radarr"))
    }

    async fn disk_space(&self) -> Result<Vec<DiskSpace>, CatalogError> {
        let entries: Vec<DiskSpaceEntry> = self.client.fetch("api/v3/diskspace").await?;
        Ok(entries.into_iter().map(Into::into).collect())
    }
}
