mod client;
mod error;
mod model;
pub mod radarr;
pub mod sonarr;
mod wire;

pub use client::ArrClient;
pub use error::CatalogError;
pub use model::*;

use async_trait::async_trait;

/// Uniform contract over one media catalog backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogService: Send + Sync {
    fn kind(&self) -> MediaKind;

    async fn list(&self) -> Result<Vec<MediaItem>, CatalogError>;

    async fn lookup(&self, query: &str) -> Result<Vec<MediaItem>, CatalogError>;

    /// Lookup results that are already part of the library, in lookup order.
    async fn details_in_library(&self, query: &str) -> Result<Vec<MediaItem>, CatalogError>;

    /// Adds the item and returns its new library id.
    async fn add(&self, item: &MediaItem, quality_profile_id: i64) -> Result<i64, CatalogError>;

    async fn remove(&self, library_id: i64) -> Result<(), CatalogError>;

    async fn quality_profiles(&self) -> Result<Vec<QualityProfile>, CatalogError>;

    async fn download_status(&self, library_id: i64) -> Result<DownloadStatus, CatalogError>;

    async fn system_status(&self) -> Result<ServiceStatus, CatalogError>;

    async fn disk_space(&self) -> Result<Vec<DiskSpace>, CatalogError>;
}

/// Keeps the lookup entries whose provider id is present in the library, carrying the library id over.
pub fn in_library_matches(lookup: Vec<MediaItem>, library: &[MediaItem]) -> Vec<MediaItem> {
    lookup
        .into_iter()
        .filter_map(|mut item| {
            let owned = library.iter().find(|l| l.provider_id == item.provider_id)?;
            item.library_id = owned.library_id;
            item.in_library = true;
            item.details = owned.details.clone();
            Some(item)
        })
        .collect()
}
