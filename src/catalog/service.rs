//! Catalog assembly pipeline and snapshot cache.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use super::cache::MetadataCache;
use super::models::{ThumbnailSet, Video};
use super::parser::VideoDataParser;
use crate::error::PortalResult;
use crate::server::metrics::{record_catalog_refresh, set_catalog_size};
use crate::videohost::VideoMetadataSource;

/// The catalog query, ordered so the newest events come first.
pub const MEDIA_QUERY: &str = "SELECT Id, Name, Description__c, Event__c, Event__r.Name, \
     Event__r.Start_Date__c, Speakers__c, ResourceId__c, Date__c, Published__c, IsPublic__c \
     FROM Media__c ORDER BY Event__r.Start_Date__c DESC NULLS LAST";

/// Source of raw media records (the CRM behind the application token).
#[async_trait::async_trait]
pub trait MediaRecordSource: Send + Sync {
    async fn fetch_media_records(&self) -> PortalResult<Vec<Value>>;
}

/// One fully assembled catalog: parsed videos with host metadata merged in.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub videos: Vec<Video>,
    pub skipped_records: usize,
    pub refreshed_at: DateTime<Utc>,
}

/// Owns the pipeline: media query, parse, metadata batch load, merge.
///
/// The first successful assembly flips the service to initialized and that
/// never reverts; a failing refresh keeps the previous snapshot. Handlers
/// never hold the snapshot lock across an upstream await.
pub struct CatalogService {
    media: Arc<dyn MediaRecordSource>,
    metadata: Arc<dyn VideoMetadataSource>,
    default_thumbnail_url: String,
    snapshot: RwLock<Option<Arc<CatalogSnapshot>>>,
    refresh_guard: Mutex<()>,
}

impl CatalogService {
    pub fn new(
        media: Arc<dyn MediaRecordSource>,
        metadata: Arc<dyn VideoMetadataSource>,
        default_thumbnail_url: &str,
    ) -> Self {
        Self {
            media,
            metadata,
            default_thumbnail_url: default_thumbnail_url.to_string(),
            snapshot: RwLock::new(None),
            refresh_guard: Mutex::new(()),
        }
    }

    pub async fn is_initialized(&self) -> bool {
        self.snapshot.read().await.is_some()
    }

    /// Serve the current snapshot, assembling one on first use. Concurrent
    /// first calls share a single assembly instead of stampeding the
    /// upstreams.
    pub async fn ensure_loaded(&self) -> PortalResult<Arc<CatalogSnapshot>> {
        if let Some(snapshot) = self.snapshot.read().await.clone() {
            return Ok(snapshot);
        }

        let _guard = self.refresh_guard.lock().await;
        if let Some(snapshot) = self.snapshot.read().await.clone() {
            return Ok(snapshot);
        }
        self.assemble_and_store().await
    }

    /// Re-run the pipeline and atomically replace the snapshot.
    pub async fn refresh(&self) -> PortalResult<Arc<CatalogSnapshot>> {
        let _guard = self.refresh_guard.lock().await;
        self.assemble_and_store().await
    }

    async fn assemble_and_store(&self) -> PortalResult<Arc<CatalogSnapshot>> {
        match self.assemble().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                record_catalog_refresh("success");
                set_catalog_size(snapshot.videos.len(), snapshot.skipped_records);
                *self.snapshot.write().await = Some(snapshot.clone());
                Ok(snapshot)
            }
            Err(err) => {
                record_catalog_refresh("error");
                Err(err)
            }
        }
    }

    async fn assemble(&self) -> PortalResult<CatalogSnapshot> {
        let records = self.media.fetch_media_records().await?;

        let mut parser = VideoDataParser::new(&self.default_thumbnail_url);
        parser.parse(&records);
        let skipped_records = parser.skipped();
        let mut videos = parser.into_videos();

        let resource_ids = Video::collect_resource_ids(&videos);
        info!(
            "Parsed {} videos ({} records skipped), enriching {} resource ids",
            videos.len(),
            skipped_records,
            resource_ids.len()
        );

        let metadata = self.metadata.load(&resource_ids).await?;

        let mut thumbs: MetadataCache<ThumbnailSet> = MetadataCache::new();
        for entry in metadata.thumbnails() {
            thumbs.set(&entry.resource_id, entry.thumbnails.clone());
        }
        let mut durations: MetadataCache<u64> = MetadataCache::new();
        for entry in metadata.durations() {
            durations.set(&entry.resource_id, entry.seconds);
        }

        for video in videos.iter_mut() {
            let Some(resource_id) = video.resource_id.clone() else {
                continue;
            };
            if let Some(set) = thumbs.get(&resource_id) {
                video.set_thumbnail(set.clone());
            }
            if let Some(seconds) = durations.get(&resource_id) {
                video.set_duration(*seconds);
            }
        }

        Ok(CatalogSnapshot {
            videos,
            skipped_records,
            refreshed_at: Utc::now(),
        })
    }
}
