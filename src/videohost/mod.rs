//! Video host metadata loading.
//!
//! The host (YouTube's data API) is the second upstream: CRM records carry a
//! resource id pointing at a hosted video, and the portal batch-fetches
//! thumbnails and durations for all of them in one pass per catalog
//! assembly.

mod youtube;

pub use youtube::{parse_iso8601_duration, YouTubeClient};

use crate::catalog::ThumbnailSet;
use crate::error::PortalResult;

#[derive(Debug, Clone)]
pub struct ThumbnailEntry {
    pub resource_id: String,
    pub thumbnails: ThumbnailSet,
}

#[derive(Debug, Clone)]
pub struct DurationEntry {
    pub resource_id: String,
    pub seconds: u64,
}

/// Result of one batch load. Ids the host did not return simply have no
/// entry; the merge then leaves the video's defaults in place.
#[derive(Debug, Clone, Default)]
pub struct HostMetadata {
    thumbnails: Vec<ThumbnailEntry>,
    durations: Vec<DurationEntry>,
}

impl HostMetadata {
    pub fn new(thumbnails: Vec<ThumbnailEntry>, durations: Vec<DurationEntry>) -> Self {
        Self {
            thumbnails,
            durations,
        }
    }

    pub fn thumbnails(&self) -> &[ThumbnailEntry] {
        &self.thumbnails
    }

    pub fn durations(&self) -> &[DurationEntry] {
        &self.durations
    }
}

/// Seam between the catalog pipeline and the concrete host API, so tests
/// can substitute canned metadata.
#[async_trait::async_trait]
pub trait VideoMetadataSource: Send + Sync {
    async fn load(&self, resource_ids: &[String]) -> PortalResult<HostMetadata>;
}
