//! YouTube data API client.

use anyhow::{Context, Result};
use futures::future::try_join_all;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{DurationEntry, HostMetadata, ThumbnailEntry, VideoMetadataSource};
use crate::catalog::ThumbnailSet;
use crate::config::VideoHostSettings;
use crate::error::{PortalError, PortalResult};
use crate::server::metrics::record_upstream_request;

const HOST_SERVICE: &str = "video host";
const METRIC_SERVICE: &str = "video_host";

/// The videos.list endpoint caps one call at 50 ids.
const MAX_IDS_PER_REQUEST: usize = 50;

lazy_static! {
    // ISO-8601 durations as the host emits them: PT1H2M3S and truncations.
    static ref DURATION_RE: Regex = Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$")
        .expect("Failed to compile duration regex");
}

/// Parse a `PT#H#M#S` duration into seconds. Anything outside that shape
/// (including day-based durations) yields `None`.
pub fn parse_iso8601_duration(raw: &str) -> Option<u64> {
    let captures = DURATION_RE.captures(raw)?;
    if captures.get(1).is_none() && captures.get(2).is_none() && captures.get(3).is_none() {
        return None;
    }
    let part = |idx: usize| {
        captures
            .get(idx)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    Some(part(1) * 3600 + part(2) * 60 + part(3))
}

#[derive(Debug, Deserialize)]
struct VideosListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: Option<String>,
    snippet: Option<Snippet>,
    #[serde(rename = "contentDetails")]
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    thumbnails: Option<ThumbnailSet>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

/// Batch loader for hosted video metadata (snippet + contentDetails).
pub struct YouTubeClient {
    http: reqwest::Client,
    api_base_url: String,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(settings: &VideoHostSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_sec))
            .build()
            .context("Failed to create video host HTTP client")?;

        Ok(Self {
            http,
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }

    async fn fetch_chunk(&self, ids: &[String]) -> PortalResult<VideosListResponse> {
        let url = format!("{}/videos", self.api_base_url);

        let started = Instant::now();
        let result = self
            .http
            .get(&url)
            .query(&[
                ("part", "snippet,contentDetails"),
                ("id", ids.join(",").as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                record_upstream_request(METRIC_SERVICE, "transport_error", started.elapsed());
                return Err(PortalError::upstream(HOST_SERVICE, err));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            record_upstream_request(METRIC_SERVICE, "error", started.elapsed());
            return Err(PortalError::UpstreamUnavailable {
                service: HOST_SERVICE,
                reason: format!("videos endpoint answered {}: {}", status, body),
            });
        }

        record_upstream_request(METRIC_SERVICE, "success", started.elapsed());
        response
            .json()
            .await
            .map_err(|err| PortalError::malformed("video metadata", err))
    }
}

#[async_trait::async_trait]
impl VideoMetadataSource for YouTubeClient {
    async fn load(&self, resource_ids: &[String]) -> PortalResult<HostMetadata> {
        if resource_ids.is_empty() {
            return Ok(HostMetadata::default());
        }

        debug!("Loading host metadata for {} videos...", resource_ids.len());
        let chunks = resource_ids
            .chunks(MAX_IDS_PER_REQUEST)
            .map(|chunk| self.fetch_chunk(chunk));
        let responses = try_join_all(chunks).await?;

        let mut thumbnails = Vec::new();
        let mut durations = Vec::new();
        for item in responses.into_iter().flat_map(|r| r.items) {
            let Some(resource_id) = item.id else {
                continue;
            };

            if let Some(set) = item.snippet.and_then(|s| s.thumbnails) {
                if !set.is_empty() {
                    thumbnails.push(ThumbnailEntry {
                        resource_id: resource_id.clone(),
                        thumbnails: set,
                    });
                }
            }

            if let Some(raw) = item.content_details.and_then(|c| c.duration) {
                match parse_iso8601_duration(&raw) {
                    Some(seconds) => durations.push(DurationEntry {
                        resource_id: resource_id.clone(),
                        seconds,
                    }),
                    None => warn!(
                        "Unparsable duration {:?} for hosted video {}",
                        raw, resource_id
                    ),
                }
            }
        }

        Ok(HostMetadata::new(thumbnails, durations))
    }
}
