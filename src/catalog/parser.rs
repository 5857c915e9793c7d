//! Turns the raw record array of the media query into catalog videos.

use serde_json::Value;
use tracing::warn;

use super::models::{MediaRecord, Video};

/// Record parser with a one-way readiness flag.
///
/// `is_initialized` starts false and flips to true when a parse completes;
/// it never reverts. The shell reports it so a front-end knows when to drop
/// its splash screen.
#[derive(Debug)]
pub struct VideoDataParser {
    default_thumbnail_url: String,
    videos: Vec<Video>,
    skipped: usize,
    initialized: bool,
}

impl VideoDataParser {
    pub fn new(default_thumbnail_url: &str) -> Self {
        Self {
            default_thumbnail_url: default_thumbnail_url.to_string(),
            videos: Vec::new(),
            skipped: 0,
            initialized: false,
        }
    }

    /// Parse one record array. A record that does not decode (above all, one
    /// without an Id) is skipped and counted, never fatal; missing optional
    /// fields are not an error at all.
    pub fn parse(&mut self, records: &[Value]) {
        let mut videos = Vec::with_capacity(records.len());
        let mut skipped = 0usize;

        for record in records {
            match serde_json::from_value::<MediaRecord>(record.clone()) {
                Ok(media) => videos.push(Video::from_record(media, &self.default_thumbnail_url)),
                Err(err) => {
                    skipped += 1;
                    warn!("Skipping malformed media record: {}", err);
                }
            }
        }

        self.videos = videos;
        self.skipped = skipped;
        self.initialized = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn videos(&self) -> &[Video] {
        &self.videos
    }

    /// Records dropped by the last parse.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn into_videos(self) -> Vec<Video> {
        self.videos
    }
}
