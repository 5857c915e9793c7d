use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One thumbnail rendition offered by the video host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// All renditions the host returned for one video, keyed by size name
/// ("default", "medium", "high", ...).
pub type ThumbnailSet = BTreeMap<String, Thumbnail>;

/// The event a video was recorded at, as the CRM nests it on the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRef {
    pub id: Option<String>,
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
}

/// A catalog video. Created from one CRM media record and mutated at most
/// twice afterwards, when the host metadata is merged in. Never removed from
/// a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Video {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<EventRef>,
    pub speakers: Vec<String>,
    /// Opaque join key against the video host; the only thing linking a CRM
    /// record to its hosted metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub published: bool,
    pub is_public: bool,
    /// Best-available thumbnail URL; the configured default until the host
    /// supplies one.
    pub thumbnail_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<ThumbnailSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<u64>,
}

// Order of preference when flattening a rendition set to one URL.
const THUMBNAIL_SIZES: [&str; 5] = ["maxres", "standard", "high", "medium", "default"];

impl Video {
    pub fn from_record(record: MediaRecord, default_thumbnail_url: &str) -> Self {
        let event = match (&record.event_id, record.event) {
            (None, None) => None,
            (id, nested) => Some(EventRef {
                id: id.clone(),
                name: nested.as_ref().and_then(|e| e.name.clone()),
                start_date: nested
                    .as_ref()
                    .and_then(|e| e.start_date.as_deref())
                    .and_then(parse_crm_date),
            }),
        };

        Video {
            id: record.id,
            name: record.name.unwrap_or_default(),
            description: record.description,
            event,
            speakers: split_speakers(record.speakers.as_deref()),
            resource_id: record.resource_id.filter(|id| !id.is_empty()),
            date: record.date.as_deref().and_then(parse_crm_date),
            published: record.published.unwrap_or(false),
            is_public: record.is_public.unwrap_or(false),
            thumbnail_url: default_thumbnail_url.to_string(),
            thumbnails: None,
            duration_sec: None,
        }
    }

    pub fn set_thumbnail(&mut self, set: ThumbnailSet) {
        if let Some(best) = pick_best_thumbnail(&set) {
            self.thumbnail_url = best;
        }
        self.thumbnails = Some(set);
    }

    pub fn set_duration(&mut self, seconds: u64) {
        self.duration_sec = Some(seconds);
    }

    /// Distinct resource ids across `videos`, in first-seen order.
    pub fn collect_resource_ids(videos: &[Video]) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut ids = Vec::new();
        for video in videos {
            if let Some(id) = &video.resource_id {
                if seen.insert(id.clone()) {
                    ids.push(id.clone());
                }
            }
        }
        ids
    }
}

fn pick_best_thumbnail(set: &ThumbnailSet) -> Option<String> {
    for size in THUMBNAIL_SIZES {
        if let Some(thumb) = set.get(size) {
            return Some(thumb.url.clone());
        }
    }
    set.values().next().map(|thumb| thumb.url.clone())
}

fn split_speakers(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_crm_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Raw shape of one CRM media record. Everything except the record id is
/// optional so partially filled records still parse.
#[derive(Debug, Deserialize)]
pub struct MediaRecord {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Description__c", default)]
    pub description: Option<String>,
    #[serde(rename = "Event__c", default)]
    pub event_id: Option<String>,
    #[serde(rename = "Event__r", default)]
    pub event: Option<EventRecord>,
    #[serde(rename = "Speakers__c", default)]
    pub speakers: Option<String>,
    #[serde(rename = "ResourceId__c", default)]
    pub resource_id: Option<String>,
    #[serde(rename = "Date__c", default)]
    pub date: Option<String>,
    #[serde(rename = "Published__c", default)]
    pub published: Option<bool>,
    #[serde(rename = "IsPublic__c", default)]
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Start_Date__c", default)]
    pub start_date: Option<String>,
}
