use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One watched or purchased item. `resource_id` is the video host id, the
/// same key the catalog carries, so the frontend can join the two.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub resource_id: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl HistoryEntry {
    /// Decode one CRM history record. Records without a usable resource id
    /// cannot be joined to anything and yield `None`.
    pub fn from_record(record: &Value) -> Option<Self> {
        let decoded: HistoryRecord = serde_json::from_value(record.clone()).ok()?;
        let resource_id = decoded.resource_id.filter(|id| !id.is_empty())?;
        let timestamp = decoded.timestamp.as_deref().and_then(parse_crm_datetime);
        Some(Self {
            resource_id,
            timestamp,
        })
    }
}

/// Both history feeds for one user, merged in a single place.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserHistory {
    pub user_id: String,
    pub watched: Vec<HistoryEntry>,
    pub purchased: Vec<HistoryEntry>,
}

impl UserHistory {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            ..Default::default()
        }
    }

    pub fn add_watched(&mut self, entry: HistoryEntry) {
        self.watched.push(entry);
    }

    pub fn add_purchased(&mut self, entry: HistoryEntry) {
        self.purchased.push(entry);
    }
}

// The history objects spell the field "ResourceID__c" while the media object
// uses "ResourceId__c". The upstream schema really is inconsistent.
#[derive(Debug, Deserialize)]
struct HistoryRecord {
    #[serde(rename = "ResourceID__c", default)]
    resource_id: Option<String>,
    #[serde(rename = "Timestamp__c", default)]
    timestamp: Option<String>,
}

/// CRM timestamps come back as `2024-03-05T18:22:41.000+0000`; plain
/// RFC 3339 is accepted as well.
pub fn parse_crm_datetime(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}
