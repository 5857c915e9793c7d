use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use super::models::{HistoryEntry, UserHistory};
use crate::crm::CrmQueryClient;
use crate::error::PortalResult;

const WATCHED_OBJECT: &str = "WatchedVideo__c";
const PURCHASED_OBJECT: &str = "MediaPurchase__c";

/// Loads a user's watched and purchased feeds.
#[async_trait::async_trait]
pub trait HistorySource: Send + Sync {
    async fn load_history(
        &self,
        instance_url: &str,
        access_token: &str,
        user_id: &str,
    ) -> PortalResult<UserHistory>;
}

/// Queries both history objects with the caller's session and merges the
/// results into one [`UserHistory`].
pub struct CrmHistorySource {
    query: Arc<CrmQueryClient>,
}

impl CrmHistorySource {
    pub fn new(query: Arc<CrmQueryClient>) -> Self {
        Self { query }
    }
}

#[async_trait::async_trait]
impl HistorySource for CrmHistorySource {
    async fn load_history(
        &self,
        instance_url: &str,
        access_token: &str,
        user_id: &str,
    ) -> PortalResult<UserHistory> {
        let watched_soql = history_query(WATCHED_OBJECT, user_id);
        let purchased_soql = history_query(PURCHASED_OBJECT, user_id);

        // Both feeds load concurrently but the merge happens in one place,
        // after both have arrived.
        let (watched, purchased) = tokio::join!(
            self.query.query(instance_url, access_token, &watched_soql),
            self.query.query(instance_url, access_token, &purchased_soql),
        );
        let watched = records_or_empty(watched?.records, WATCHED_OBJECT);
        let purchased = records_or_empty(purchased?.records, PURCHASED_OBJECT);

        let mut history = UserHistory::new(user_id);
        for record in &watched {
            match HistoryEntry::from_record(record) {
                Some(entry) => history.add_watched(entry),
                None => warn!("Skipping an undecodable {WATCHED_OBJECT} record"),
            }
        }
        for record in &purchased {
            match HistoryEntry::from_record(record) {
                Some(entry) => history.add_purchased(entry),
                None => warn!("Skipping an undecodable {PURCHASED_OBJECT} record"),
            }
        }
        Ok(history)
    }
}

fn history_query(object: &str, user_id: &str) -> String {
    format!(
        "SELECT ResourceID__c, Timestamp__c FROM {} WHERE User__c = '{}' \
         ORDER BY Timestamp__c DESC",
        object,
        soql_literal(user_id)
    )
}

fn records_or_empty(records: Option<Vec<Value>>, object: &str) -> Vec<Value> {
    match records {
        Some(records) => records,
        None => {
            warn!("CRM returned null records for {object}, treating the feed as empty");
            Vec::new()
        }
    }
}

/// Escape a value for a single-quoted SOQL string literal.
fn soql_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
