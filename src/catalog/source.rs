use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use super::service::{MediaRecordSource, MEDIA_QUERY};
use crate::crm::{CrmOAuthClient, CrmQueryClient};
use crate::error::PortalResult;

/// Fetches media records from the CRM behind a client-credentials token.
/// Every fetch obtains a fresh application token; the CRM hands tokens out
/// cheaply and this sidesteps expiry tracking.
pub struct CrmMediaSource {
    oauth: Arc<CrmOAuthClient>,
    query: Arc<CrmQueryClient>,
}

impl CrmMediaSource {
    pub fn new(oauth: Arc<CrmOAuthClient>, query: Arc<CrmQueryClient>) -> Self {
        Self { oauth, query }
    }
}

#[async_trait::async_trait]
impl MediaRecordSource for CrmMediaSource {
    async fn fetch_media_records(&self) -> PortalResult<Vec<Value>> {
        let token = self.oauth.client_credentials().await?;
        let response = self
            .query
            .query(&token.instance_url, &token.access_token, MEDIA_QUERY)
            .await?;
        match response.records {
            Some(records) => Ok(records),
            None => {
                warn!("CRM returned null records for the media query, treating as empty");
                Ok(Vec::new())
            }
        }
    }
}
