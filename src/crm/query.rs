//! SOQL query client for the CRM REST data API.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::{PortalError, PortalResult};
use crate::server::metrics::record_upstream_request;

const CRM_SERVICE: &str = "CRM";
const METRIC_SERVICE: &str = "crm_query";

/// Response envelope of the CRM query endpoint. Records stay raw JSON; the
/// callers decide what shape to impose on them.
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default, rename = "totalSize")]
    pub total_size: Option<u64>,
    #[serde(default)]
    pub done: Option<bool>,
    /// Null when the token cannot see the queried object at all.
    #[serde(default)]
    pub records: Option<Vec<Value>>,
}

/// Executes SOQL against whatever instance a token grant points at. The
/// client itself is credential-free: instance URL and bearer token arrive
/// per call because session queries and application queries use different
/// grants.
pub struct CrmQueryClient {
    http: reqwest::Client,
    api_version: String,
}

impl CrmQueryClient {
    pub fn new(api_version: &str, timeout_sec: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create CRM query HTTP client")?;
        Ok(Self {
            http,
            api_version: api_version.to_string(),
        })
    }

    /// Run one SOQL query. Only the first page is fetched; none of the
    /// portal's queries paginate.
    pub async fn query(
        &self,
        instance_url: &str,
        access_token: &str,
        soql: &str,
    ) -> PortalResult<QueryResponse> {
        let url = format!(
            "{}/services/data/{}/query?q={}",
            instance_url.trim_end_matches('/'),
            self.api_version,
            urlencoding::encode(soql),
        );
        debug!("CRM query: {}", soql);

        let started = Instant::now();
        let response = match self.http.get(&url).bearer_auth(access_token).send().await {
            Ok(response) => response,
            Err(err) => {
                record_upstream_request(METRIC_SERVICE, "transport_error", started.elapsed());
                return Err(PortalError::upstream(CRM_SERVICE, err));
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            record_upstream_request(METRIC_SERVICE, "auth_rejected", started.elapsed());
            return Err(PortalError::AuthExpired(format!(
                "query rejected with {}, check the access token",
                status
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            record_upstream_request(METRIC_SERVICE, "error", started.elapsed());
            return Err(PortalError::UpstreamUnavailable {
                service: CRM_SERVICE,
                reason: format!("query endpoint answered {}: {}", status, body),
            });
        }

        record_upstream_request(METRIC_SERVICE, "success", started.elapsed());
        response
            .json()
            .await
            .map_err(|err| PortalError::malformed("query", err))
    }
}
