//! OAuth2 client for the CRM token endpoints.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::CrmSettings;
use crate::error::{PortalError, PortalResult};
use crate::server::metrics::record_upstream_request;

const CRM_SERVICE: &str = "CRM";
const METRIC_SERVICE: &str = "crm_token";
const INTROSPECT_PATH: &str = "/services/oauth2/introspect";

/// A token grant as the CRM returns it. Unknown fields are preserved in
/// `extra` because `/connect` relays the grant verbatim to the caller.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub instance_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Drives the two OAuth2 grants the portal uses (authorization code for user
/// sessions, client credentials for the application token) plus token
/// introspection. All calls are form-encoded POSTs.
pub struct CrmOAuthClient {
    http: reqwest::Client,
    settings: CrmSettings,
}

impl CrmOAuthClient {
    pub fn new(settings: CrmSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_sec))
            .build()
            .context("Failed to create CRM HTTP client")?;
        Ok(Self { http, settings })
    }

    /// The CRM authorization page URL the browser is sent to on login.
    pub fn authorize_redirect_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&state={}",
            self.settings.authorize_url,
            urlencoding::encode(&self.settings.client_id),
            urlencoding::encode(&self.settings.callback_url),
            urlencoding::encode(state),
        )
    }

    /// Exchange the authorization code from the login callback for a session
    /// token. The `redirect_uri` must repeat the value used on the authorize
    /// redirect or the CRM rejects the grant.
    pub async fn exchange_authorization_code(&self, code: &str) -> PortalResult<TokenResponse> {
        debug!("Exchanging authorization code with the CRM...");
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
            ("redirect_uri", self.settings.callback_url.as_str()),
        ];
        decode_token(self.post_form(&self.settings.token_url, &params).await?)
    }

    /// Obtain the application token used for catalog queries, as raw JSON.
    pub async fn client_credentials_raw(&self) -> PortalResult<Value> {
        debug!("Requesting application token from the CRM...");
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.settings.application_client_id.as_str()),
            (
                "client_secret",
                self.settings.application_client_secret.as_str(),
            ),
        ];
        self.post_form(&self.settings.application_token_url, &params)
            .await
    }

    pub async fn client_credentials(&self) -> PortalResult<TokenResponse> {
        decode_token(self.client_credentials_raw().await?)
    }

    /// Ask the session's instance whether `access_token` is still active.
    pub async fn introspect(&self, instance_url: &str, access_token: &str) -> PortalResult<Value> {
        let url = format!("{}{}", instance_url.trim_end_matches('/'), INTROSPECT_PATH);
        let params = [
            ("token", access_token),
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
            ("token_type_hint", "access_token"),
        ];
        self.post_form(&url, &params).await
    }

    async fn post_form(&self, url: &str, params: &[(&str, &str)]) -> PortalResult<Value> {
        let started = Instant::now();
        let response = match self.http.post(url).form(params).send().await {
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
                "token endpoint answered {}",
                status
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // The CRM reports stale or replayed codes as 400 invalid_grant.
            if body.contains("invalid_grant") {
                record_upstream_request(METRIC_SERVICE, "auth_rejected", started.elapsed());
                return Err(PortalError::AuthExpired(format!("grant rejected: {}", body)));
            }
            record_upstream_request(METRIC_SERVICE, "error", started.elapsed());
            return Err(PortalError::UpstreamUnavailable {
                service: CRM_SERVICE,
                reason: format!("token endpoint answered {}: {}", status, body),
            });
        }

        record_upstream_request(METRIC_SERVICE, "success", started.elapsed());
        response
            .json()
            .await
            .map_err(|err| PortalError::malformed("token", err))
    }
}

fn decode_token(value: Value) -> PortalResult<TokenResponse> {
    serde_json::from_value(value).map_err(|err| PortalError::malformed("token", err))
}
