//! Portal-wide error taxonomy.
//!
//! Upstream clients map transport failures, auth rejections and undecodable
//! payloads into these kinds so that route handlers can propagate with `?`
//! and the caller receives a typed failure instead of a request that hangs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::server::metrics::record_error;

pub type PortalResult<T> = Result<T, PortalError>;

#[derive(Debug, Error)]
pub enum PortalError {
    /// The CRM rejected the credentials: an expired session token, a revoked
    /// consumer key or a stale authorization code.
    #[error("CRM authorization expired or rejected: {0}")]
    AuthExpired(String),

    /// The upstream service could not be reached or answered outside 2xx.
    #[error("{service} unavailable: {reason}")]
    UpstreamUnavailable {
        service: &'static str,
        reason: String,
    },

    /// The upstream answered but the payload did not decode into the
    /// expected shape.
    #[error("malformed {context} payload: {reason}")]
    MalformedRecord {
        context: &'static str,
        reason: String,
    },

    /// The caller's request was missing or contradicting a required
    /// parameter.
    #[error("{0}")]
    BadRequest(String),
}

impl PortalError {
    /// Map a reqwest transport error against `service` into the taxonomy.
    pub fn upstream(service: &'static str, err: reqwest::Error) -> Self {
        let reason = if err.is_timeout() {
            "request timed out".to_string()
        } else {
            err.to_string()
        };
        PortalError::UpstreamUnavailable { service, reason }
    }

    pub fn malformed(context: &'static str, err: impl std::fmt::Display) -> Self {
        PortalError::MalformedRecord {
            context,
            reason: err.to_string(),
        }
    }

    /// Stable identifier used in response bodies and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            PortalError::AuthExpired(_) => "auth_expired",
            PortalError::UpstreamUnavailable { .. } => "upstream_unavailable",
            PortalError::MalformedRecord { .. } => "malformed_record",
            PortalError::BadRequest(_) => "bad_request",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            PortalError::AuthExpired(_) => StatusCode::UNAUTHORIZED,
            PortalError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            PortalError::MalformedRecord { .. } => StatusCode::BAD_GATEWAY,
            PortalError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        warn!("Request failed ({}): {}", kind, self);
        record_error(kind, "http");

        let body = Json(json!({
            "error": kind,
            "detail": self.to_string(),
        }));
        (status, body).into_response()
    }
}
