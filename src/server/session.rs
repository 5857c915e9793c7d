use super::state::ServerState;
use super::ServerConfig;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header::HeaderMap, request::Parts, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::convert::Infallible;
use tracing::debug;

pub const COOKIE_INSTANCE_URL_KEY: &str = "instanceUrl";
pub const COOKIE_ACCESS_TOKEN_KEY: &str = "accessToken";

const SESSION_TTL: time::Duration = time::Duration::hours(24);

/// A CRM session, carried by the cookie pair the OAuth callback sets. The
/// portal stores nothing server-side; the cookies are the whole session.
#[derive(Debug, Clone)]
pub struct Session {
    pub instance_url: String,
    pub access_token: String,
}

pub enum SessionExtractionError {
    AccessDenied,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> axum::response::Response {
        match self {
            SessionExtractionError::AccessDenied => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

/// Build one of the session cookie pair, hardened and expiring in 24h.
pub fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(SESSION_TTL)
        .build()
}

/// An empty cookie with an expiry in the past; browsers drop it on receipt.
pub fn expired_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1))
        .build()
}

fn session_from_cookies(headers: &HeaderMap) -> Option<Session> {
    let jar = CookieJar::from_headers(headers);
    let instance_url = jar.get(COOKIE_INSTANCE_URL_KEY).map(Cookie::value)?;
    let access_token = jar.get(COOKIE_ACCESS_TOKEN_KEY).map(Cookie::value)?;
    Some(Session {
        instance_url: instance_url.to_string(),
        access_token: access_token.to_string(),
    })
}

#[cfg(feature = "session-override")]
fn override_session(config: &ServerConfig) -> Option<Session> {
    config.session_override.as_ref().map(|settings| Session {
        instance_url: settings.instance_url.clone(),
        access_token: settings.access_token.clone(),
    })
}

#[cfg(not(feature = "session-override"))]
fn override_session(_config: &ServerConfig) -> Option<Session> {
    None
}

fn extract_session_from_request_parts(parts: &Parts, ctx: &ServerState) -> Option<Session> {
    if let Some(session) = override_session(&ctx.config) {
        debug!("Using the configured session override");
        return Some(session);
    }

    match session_from_cookies(&parts.headers) {
        Some(session) => {
            debug!("Got a session for instance {}", session.instance_url);
            Some(session)
        }
        None => {
            debug!("No session cookie pair on the request");
            None
        }
    }
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx)
            .ok_or(SessionExtractionError::AccessDenied)
    }
}

// Lets handlers take `Option<Session>` and branch on login state themselves.
impl OptionalFromRequestParts<ServerState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(extract_session_from_request_parts(parts, ctx))
    }
}
