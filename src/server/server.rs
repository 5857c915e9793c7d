use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::{error, info};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use tower_http::services::{ServeDir, ServeFile};

use super::metrics::metrics_handler;
use super::session::{
    expired_cookie, session_cookie, Session, COOKIE_ACCESS_TOKEN_KEY, COOKIE_INSTANCE_URL_KEY,
};
use super::state::*;
use super::{http_cache, log_requests, ServerConfig};
use crate::catalog::{CatalogService, Video};
use crate::crm::CrmOAuthClient;
use crate::error::{PortalError, PortalResult};
use crate::user::{HistorySource, UserHistory};

/// Fixed state value for the authorize redirect. The callback rejects an
/// echo that disagrees with it.
const LOGIN_STATE: &str = "portal_auth";

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub logged_in: bool,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct OAuthCallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

#[derive(Serialize)]
struct MenuItem {
    id: &'static str,
    label: &'static str,
    route: &'static str,
    visible: bool,
}

#[derive(Serialize)]
struct ShellResponse {
    logged_in: bool,
    catalog_ready: bool,
    menu: Vec<MenuItem>,
}

#[derive(Serialize)]
struct RefreshOutcome {
    videos: usize,
    skipped_records: usize,
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        logged_in: session.is_some(),
    };
    Json(stats)
}

async fn login(State(oauth): State<GuardedOAuthClient>) -> Redirect {
    Redirect::temporary(&oauth.authorize_redirect_url(LOGIN_STATE))
}

async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    let jar = jar
        .add(expired_cookie(COOKIE_INSTANCE_URL_KEY))
        .add(expired_cookie(COOKIE_ACCESS_TOKEN_KEY));
    (jar, Redirect::to("/"))
}

async fn oauth_callback(
    State(oauth): State<GuardedOAuthClient>,
    Query(params): Query<OAuthCallbackParams>,
    jar: CookieJar,
) -> PortalResult<(CookieJar, Redirect)> {
    if let Some(state) = &params.state {
        if state != LOGIN_STATE {
            return Err(PortalError::BadRequest(
                "state does not match the value sent with the login redirect".to_string(),
            ));
        }
    }
    let code = params
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| PortalError::BadRequest("missing code parameter".to_string()))?;

    let token = oauth.exchange_authorization_code(&code).await?;
    info!("Authorization code exchanged, setting session cookies");

    let jar = jar
        .add(session_cookie(COOKIE_INSTANCE_URL_KEY, token.instance_url))
        .add(session_cookie(COOKIE_ACCESS_TOKEN_KEY, token.access_token));
    Ok((jar, Redirect::to("/")))
}

async fn connect(State(oauth): State<GuardedOAuthClient>) -> PortalResult<Json<Value>> {
    let token = oauth.client_credentials_raw().await?;
    Ok(Json(token))
}

async fn introspect(
    session: Session,
    State(oauth): State<GuardedOAuthClient>,
) -> PortalResult<Json<Value>> {
    let result = oauth
        .introspect(&session.instance_url, &session.access_token)
        .await?;
    Ok(Json(result))
}

fn shell_menu(logged_in: bool) -> Vec<MenuItem> {
    let mut menu = vec![
        MenuItem {
            id: "home",
            label: "Home",
            route: "/",
            visible: true,
        },
        MenuItem {
            id: "settings",
            label: "Settings",
            route: "/settings",
            visible: false,
        },
    ];
    if logged_in {
        menu.push(MenuItem {
            id: "logout",
            label: "Logout",
            route: "/logout",
            visible: false,
        });
    } else {
        menu.push(MenuItem {
            id: "login",
            label: "Login",
            route: "/login",
            visible: false,
        });
    }
    menu
}

async fn get_shell(
    session: Option<Session>,
    State(catalog): State<GuardedCatalogService>,
) -> Json<ShellResponse> {
    let logged_in = session.is_some();
    Json(ShellResponse {
        logged_in,
        catalog_ready: catalog.is_initialized().await,
        menu: shell_menu(logged_in),
    })
}

async fn get_videos(
    session: Option<Session>,
    State(catalog): State<GuardedCatalogService>,
) -> PortalResult<Json<Vec<Video>>> {
    let snapshot = catalog.ensure_loaded().await?;
    let videos: Vec<Video> = if session.is_some() {
        snapshot.videos.clone()
    } else {
        snapshot
            .videos
            .iter()
            .filter(|video| video.is_public)
            .cloned()
            .collect()
    };
    Ok(Json(videos))
}

async fn get_video(
    session: Option<Session>,
    State(catalog): State<GuardedCatalogService>,
    Path(id): Path<String>,
) -> PortalResult<Response> {
    let snapshot = catalog.ensure_loaded().await?;
    let video = snapshot
        .videos
        .iter()
        .find(|video| video.id == id && (session.is_some() || video.is_public));
    Ok(match video {
        Some(video) => Json(video).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    })
}

async fn refresh_catalog(
    _session: Session,
    State(catalog): State<GuardedCatalogService>,
) -> PortalResult<Json<RefreshOutcome>> {
    let snapshot = catalog.refresh().await?;
    info!(
        "Catalog refreshed: {} videos, {} records skipped",
        snapshot.videos.len(),
        snapshot.skipped_records
    );
    Ok(Json(RefreshOutcome {
        videos: snapshot.videos.len(),
        skipped_records: snapshot.skipped_records,
    }))
}

async fn get_user_history(
    session: Session,
    State(state): State<ServerState>,
) -> PortalResult<Json<UserHistory>> {
    let user_id = state.config.default_user_id.clone();
    if user_id.is_empty() {
        return Err(PortalError::BadRequest(
            "crm.default_user_id is not configured".to_string(),
        ));
    }
    let history = state
        .history
        .load_history(&session.instance_url, &session.access_token, &user_id)
        .await?;
    Ok(Json(history))
}

impl ServerState {
    fn new(
        config: ServerConfig,
        oauth: Arc<CrmOAuthClient>,
        catalog: Arc<CatalogService>,
        history: Arc<dyn HistorySource>,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            oauth,
            catalog,
            history,
            hash: env!("GIT_HASH").to_string(),
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    oauth: Arc<CrmOAuthClient>,
    catalog: Arc<CatalogService>,
    history: Arc<dyn HistorySource>,
) -> Result<Router> {
    let state = ServerState::new(config.clone(), oauth, catalog, history);

    let auth_routes: Router = Router::new()
        .route("/login", get(login))
        .route("/logout", get(logout))
        .route("/oauth/api/request", get(oauth_callback))
        .route("/connect", get(connect))
        .route("/introspect", get(introspect))
        .with_state(state.clone());

    let catalog_routes: Router = Router::new()
        .route("/videos", get(get_videos))
        .route("/videos/{id}", get(get_video))
        .layer(middleware::from_fn_with_state(
            config.content_cache_age_sec,
            http_cache,
        ))
        .route("/refresh", post(refresh_catalog))
        .with_state(state.clone());

    let user_routes: Router = Router::new()
        .route("/history", get(get_user_history))
        .with_state(state.clone());

    let shell_routes: Router = Router::new()
        .route("/shell", get(get_shell))
        .with_state(state.clone());

    let home_router: Router = match &config.frontend_dir_path {
        Some(frontend_path) => {
            // Unknown paths fall back to index.html, the SPA routes client-side.
            let index = format!("{}/index.html", frontend_path.trim_end_matches('/'));
            let static_files_service = ServeDir::new(frontend_path)
                .append_index_html_on_directories(true)
                .fallback(ServeFile::new(index));
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let app = home_router
        .merge(auth_routes)
        .nest("/v1", shell_routes)
        .nest("/v1/catalog", catalog_routes)
        .nest("/v1/user", user_routes)
        .layer(middleware::from_fn_with_state(state, log_requests));

    Ok(app)
}

pub async fn run_server(
    oauth: Arc<CrmOAuthClient>,
    catalog: Arc<CatalogService>,
    history: Arc<dyn HistorySource>,
    config: ServerConfig,
) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, oauth, catalog, history)?;

    let metrics_app: Router = Router::new().route("/metrics", get(metrics_handler));
    let metrics_listener =
        tokio::net::TcpListener::bind(format!("127.0.0.1:{}", metrics_port)).await?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(metrics_listener, metrics_app).await {
            error!("Metrics server stopped: {}", err);
        }
    });

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    Ok(axum::serve(listener, app).await?)
}
